use crate::fields::Fields;
use crate::render;
use std::collections::HashMap;

/// Reserved extras field holding the local time an entry was first seen.
pub const TIME_FIELD: &str = "_TIME_";

/// The deduplication key of a field sequence: its canonical JSON text.
///
/// Two sequences have the same identity iff they render to the same bytes,
/// so names, order and value formatting all participate.
///
/// ```
/// use eventtally::{fields, Identity};
///
/// let a = Identity::of(&fields! { "level" => 3, "thread" => 7 });
/// let b = Identity::of(&fields! { "thread" => 7, "level" => 3 });
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn of(fields: &Fields) -> Self {
        Identity(render::render_fields(fields))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One aggregated event: its key, how often it was seen, and the extras
/// captured the first time.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    key: Fields,
    count: u64,
    extras: Fields,
}

impl Entry {
    pub fn key(&self) -> &Fields {
        &self.key
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn extras(&self) -> &Fields {
        &self.extras
    }

    /// The first `_TIME_` extra, if it holds text.
    pub fn timestamp(&self) -> Option<&str> {
        self.extras.get(TIME_FIELD).and_then(|v| v.as_str())
    }
}

/// In-memory map from event identity to aggregated entry.
///
/// The map has no order of its own. [`TallyMap::flush_order`] rebuilds the
/// emission order from each entry's `_TIME_` stamp.
#[derive(Debug, Default)]
pub struct TallyMap {
    entries: HashMap<Identity, Entry>,
}

impl TallyMap {
    pub fn new() -> Self {
        TallyMap {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, identity: &Identity) -> Option<&Entry> {
        self.entries.get(identity)
    }

    /// Count one more occurrence of an existing identity.
    ///
    /// Returns `false` if the identity is not in the map.
    pub fn increment(&mut self, identity: &Identity) -> bool {
        match self.entries.get_mut(identity) {
            Some(entry) => {
                entry.count += 1;
                true
            }
            None => false,
        }
    }

    /// Insert a first occurrence with count 1.
    ///
    /// An existing entry under the same identity is replaced; callers check
    /// with [`increment`](TallyMap::increment) first.
    pub fn insert(&mut self, identity: Identity, key: Fields, extras: Fields) {
        self.entries.insert(
            identity,
            Entry {
                key,
                count: 1,
                extras,
            },
        );
    }

    /// Entries in the order they should be written.
    ///
    /// Entries without a text `_TIME_` extra come first, in map order. The
    /// rest follow sorted by timestamp. Entries sharing a timestamp are
    /// ordered by when the sort visited them, which is stable for an
    /// unmodified map.
    pub fn flush_order(&self) -> Vec<&Entry> {
        let mut ordered = Vec::with_capacity(self.entries.len());
        let mut timed: Vec<(&str, usize, &Entry)> = Vec::new();

        for entry in self.entries.values() {
            match entry.timestamp() {
                Some(ts) => timed.push((ts, timed.len(), entry)),
                None => {
                    if let Some(value) = entry.extras.get(TIME_FIELD) {
                        log::debug!(
                            "eventtally: {TIME_FIELD} holds {} instead of text, writing unordered",
                            value.kind()
                        );
                    }
                    ordered.push(entry);
                }
            }
        }

        timed.sort_unstable_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)));
        ordered.extend(timed.into_iter().map(|(_, _, entry)| entry));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    fn stamped(ts: &str) -> Fields {
        fields! { TIME_FIELD => ts }
    }

    #[test]
    fn increment_only_hits_existing() {
        let mut map = TallyMap::new();
        let id = Identity::of(&fields! { "a" => 1 });
        assert!(!map.increment(&id));

        map.insert(id.clone(), fields! { "a" => 1 }, Fields::new());
        assert!(map.increment(&id));
        assert!(map.increment(&id));
        assert_eq!(map.get(&id).unwrap().count(), 3);
    }

    #[test]
    fn numerically_equal_renderings_share_identity() {
        assert_eq!(
            Identity::of(&fields! { "n" => 3 }),
            Identity::of(&fields! { "n" => 3u64 })
        );
    }

    #[test]
    fn untimed_entries_come_first() {
        let mut map = TallyMap::new();
        map.insert(
            Identity::of(&fields! { "k" => 1 }),
            fields! { "k" => 1 },
            stamped("2024-01-01 00:00:00.000"),
        );
        map.insert(
            Identity::of(&fields! { "k" => 2 }),
            fields! { "k" => 2 },
            fields! { TIME_FIELD => 12 },
        );

        let order = map.flush_order();
        assert_eq!(order.len(), 2);
        assert_eq!(order[0].key().get("k").unwrap().as_i64(), Some(2));
        assert_eq!(order[1].key().get("k").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn timed_entries_sort_by_timestamp() {
        let mut map = TallyMap::new();
        for (k, ts) in [
            (1, "2024-01-01 00:00:03.000"),
            (2, "2024-01-01 00:00:01.000"),
            (3, "2024-01-01 00:00:02.000"),
        ] {
            map.insert(Identity::of(&fields! { "k" => k }), fields! { "k" => k }, stamped(ts));
        }

        let keys: Vec<_> = map
            .flush_order()
            .iter()
            .map(|e| e.key().get("k").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(keys, [2, 3, 1]);
    }
}
