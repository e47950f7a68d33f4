//! Canonical JSON rendering for field sequences and flushed records.
//!
//! The output of [`render_fields`] doubles as an event's identity, so it must
//! be deterministic: same fields in the same order, same bytes.

use crate::fields::Fields;
use crate::map::Entry;
use crate::value::Value;
use std::fmt::Write;

/// Key holding an entry's occurrence count in a flushed record.
pub const COUNT_FIELD: &str = "_COUNT_";

/// Key of the nested object holding an entry's extras in a flushed record.
pub const EXTRA_FIELD: &str = "_EXTRA_";

/// Escape a string for inclusion in a JSON string literal.
///
/// Quotes, backslashes and the forward slash are backslash-escaped. The
/// common control characters use their short escapes and every other control
/// character below U+0020 becomes `\u00XX`.
///
/// ```
/// use eventtally::render::escape_json;
///
/// assert_eq!(escape_json(r#"a"b/c\d"#), r#"a\"b\/c\\d"#);
/// assert_eq!(escape_json("line\nnext\u{1}"), "line\\nnext\\u0001");
/// ```
pub fn escape_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Render a single value as a JSON token.
///
/// Wide text is converted to UTF-8 first. Non-finite floats have no JSON
/// representation and render as `null`.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Text(s) => format!("\"{}\"", escape_json(s)),
        Value::Wide(w) => format!("\"{}\"", escape_json(&String::from_utf16_lossy(w))),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Double(d) if d.is_finite() => d.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Double(_) | Value::Float(_) => "null".to_string(),
        Value::Bool(b) => b.to_string(),
    }
}

/// Render a field sequence as the body of a JSON object (no braces).
pub fn render_fields(fields: &Fields) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(&escape_json(&field.name));
        out.push_str("\":");
        out.push_str(&render_value(&field.value));
    }
    out
}

/// Render one aggregated entry as a complete JSON object:
/// `{"_COUNT_":n,<key fields>,"_EXTRA_":{<extras>}}`.
pub fn render_record(entry: &Entry) -> String {
    let key = render_fields(entry.key());
    let extras = render_fields(entry.extras());

    let mut out = String::with_capacity(key.len() + extras.len() + 32);
    let _ = write!(out, "{{\"{COUNT_FIELD}\":{}", entry.count());
    if !key.is_empty() {
        out.push(',');
        out.push_str(&key);
    }
    let _ = write!(out, ",\"{EXTRA_FIELD}\":{{{extras}}}}}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn escapes_every_special_character() {
        let input = "\"\\/\u{8}\u{c}\n\r\t\u{1f}";
        assert_eq!(escape_json(input), r#"\"\\\/\b\f\n\r\t\u001f"#);
    }

    #[test]
    fn leaves_unicode_alone() {
        assert_eq!(escape_json("héllo ✓"), "héllo ✓");
    }

    #[test]
    fn renders_each_variant() {
        assert_eq!(render_value(&Value::from("a/b")), r#""a\/b""#);
        assert_eq!(render_value(&Value::wide("wide")), r#""wide""#);
        assert_eq!(render_value(&Value::from(-7)), "-7");
        assert_eq!(render_value(&Value::from(7u64)), "7");
        assert_eq!(render_value(&Value::from(1.3)), "1.3");
        assert_eq!(render_value(&Value::from(4.5f32)), "4.5");
        assert_eq!(render_value(&Value::from(true)), "true");
        assert_eq!(render_value(&Value::from(f64::NAN)), "null");
        assert_eq!(render_value(&Value::from(f32::INFINITY)), "null");
    }

    #[test]
    fn field_names_are_escaped() {
        let f = fields! { "a\"b" => 1 };
        assert_eq!(render_fields(&f), r#""a\"b":1"#);
    }

    #[test]
    fn empty_sequence_renders_empty() {
        assert_eq!(render_fields(&Fields::new()), "");
    }
}
