/// Escape pairs, in the order they are applied when escaping.
/// Backslash comes first so later substitutions are not escaped twice.
const ESCAPES: [(&str, &str); 8] = [
    ("\\", "\\\\"),
    ("\"", "\\\""),
    ("/", "\\/"),
    ("\u{8}", "\\b"),
    ("\u{c}", "\\f"),
    ("\n", "\\n"),
    ("\r", "\\r"),
    ("\t", "\\t"),
];

/// Escape a value so it can sit between double quotes in a JSON document.
///
/// Only the eight two-character escapes are known; `\uXXXX` sequences are
/// never emitted or decoded. Build new payloads with `serde_json`.
pub fn escape(value: &str) -> String {
    ESCAPES
        .iter()
        .fold(value.to_string(), |acc, (raw, escaped)| acc.replace(raw, escaped))
}

/// Reverse [`escape`]; the backslash pair is restored last
pub fn unescape(value: &str) -> String {
    ESCAPES
        .iter()
        .rev()
        .fold(value.to_string(), |acc, (raw, escaped)| acc.replace(escaped, raw))
}

/// `"HTTPStatusCode": 200, "HTTPReasonPhrase": "OK"`
pub fn http_ok_fields() -> String {
    "\"HTTPStatusCode\": 200, \"HTTPReasonPhrase\": \"OK\"".to_string()
}

/// Render bytes as a JSON array of numbers
pub fn byte_array_as_json(bytes: &[u8]) -> String {
    let items: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
    format!("[{}]", items.join(", "))
}
