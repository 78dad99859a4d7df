use crate::codec::escape;
use crate::error::{GeneratedError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Read;

/// Generic string-keyed JSON object
pub type JsonMap = Map<String, Value>;

/// The `{HTTPStatusCode, HTTPReasonPhrase, payload}` response wrapper.
///
/// A valid envelope has status 200, a non-empty reason phrase and a payload
/// that is an array of objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "HTTPStatusCode")]
    pub status_code: u16,

    #[serde(rename = "HTTPReasonPhrase")]
    pub reason_phrase: String,

    pub payload: Vec<JsonMap>,
}

impl Envelope {
    /// A 200/OK envelope around the given payload
    pub fn ok(payload: Vec<JsonMap>) -> Self {
        Envelope {
            status_code: 200,
            reason_phrase: "OK".to_string(),
            payload,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status_code == 200 && !self.reason_phrase.is_empty()
    }

    /// Status fields for embedding in a hand-built JSON object
    pub fn status_fields_json(&self) -> String {
        format!(
            "\"HTTPStatusCode\": {}, \"HTTPReasonPhrase\": \"{}\"",
            self.status_code,
            escape(&self.reason_phrase)
        )
    }
}

fn read_body<R: Read>(mut body: R) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    body.read_to_end(&mut buf)?;
    Ok(buf)
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn into_maps(items: Vec<Value>, what: &str) -> Result<Vec<JsonMap>> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(GeneratedError::server(format!(
                "{} element {} is not an object: it is {}",
                what,
                i,
                json_type_name(&other)
            ))
            .into()),
        })
        .collect()
}

/// Parse a body holding a single JSON object
pub fn parse_to_map<R: Read>(body: R) -> Result<JsonMap> {
    let bytes = read_body(body)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Parse a body holding a JSON array of objects
pub fn parse_to_maps<R: Read>(body: R) -> Result<Vec<JsonMap>> {
    let bytes = read_body(body)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    match value {
        Value::Array(items) => into_maps(items, "array"),
        other => Err(GeneratedError::server(format!(
            "Wrong type: expected an array, it is {}",
            json_type_name(&other)
        ))
        .into()),
    }
}

/// Parse a body holding an [`Envelope`].
///
/// Anything from the first NUL byte on is discarded before decoding. The
/// status code is checked first, then the reason phrase, then the payload;
/// the first failing field is reported.
pub fn parse_to_envelope<R: Read>(body: R) -> Result<Envelope> {
    let mut bytes = read_body(body)?;
    if let Some(pos) = bytes.iter().position(|&b| b == 0) {
        tracing::warn!(position = pos, "response body truncated at NUL byte");
        bytes.truncate(pos);
    }

    let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(body = %String::from_utf8_lossy(&bytes), "malformed envelope");
        e
    })?;

    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(GeneratedError::server(format!(
                "envelope is not an object: it is {}",
                json_type_name(&other)
            ))
            .into())
        }
    };

    let status = match obj.get("HTTPStatusCode") {
        None => return Err(GeneratedError::server("No HTTPStatusCode").into()),
        Some(v) => v.as_f64().ok_or_else(|| {
            GeneratedError::server(format!(
                "HTTPStatusCode is not a number: it is {}",
                json_type_name(v)
            ))
        })?,
    };
    if status != 200.0 {
        let message = format!("HTTP status {} returned", status);
        let err = u16::try_from(status as i64)
            .ok()
            .filter(|code| f64::from(*code) == status)
            .and_then(|code| GeneratedError::from_status(code, &message))
            .unwrap_or_else(|| GeneratedError::server(message));
        return Err(err.into());
    }

    let reason_phrase = match obj.get("HTTPReasonPhrase") {
        None => return Err(GeneratedError::server("No HTTPReasonPhrase").into()),
        Some(Value::String(s)) if s.is_empty() => {
            return Err(GeneratedError::server("HTTPReasonPhrase is empty").into())
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(GeneratedError::server(format!(
                "HTTPReasonPhrase is not a string: it is {}",
                json_type_name(other)
            ))
            .into())
        }
    };

    let payload = match obj.remove("payload") {
        None => return Err(GeneratedError::server("No payload").into()),
        Some(Value::Array(items)) => into_maps(items, "payload")?,
        Some(other) => {
            return Err(GeneratedError::server(format!(
                "payload is not an array: it is {}",
                json_type_name(&other)
            ))
            .into())
        }
    };

    Ok(Envelope {
        status_code: 200,
        reason_phrase,
        payload,
    })
}

/// Parse an envelope and return only its payload
pub fn parse_to_payload_maps<R: Read>(body: R) -> Result<Vec<JsonMap>> {
    Ok(parse_to_envelope(body)?.payload)
}

/// Render a map for diagnostics, one field per line
pub fn format_map(map: &JsonMap) -> String {
    let fields: Vec<String> = map
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("\t\"{}\": \"{}\"", k, s),
            other => format!("\t\"{}\": {}", k, other),
        })
        .collect();
    if fields.is_empty() {
        return "{\n}".to_string();
    }
    format!("{{\n{}\n}}", fields.join(",\n"))
}

/// Render a list of maps for diagnostics
pub fn format_maps(maps: &[JsonMap]) -> String {
    let rendered: Vec<String> = maps.iter().map(format_map).collect();
    if rendered.is_empty() {
        return "[\n]".to_string();
    }
    format!("[\n{}\n]", rendered.join(",\n"))
}

/// Write a map to stdout
pub fn print_map(map: &JsonMap) {
    println!("{}", format_map(map));
}

/// Write a list of maps to stdout
pub fn print_maps(maps: &[JsonMap]) {
    println!("{}", format_maps(maps));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{is_server_error, is_user_error};
    use serde_json::json;

    #[test]
    fn test_parse_to_map() {
        let map = parse_to_map(r#"{"name": "test", "n": 2}"#.as_bytes()).unwrap();
        assert_eq!(map["name"], "test");
        assert_eq!(map["n"], 2);

        assert!(parse_to_map("{not json".as_bytes()).is_err());
        assert!(parse_to_map("[1, 2]".as_bytes()).is_err());
    }

    #[test]
    fn test_parse_to_maps() {
        let maps = parse_to_maps(r#"[{"a": 1}, {"b": 2}]"#.as_bytes()).unwrap();
        assert_eq!(maps.len(), 2);
        assert_eq!(maps[1]["b"], 2);

        let err = parse_to_maps(r#"{"a": 1}"#.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("expected an array"));

        let err = parse_to_maps(r#"[{"a": 1}, 3]"#.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("element 1 is not an object"));
    }

    #[test]
    fn test_parse_envelope() {
        let body = r#"{"HTTPStatusCode":200,"HTTPReasonPhrase":"OK","payload":[{"a":1}]}"#;
        let envelope = parse_to_envelope(body.as_bytes()).unwrap();
        assert!(envelope.is_valid());
        assert_eq!(envelope.payload.len(), 1);
        assert_eq!(Value::Object(envelope.payload[0].clone()), json!({"a": 1}));
    }

    #[test]
    fn test_parse_envelope_bad_status() {
        let body = r#"{"HTTPStatusCode":404,"HTTPReasonPhrase":"Not Found","payload":[]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("404"));
        assert!(is_user_error(&err));

        let body = r#"{"HTTPStatusCode":500,"HTTPReasonPhrase":"Oops","payload":[]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(is_server_error(&err));

        let body = r#"{"HTTPStatusCode":"200","HTTPReasonPhrase":"OK","payload":[]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("HTTPStatusCode is not a number"));
    }

    #[test]
    fn test_parse_envelope_bad_reason() {
        let body = r#"{"HTTPStatusCode":200,"HTTPReasonPhrase":"","payload":[]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("HTTPReasonPhrase"));

        let body = r#"{"HTTPStatusCode":200,"payload":[]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("HTTPReasonPhrase"));

        let body = r#"{"HTTPStatusCode":200,"HTTPReasonPhrase":7,"payload":[]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("HTTPReasonPhrase is not a string"));
    }

    #[test]
    fn test_parse_envelope_bad_payload() {
        let body = r#"{"HTTPStatusCode":200,"HTTPReasonPhrase":"OK","payload":{"a":1}}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("payload is not an array"));

        let body = r#"{"HTTPStatusCode":200,"HTTPReasonPhrase":"OK","payload":[{"a":1},"x"]}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("payload element 1"));

        let body = r#"{"HTTPStatusCode":200,"HTTPReasonPhrase":"OK"}"#;
        let err = parse_to_envelope(body.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("payload"));
    }

    #[test]
    fn test_parse_envelope_with_trailing_nul() {
        let mut body = br#"{"HTTPStatusCode":200,"HTTPReasonPhrase":"OK","payload":[{"a":1}]}"#.to_vec();
        body.push(0);
        body.extend_from_slice(b"\xff\xfe garbage }}]");
        let payload = parse_to_payload_maps(body.as_slice()).unwrap();
        assert_eq!(payload[0]["a"], 1);
    }

    #[test]
    fn test_envelope_status_fields() {
        let envelope = Envelope {
            status_code: 201,
            reason_phrase: "Created \"ok\"".to_string(),
            payload: Vec::new(),
        };
        assert_eq!(
            envelope.status_fields_json(),
            r#""HTTPStatusCode": 201, "HTTPReasonPhrase": "Created \"ok\"""#
        );
        assert!(!envelope.is_valid());
        assert!(Envelope::ok(Vec::new()).is_valid());
    }

    #[test]
    fn test_envelope_serde_names() {
        let json = serde_json::to_value(Envelope::ok(Vec::new())).unwrap();
        assert_eq!(json, json!({"HTTPStatusCode": 200, "HTTPReasonPhrase": "OK", "payload": []}));
    }

    #[test]
    fn test_format_map() {
        let map = parse_to_map(r#"{"name": "x", "count": 3}"#.as_bytes()).unwrap();
        assert_eq!(format_map(&map), "{\n\t\"name\": \"x\",\n\t\"count\": 3\n}");
        assert_eq!(
            format_maps(&[map.clone(), map]).matches("\"count\": 3").count(),
            2
        );
        assert_eq!(format_maps(&[]), "[\n]");
    }
}
