//! Shared form parsing and JSON response helpers for route handlers.

use serde_json::{Map, Value, json};

use crate::error::Rejection;

/// Parse URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` format (from `fetch` POST bodies).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((percent_decode(key), percent_decode(val)))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Escapes are collected as bytes so
/// multi-byte UTF-8 (titles, character names) survives; invalid sequences
/// are replaced rather than rejected.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3).and_then(|h| core::str::from_utf8(h).ok());
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(val) => {
                        out.push(val);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parse a numeric parameter. Missing or malformed values read as `None`.
pub fn get_num<T: std::str::FromStr>(params: &[(String, String)], key: &str) -> Option<T> {
    get_param(params, key).and_then(|v| v.trim().parse().ok())
}

// ── JSON responses ─────────────────────────────────────────────────

/// `{"ok": true, ...fields}`.
pub fn ok_json(fields: Value) -> String {
    let mut body = Map::new();
    body.insert("ok".to_string(), Value::Bool(true));
    if let Value::Object(extra) = fields {
        body.extend(extra);
    }
    Value::Object(body).to_string()
}

pub fn error_json(code: &str, message: &str) -> String {
    json!({ "ok": false, "error": code, "message": message }).to_string()
}

pub fn rejection_json(r: &Rejection) -> String {
    error_json(r.code(), &r.to_string())
}

pub fn missing_param(name: &str) -> String {
    error_json("missing_param", &format!("missing {} parameter", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_form_body_works() {
        let pairs = parse_form_body("id=c1&name=Groza&x=3");
        assert_eq!(pairs.len(), 3);
        assert_eq!(get_param(&pairs, "id"), Some("c1"));
        assert_eq!(get_num::<i32>(&pairs, "x"), Some(3));
        assert_eq!(get_num::<i32>(&pairs, "name"), None);
    }

    #[test]
    fn parse_form_body_empty() {
        assert!(parse_form_body("").is_empty());
        assert!(parse_form_body("&&").is_empty());
    }

    #[test]
    fn percent_decode_plus_as_space() {
        assert_eq!(percent_decode("hello+world"), "hello world");
    }

    #[test]
    fn percent_decode_utf8() {
        assert_eq!(percent_decode("%E6%96%B0%E8%A6%8FTL"), "新規TL");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn parse_query_strips_prefix() {
        let pairs = parse_query("?phase=3");
        assert_eq!(get_param(&pairs, "phase"), Some("3"));
    }

    #[test]
    fn json_helpers() {
        let body: Value = serde_json::from_str(&ok_json(json!({ "n": 1 }))).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["n"], 1);
        let body: Value = serde_json::from_str(&rejection_json(&Rejection::NoActor)).unwrap();
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "no_actor");
    }
}
