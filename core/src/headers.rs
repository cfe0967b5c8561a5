//! Raw response header parsing.
//!
//! `parse_raw_headers` turns the header block of an HTTP response (status
//! line plus `Name: Value` lines) into an ordered `HeaderMap`. It is a pure
//! function of its input.
//!
//! Known limitation: when a name repeats, the last value wins. Headers that
//! are legitimately repeatable (`Set-Cookie`, `Link`) therefore keep only
//! their final occurrence.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered header mapping. Names keep the case they were stored with;
/// lookups compare names ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header. An existing entry with the same name is replaced in
    /// place, so the mapping keeps first-seen order with last-seen values.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parse a raw header block into a `HeaderMap`.
///
/// The first line (the status line) is skipped. Every other line is split on
/// its first `:`, with surrounding whitespace trimmed from name and value.
/// Blank lines and lines without a colon are ignored.
pub fn parse_raw_headers(raw: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for line in raw.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        headers.insert(name, value.trim());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: &str = "HTTP/1.1 200 OK\r\n\
        Content-Type: application/json\r\n\
        X-Request-Id:  abc123  \r\n\
        Date: Mon, 19 Oct 2026 10:00:00 GMT\r\n\
        \r\n";

    #[test]
    fn skips_status_line_and_trims_values() {
        let headers = parse_raw_headers(BLOCK);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        assert_eq!(headers.get("X-Request-Id"), Some("abc123"));
        assert!(!headers.iter().any(|(name, _)| name.starts_with("HTTP/")));
    }

    #[test]
    fn splits_on_first_colon_only() {
        let headers = parse_raw_headers(BLOCK);
        assert_eq!(headers.get("Date"), Some("Mon, 19 Oct 2026 10:00:00 GMT"));
    }

    #[test]
    fn keeps_received_order() {
        let names: Vec<_> = parse_raw_headers(BLOCK).iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, vec!["Content-Type", "X-Request-Id", "Date"]);
    }

    #[test]
    fn duplicate_name_keeps_last_value() {
        let raw = "HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nVary: Accept\r\nset-cookie: b=2\r\n\r\n";
        let headers = parse_raw_headers(raw);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Set-Cookie"), Some("b=2"));
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["set-cookie", "Vary"]);
    }

    #[test]
    fn ignores_lines_without_colon() {
        let raw = "HTTP/1.1 200 OK\r\n\r\ngarbage line\r\nAccept: */*\r\n";
        let headers = parse_raw_headers(raw);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("accept"), Some("*/*"));
    }

    #[test]
    fn parsing_is_repeatable() {
        assert_eq!(parse_raw_headers(BLOCK), parse_raw_headers(BLOCK));
    }

    #[test]
    fn empty_block_yields_empty_map() {
        assert!(parse_raw_headers("").is_empty());
        assert!(parse_raw_headers("HTTP/1.1 204 No Content\r\n\r\n").is_empty());
    }

    #[test]
    fn serializes_as_json_object() {
        let headers: HeaderMap = [("Accept", "application/json"), ("X-Trace", "1")].into_iter().collect();
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"Accept":"application/json","X-Trace":"1"}"#);
    }
}
