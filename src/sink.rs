//! Result sinks: where scanned fields are delivered.

/// Receiver for the fields of a matched message.
///
/// A message parser calls `begin_match`, then `field` once per rule, then
/// `end_match(true)`, and only after every rule has matched. A failed parse
/// produces a single `end_match(false)` with no preceding calls.
pub trait ResultSink {
    fn begin_match(&mut self, name: &str);

    /// Return `false` to reject the field; the match is then treated as failed.
    fn field(&mut self, name: &str, value: &[u8]) -> bool;

    fn end_match(&mut self, success: bool);
}

/// Sink that records everything it is given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectingSink {
    pub name: Option<String>,
    pub fields: Vec<(String, Vec<u8>)>,
    /// Flag passed to the last `end_match`, `None` before any.
    pub success: Option<bool>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Field value as text, replacing invalid UTF-8.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl ResultSink for CollectingSink {
    fn begin_match(&mut self, name: &str) {
        self.name = Some(name.to_string());
        self.fields.clear();
    }

    fn field(&mut self, name: &str, value: &[u8]) -> bool {
        self.fields.push((name.to_string(), value.to_vec()));
        true
    }

    fn end_match(&mut self, success: bool) {
        self.success = Some(success);
    }
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn begin_match(&mut self, name: &str) {
        (**self).begin_match(name)
    }

    fn field(&mut self, name: &str, value: &[u8]) -> bool {
        (**self).field(name, value)
    }

    fn end_match(&mut self, success: bool) {
        (**self).end_match(success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver<S: ResultSink>(mut sink: S) {
        sink.begin_match("status");
        assert!(sink.field("code", b"200"));
        assert!(sink.field("text", b"\xffok"));
        sink.end_match(true);
    }

    #[test]
    fn collects_in_delivery_order() {
        let mut sink = CollectingSink::new();
        deliver(&mut sink);
        assert_eq!(sink.name.as_deref(), Some("status"));
        assert_eq!(sink.get("code"), Some(&b"200"[..]));
        assert_eq!(sink.get_str("text").as_deref(), Some("\u{fffd}ok"));
        assert_eq!(sink.get("missing"), None);
        assert_eq!(sink.success, Some(true));
        let names: Vec<&str> = sink.fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["code", "text"]);
    }

    #[test]
    fn begin_match_drops_previous_fields() {
        let mut sink = CollectingSink::new();
        deliver(&mut sink);
        sink.begin_match("error");
        assert!(sink.fields.is_empty());
        sink.clear();
        assert_eq!(sink, CollectingSink::default());
    }
}
