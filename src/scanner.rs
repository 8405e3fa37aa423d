//! Scanner: classifies raw input against a set of message parsers.
//!
//! Every parser is tried; the input is recognised only when exactly one of them
//! matches. Two or more matches mean the configured messages overlap, which is
//! reported as [`ScanOutcome::Ambiguous`] rather than picking one.

use crate::error::ConfigError;
use crate::message_parser::{Match, MessageParser};
use crate::sink::ResultSink;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Scanner {
    name: String,
    parsers: Vec<MessageParser>,
}

/// Result of [`Scanner::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Exactly one parser matched and its fields were delivered.
    Matched(String),
    /// No parser matched.
    NoMatch,
    /// More than one parser matched (names in scanner order); nothing was delivered.
    Ambiguous(Vec<String>),
    /// The only matching parser's fields were rejected by the sink.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("no message matched the input")]
    NoMatch,
    #[error("ambiguous input: matched by {}", .0.join(", "))]
    Ambiguous(Vec<String>),
    #[error("fields of '{0}' were rejected")]
    Rejected(String),
}

impl ScanOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, ScanOutcome::Matched(_))
    }

    pub fn matched(&self) -> Option<&str> {
        match self {
            ScanOutcome::Matched(name) => Some(name),
            _ => None,
        }
    }

    /// The matched parser name, or the reason there is none.
    pub fn into_result(self) -> Result<String, ScanError> {
        match self {
            ScanOutcome::Matched(name) => Ok(name),
            ScanOutcome::NoMatch => Err(ScanError::NoMatch),
            ScanOutcome::Ambiguous(names) => Err(ScanError::Ambiguous(names)),
            ScanOutcome::Rejected(name) => Err(ScanError::Rejected(name)),
        }
    }
}

impl From<ScanError> for ScanOutcome {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::NoMatch => ScanOutcome::NoMatch,
            ScanError::Ambiguous(names) => ScanOutcome::Ambiguous(names),
            ScanError::Rejected(name) => ScanOutcome::Rejected(name),
        }
    }
}

impl Scanner {
    /// Message names must be unique and there must be at least one message.
    pub fn new(name: impl Into<String>, parsers: impl IntoIterator<Item = MessageParser>) -> Result<Self, ConfigError> {
        let name = name.into();
        let parsers: Vec<MessageParser> = parsers.into_iter().collect();
        if parsers.is_empty() {
            return Err(ConfigError::EmptyScanner(name));
        }
        let mut seen = HashSet::new();
        for parser in &parsers {
            if !seen.insert(parser.name()) {
                return Err(ConfigError::DuplicateMessage {
                    scanner: name,
                    message: parser.name().to_string(),
                });
            }
        }
        Ok(Scanner { name, parsers })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parsers(&self) -> &[MessageParser] {
        &self.parsers
    }

    pub fn parser(&self, name: &str) -> Option<&MessageParser> {
        self.parsers.iter().find(|p| p.name() == name)
    }

    /// Classify `input` without a sink. Fails with `NoMatch` or `Ambiguous` only.
    pub fn scan<'s, 'i>(&'s self, input: &'i [u8]) -> Result<Match<'s, 'i>, ScanError> {
        let mut matches: Vec<Match<'s, 'i>> = self.parsers.iter().filter_map(|p| p.extract(input)).collect();
        match matches.len() {
            0 => {
                debug!(scanner = %self.name, len = input.len(), "no message matched");
                Err(ScanError::NoMatch)
            }
            1 => Ok(matches.remove(0)),
            _ => {
                let names: Vec<String> = matches.iter().map(|m| m.name().to_string()).collect();
                warn!(scanner = %self.name, messages = ?names, "ambiguous scanner configuration: input matched more than one message");
                Err(ScanError::Ambiguous(names))
            }
        }
    }

    /// Classify `input` and deliver the single match to `sink`.
    ///
    /// Unless exactly one parser matches, the sink only sees `end_match(false)`.
    pub fn parse<S: ResultSink + ?Sized>(&self, input: &[u8], sink: &mut S) -> ScanOutcome {
        let m = match self.scan(input) {
            Ok(m) => m,
            Err(e) => {
                sink.end_match(false);
                return e.into();
            }
        };
        let name = m.name().to_string();
        if m.commit(sink) {
            ScanOutcome::Matched(name)
        } else {
            ScanOutcome::Rejected(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;
    use crate::sink::CollectingSink;

    fn scanner() -> Scanner {
        Scanner::new(
            "printer",
            [
                MessageParser::new("status", [Rule::delimited("code", "ST:", ";")]).unwrap(),
                MessageParser::new("error", [Rule::delimited("code", "ER:", ";")]).unwrap(),
                MessageParser::new("label", [Rule::offset("id", 0, 2), Rule::delimited("text", "<", ">")]).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn exactly_one_match() {
        let mut sink = CollectingSink::new();
        let outcome = scanner().parse(b"ST:42;", &mut sink);
        assert_eq!(outcome, ScanOutcome::Matched("status".into()));
        assert!(outcome.is_match());
        assert_eq!(outcome.matched(), Some("status"));
        assert_eq!(sink.get_str("code").as_deref(), Some("42"));
        assert_eq!(sink.success, Some(true));
    }

    #[test]
    fn no_match() {
        let mut sink = CollectingSink::new();
        assert_eq!(scanner().parse(b"?", &mut sink), ScanOutcome::NoMatch);
        assert_eq!(sink.name, None);
        assert_eq!(sink.success, Some(false));
    }

    #[test]
    fn ambiguous_match_is_distinct_and_delivers_nothing() {
        let mut sink = CollectingSink::new();
        let outcome = scanner().parse(b"ST:1;ER:2;", &mut sink);
        assert_eq!(outcome, ScanOutcome::Ambiguous(vec!["status".into(), "error".into()]));
        assert!(!outcome.is_match());
        assert!(sink.fields.is_empty());
        assert_eq!(sink.name, None);
        assert_eq!(sink.success, Some(false));
        assert_eq!(
            outcome.into_result(),
            Err(ScanError::Ambiguous(vec!["status".into(), "error".into()]))
        );
    }

    #[test]
    fn rejected_by_sink() {
        struct Refuse;
        impl ResultSink for Refuse {
            fn begin_match(&mut self, _: &str) {}
            fn field(&mut self, _: &str, _: &[u8]) -> bool {
                false
            }
            fn end_match(&mut self, _: bool) {}
        }
        assert_eq!(scanner().parse(b"ST:1;", &mut Refuse), ScanOutcome::Rejected("status".into()));
    }

    #[test]
    fn outcome_and_error_convert_both_ways() {
        for e in [
            ScanError::NoMatch,
            ScanError::Ambiguous(vec!["a".into(), "b".into()]),
            ScanError::Rejected("a".into()),
        ] {
            assert_eq!(ScanOutcome::from(e.clone()).into_result(), Err(e));
        }
        assert_eq!(ScanOutcome::Matched("a".into()).into_result(), Ok("a".into()));
    }

    #[test]
    fn scan_without_sink() {
        let scanner = scanner();
        let m = scanner.scan(b"07<hello>").unwrap();
        assert_eq!(m.name(), "label");
        assert_eq!(m.get("id"), Some(&b"07"[..]));
        assert_eq!(m.get("text"), Some(&b"hello"[..]));
        assert_eq!(scanner.scan(b"").unwrap_err(), ScanError::NoMatch);
    }

    #[test]
    fn configuration_errors() {
        assert!(matches!(
            Scanner::new("s", Vec::<MessageParser>::new()),
            Err(ConfigError::EmptyScanner(name)) if name == "s"
        ));
        let p = MessageParser::new("m", [Rule::offset("a", 0, 1)]).unwrap();
        assert!(matches!(
            Scanner::new("s", [p.clone(), p]),
            Err(ConfigError::DuplicateMessage { message, .. }) if message == "m"
        ));
    }

    #[test]
    fn lookup_parsers() {
        let scanner = scanner();
        assert_eq!(scanner.name(), "printer");
        assert_eq!(scanner.parsers().len(), 3);
        assert!(scanner.parser("error").is_some());
        assert!(scanner.parser("nope").is_none());
    }
}
