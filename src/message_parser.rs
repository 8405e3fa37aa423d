//! Message parsers: all-or-nothing bundles of rules.

use crate::error::ConfigError;
use crate::rule::Rule;
use crate::sink::ResultSink;
use std::collections::HashSet;
use tracing::{trace, warn};

/// Recognises one message shape. Matches only if every rule matches.
#[derive(Debug, Clone)]
pub struct MessageParser {
    name: String,
    rules: Vec<Rule>,
}

/// Fields extracted by a fully matching parser, not yet delivered to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'p, 'i> {
    name: &'p str,
    fields: Vec<(&'p str, &'i [u8])>,
}

impl MessageParser {
    /// Rules are evaluated and reported in the given order; names must be unique.
    pub fn new(name: impl Into<String>, rules: impl IntoIterator<Item = Rule>) -> Result<Self, ConfigError> {
        let name = name.into();
        let rules: Vec<Rule> = rules.into_iter().collect();
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name()) {
                return Err(ConfigError::DuplicateRule {
                    message: name,
                    rule: rule.name().to_string(),
                });
            }
        }
        Ok(MessageParser { name, rules })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Apply every rule, buffering the values. Nothing is reported anywhere.
    pub fn extract<'p, 'i>(&'p self, input: &'i [u8]) -> Option<Match<'p, 'i>> {
        let mut fields = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            match rule.apply(input) {
                Some(value) => fields.push((rule.name(), value)),
                None => {
                    trace!(parser = %self.name, rule = rule.name(), "rule did not match");
                    return None;
                }
            }
        }
        trace!(parser = %self.name, fields = fields.len(), "message matched");
        Some(Match {
            name: &self.name,
            fields,
        })
    }

    /// Parse `input` and report the outcome to `sink`.
    ///
    /// Fields reach the sink only after all rules have matched; on failure the sink
    /// sees a single `end_match(false)`.
    pub fn parse<S: ResultSink + ?Sized>(&self, input: &[u8], sink: &mut S) -> bool {
        match self.extract(input) {
            Some(m) => m.commit(sink),
            None => {
                sink.end_match(false);
                false
            }
        }
    }
}

impl<'p, 'i> Match<'p, 'i> {
    /// Name of the matching message parser.
    pub fn name(&self) -> &'p str {
        self.name
    }

    /// `(rule name, value)` pairs in rule order.
    pub fn fields(&self) -> &[(&'p str, &'i [u8])] {
        &self.fields
    }

    pub fn get(&self, rule: &str) -> Option<&'i [u8]> {
        self.fields.iter().find(|(n, _)| *n == rule).map(|(_, v)| *v)
    }

    /// Deliver the match to `sink`. Returns `false` if the sink rejected a field,
    /// in which case delivery stops and the match ends unsuccessfully.
    pub fn commit<S: ResultSink + ?Sized>(&self, sink: &mut S) -> bool {
        sink.begin_match(self.name);
        for (name, value) in &self.fields {
            if !sink.field(name, value) {
                warn!(parser = %self.name, field = %name, "result sink rejected field");
                sink.end_match(false);
                return false;
            }
        }
        sink.end_match(true);
        true
    }
}
