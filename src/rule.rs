//! Field extraction rules.

use crate::validation::Validator;
use memchr::memmem;
use std::sync::Arc;

/// How a rule locates its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// `length` bytes starting at byte `position`.
    Offset { position: usize, length: usize },
    /// Bytes between the first `start` and the first `end` after it.
    Delimited { start: Vec<u8>, end: Vec<u8> },
}

impl RuleKind {
    /// The extracted bytes, or `None` when the input does not contain the field.
    pub fn extract<'a>(&self, input: &'a [u8]) -> Option<&'a [u8]> {
        match self {
            RuleKind::Offset { position, length } => {
                let end = position.checked_add(*length)?;
                input.get(*position..end)
            }
            RuleKind::Delimited { start, end } => {
                let value_start = memmem::find(input, start)? + start.len();
                let rest = &input[value_start..];
                let value_len = memmem::find(rest, end)?;
                Some(&rest[..value_len])
            }
        }
    }
}

/// A named extraction rule; the name becomes the reported field name.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    kind: RuleKind,
    validators: Vec<Arc<dyn Validator>>,
}

impl Rule {
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Rule {
            name: name.into(),
            kind,
            validators: Vec::new(),
        }
    }

    pub fn offset(name: impl Into<String>, position: usize, length: usize) -> Self {
        Self::new(name, RuleKind::Offset { position, length })
    }

    pub fn delimited(name: impl Into<String>, start: impl AsRef<[u8]>, end: impl AsRef<[u8]>) -> Self {
        Self::new(
            name,
            RuleKind::Delimited {
                start: start.as_ref().to_vec(),
                end: end.as_ref().to_vec(),
            },
        )
    }

    /// Require the extracted value to pass `validator` as well.
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Apply the rule. Absence of the field is an ordinary `None`, never an error.
    pub fn apply<'a>(&self, input: &'a [u8]) -> Option<&'a [u8]> {
        let value = self.kind.extract(input)?;
        if self.validators.is_empty() {
            return Some(value);
        }
        let text = std::str::from_utf8(value).ok()?;
        self.validators
            .iter()
            .all(|v| v.validate(text))
            .then_some(value)
    }
}
