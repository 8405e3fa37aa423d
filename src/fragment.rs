//! Compiled template fragments.

use crate::functions::Function;
use crate::printf::{FieldFormat, FormatError};
use crate::record::Record;

/// One compiled unit of a message template.
#[derive(Debug)]
pub enum Fragment {
    /// Fixed text, including bytes produced by escapes and `#code;`.
    Literal(String),
    /// `$(key)` or `$(key:format)`; no format means the value is copied as is.
    Field {
        key: String,
        format: Option<FieldFormat>,
    },
    /// `$name(args)`, bound at compile time.
    Functional {
        name: String,
        function: Box<dyn Function>,
    },
}

impl Fragment {
    /// Field fragment; an empty `format` copies the value unchanged.
    pub fn field(key: impl Into<String>, format: &str) -> Result<Self, FormatError> {
        let format = if format.is_empty() {
            None
        } else {
            Some(FieldFormat::parse(format)?)
        };
        Ok(Fragment::Field {
            key: key.into(),
            format,
        })
    }

    /// Append this fragment's contribution to `out`.
    pub fn write<R: Record + ?Sized>(&self, record: &R, out: &mut Vec<u8>) {
        match self {
            Fragment::Literal(text) => out.extend_from_slice(text.as_bytes()),
            Fragment::Field { key, format } => {
                let value = record.lookup(key);
                match format {
                    Some(format) => out.extend_from_slice(format.render(value).as_bytes()),
                    None => out.extend_from_slice(value.as_bytes()),
                }
            }
            Fragment::Functional { function, .. } => function.apply(out),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Fragment::Literal(_))
    }
}
