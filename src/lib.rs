//! # devwire: message templates and scanners for device protocols
//!
//! Compose outgoing command strings from compact templates and classify
//! incoming device responses with rule-based scanners.
//!
//! ## Template language
//!
//! - Literal text is copied as is.
//! - `#NNN;` emits the byte with decimal code NNN (must be below 127).
//! - `\` escapes the next character; a backslash before CR or LF drops that one character.
//! - `$(key)` or `$(key:%fmt)` inserts a record value, optionally printf-formatted.
//! - `$name(arg, ...)` calls a function: `repeat(c, n)`, `now(%fmt)`, `checksum(%fmt)`.
//!
//! ```
//! use devwire::{MapRecord, MessageTemplate};
//!
//! let t = MessageTemplate::compile("start", "\\$START $(id:%d) $(user)").unwrap();
//! let out = t.format(&MapRecord::new("job").with("id", "103").with("user", "max"));
//! assert_eq!(out, b"$START 103 max");
//! ```
//!
//! ## Definition files
//!
//! ```text
//! template ack = "#6;";
//!
//! scanner printer {
//!     message status {
//!         code: offset(0, 3) [is_integer];
//!         text: between("@@", "|");
//!     }
//! }
//! ```
//!
//! Load with [`Protocol::load`] and look templates and scanners up by name.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod fragment;
pub mod functions;
pub mod message_parser;
pub mod parser;
pub mod printf;
pub mod protocol;
pub mod record;
pub mod rule;
pub mod scanner;
pub mod sink;
pub mod template;
pub mod validation;

pub use compiler::{compile, TemplateError};
pub use error::ConfigError;
pub use fragment::Fragment;
pub use functions::{Function, FunctionError, FunctionRegistry};
pub use message_parser::{Match, MessageParser};
pub use parser::parse;
pub use printf::{FieldFormat, FormatError};
pub use protocol::Protocol;
pub use record::{MapRecord, Record};
pub use rule::{Rule, RuleKind};
pub use scanner::{ScanError, ScanOutcome, Scanner};
pub use sink::{CollectingSink, ResultSink};
pub use template::MessageTemplate;
pub use validation::{ValidationError, Validator, ValidatorRegistry};
