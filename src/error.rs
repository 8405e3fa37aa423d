//! Configuration errors: building rule sets and loading definition files.

use crate::compiler::TemplateError;
use crate::validation::ValidationError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Syntax(String),
    #[error("template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
    #[error("rule '{rule}' in message '{message}': {source}")]
    Validator {
        message: String,
        rule: String,
        #[source]
        source: ValidationError,
    },
    #[error("Duplicate template name: {0}")]
    DuplicateTemplate(String),
    #[error("Duplicate scanner name: {0}")]
    DuplicateScanner(String),
    #[error("Duplicate message '{message}' in scanner '{scanner}'")]
    DuplicateMessage { scanner: String, message: String },
    #[error("Duplicate rule '{rule}' in message '{message}'")]
    DuplicateRule { message: String, rule: String },
    #[error("scanner '{0}' has no messages")]
    EmptyScanner(String),
}
