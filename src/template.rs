//! Message templates: compiled once, formatted many times.

use crate::compiler::{self, TemplateError};
use crate::fragment::Fragment;
use crate::functions::FunctionRegistry;
use crate::record::Record;
use tracing::debug;

/// A named, compiled template.
///
/// Immutable after compilation and `Send + Sync`; one instance can serve
/// concurrent `format()` calls.
#[derive(Debug)]
pub struct MessageTemplate {
    name: String,
    source: String,
    fragments: Vec<Fragment>,
}

impl MessageTemplate {
    /// Compile with the built-in functions only.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        Self::compile_with(name, source, &FunctionRegistry::with_builtins())
    }

    pub fn compile_with(
        name: impl Into<String>,
        source: &str,
        registry: &FunctionRegistry,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        let fragments = compiler::compile(source, registry)?;
        debug!(template = %name, fragments = fragments.len(), "compiled message template");
        Ok(MessageTemplate {
            name,
            source: source.to_string(),
            fragments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Render the message for `record`.
    pub fn format<R: Record + ?Sized>(&self, record: &R) -> Vec<u8> {
        let mut out = Vec::new();
        self.format_into(record, &mut out);
        out
    }

    /// Like [`format`](Self::format), reusing `out`. Previous contents are discarded
    /// so that functions such as `checksum` only see this message.
    pub fn format_into<R: Record + ?Sized>(&self, record: &R, out: &mut Vec<u8>) {
        out.clear();
        for fragment in &self.fragments {
            fragment.write(record, out);
        }
    }
}
