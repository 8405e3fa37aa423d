//! Resolved protocol: compiled templates and scanners looked up by name.

use crate::ast::{MessageDef, ProtocolDef, RuleDef, ScannerDef};
use crate::error::ConfigError;
use crate::functions::FunctionRegistry;
use crate::message_parser::MessageParser;
use crate::parser;
use crate::rule::Rule;
use crate::scanner::Scanner;
use crate::template::MessageTemplate;
use crate::validation::ValidatorRegistry;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Every template compiled and every scanner built; read-only from here on.
#[derive(Debug)]
pub struct Protocol {
    templates: Vec<MessageTemplate>,
    scanners: Vec<Scanner>,
    templates_by_name: HashMap<String, usize>,
    scanners_by_name: HashMap<String, usize>,
}

impl Protocol {
    /// Build with the built-in functions and validators.
    pub fn from_source(source: &str) -> Result<Self, ConfigError> {
        Self::build(
            parser::parse(source)?,
            &FunctionRegistry::with_builtins(),
            &ValidatorRegistry::with_builtins(),
        )
    }

    /// Read and build a definition file with the built-in functions and validators.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(&source)
    }

    /// Resolve a parsed definition. Fails on the first invalid template or rule.
    pub fn build(
        def: ProtocolDef,
        functions: &FunctionRegistry,
        validators: &ValidatorRegistry,
    ) -> Result<Self, ConfigError> {
        let mut templates = Vec::with_capacity(def.templates.len());
        let mut templates_by_name = HashMap::new();
        for t in def.templates {
            if templates_by_name.insert(t.name.clone(), templates.len()).is_some() {
                return Err(ConfigError::DuplicateTemplate(t.name));
            }
            let template = MessageTemplate::compile_with(t.name.clone(), &t.source, functions)
                .map_err(|source| ConfigError::Template { name: t.name, source })?;
            templates.push(template);
        }

        let mut scanners = Vec::with_capacity(def.scanners.len());
        let mut scanners_by_name = HashMap::new();
        for s in def.scanners {
            if scanners_by_name.insert(s.name.clone(), scanners.len()).is_some() {
                return Err(ConfigError::DuplicateScanner(s.name));
            }
            scanners.push(build_scanner(s, validators)?);
        }

        debug!(
            templates = templates.len(),
            scanners = scanners.len(),
            "protocol definition built"
        );
        Ok(Protocol {
            templates,
            scanners,
            templates_by_name,
            scanners_by_name,
        })
    }

    pub fn template(&self, name: &str) -> Option<&MessageTemplate> {
        self.templates_by_name.get(name).map(|&i| &self.templates[i])
    }

    pub fn scanner(&self, name: &str) -> Option<&Scanner> {
        self.scanners_by_name.get(name).map(|&i| &self.scanners[i])
    }

    /// Templates in definition order.
    pub fn templates(&self) -> &[MessageTemplate] {
        &self.templates
    }

    /// Scanners in definition order.
    pub fn scanners(&self) -> &[Scanner] {
        &self.scanners
    }
}

fn build_scanner(def: ScannerDef, validators: &ValidatorRegistry) -> Result<Scanner, ConfigError> {
    let parsers = def
        .messages
        .into_iter()
        .map(|m| build_message(m, validators))
        .collect::<Result<Vec<_>, _>>()?;
    Scanner::new(def.name, parsers)
}

fn build_message(def: MessageDef, validators: &ValidatorRegistry) -> Result<MessageParser, ConfigError> {
    let rules = def
        .rules
        .into_iter()
        .map(|r| build_rule(&def.name, r, validators))
        .collect::<Result<Vec<_>, _>>()?;
    MessageParser::new(def.name, rules)
}

fn build_rule(message: &str, def: RuleDef, validators: &ValidatorRegistry) -> Result<Rule, ConfigError> {
    let mut rule = Rule::new(def.name, def.kind);
    for v in def.validators {
        let validator = validators
            .create(&v.name, &v.params)
            .map_err(|source| ConfigError::Validator {
                message: message.to_string(),
                rule: rule.name().to_string(),
                source,
            })?;
        rule = rule.with_validator(validator);
    }
    Ok(rule)
}
