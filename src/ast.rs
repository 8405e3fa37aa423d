//! Syntax tree of a protocol definition file.

use crate::rule::RuleKind;

/// Root definition: templates and scanners in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProtocolDef {
    pub templates: Vec<TemplateDef>,
    pub scanners: Vec<ScannerDef>,
}

/// `template NAME = "SOURCE";`
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDef {
    pub name: String,
    pub source: String,
}

/// `scanner NAME { message ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerDef {
    pub name: String,
    pub messages: Vec<MessageDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageDef {
    pub name: String,
    pub rules: Vec<RuleDef>,
}

/// `NAME: offset(..) | between(..) [validators];`
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDef {
    pub name: String,
    pub kind: RuleKind,
    pub validators: Vec<ValidatorDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorDef {
    pub name: String,
    pub params: Vec<String>,
}
