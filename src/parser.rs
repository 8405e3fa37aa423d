//! Parse protocol definition source into an AST using PEST.

use crate::ast::*;
use crate::error::ConfigError;
use crate::rule::RuleKind;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct DefinitionParser;

/// Parse definition source into an AST. Names are not resolved here; see
/// [`Protocol::build`](crate::protocol::Protocol::build).
pub fn parse(source: &str) -> Result<ProtocolDef, ConfigError> {
    let pairs = DefinitionParser::parse(Rule::protocol, source)
        .map_err(|e| ConfigError::Syntax(e.to_string()))?;
    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Syntax("empty parse".to_string()))?;
    build_protocol(pair).map_err(ConfigError::Syntax)
}

fn build_protocol(pair: pest::iterators::Pair<Rule>) -> Result<ProtocolDef, String> {
    let mut def = ProtocolDef::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::template_section => def.templates.push(build_template(inner)?),
            Rule::scanner_section => def.scanners.push(build_scanner(inner)?),
            _ => {}
        }
    }
    Ok(def)
}

fn build_template(pair: pest::iterators::Pair<Rule>) -> Result<TemplateDef, String> {
    let mut it = pair.into_inner();
    let name = it.next().ok_or("template: missing name")?.as_str().to_string();
    let source = it.next().ok_or("template: missing source")?;
    Ok(TemplateDef {
        name,
        source: string_content(source).replace("\\\"", "\""),
    })
}

fn build_scanner(pair: pest::iterators::Pair<Rule>) -> Result<ScannerDef, String> {
    let mut name = String::new();
    let mut messages = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::message_section => messages.push(build_message(inner)?),
            _ => {}
        }
    }
    Ok(ScannerDef { name, messages })
}

fn build_message(pair: pest::iterators::Pair<Rule>) -> Result<MessageDef, String> {
    let mut name = String::new();
    let mut rules = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::rule_def => rules.push(build_rule(inner)?),
            _ => {}
        }
    }
    Ok(MessageDef { name, rules })
}

fn build_rule(pair: pest::iterators::Pair<Rule>) -> Result<RuleDef, String> {
    let mut name = String::new();
    let mut kind = None;
    let mut validators = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::rule_kind => kind = Some(build_rule_kind(inner)?),
            Rule::validator_list => {
                for v in inner.into_inner() {
                    validators.push(build_validator(v)?);
                }
            }
            _ => {}
        }
    }
    Ok(RuleDef {
        kind: kind.ok_or_else(|| format!("rule '{}': missing kind", name))?,
        name,
        validators,
    })
}

fn build_rule_kind(pair: pest::iterators::Pair<Rule>) -> Result<RuleKind, String> {
    let inner = pair.into_inner().next().ok_or("empty rule kind")?;
    match inner.as_rule() {
        Rule::offset_rule => {
            let mut it = inner.into_inner();
            let position = parse_num(it.next().ok_or("offset(pos, len): missing position")?.as_str())?;
            let length = parse_num(it.next().ok_or("offset(pos, len): missing length")?.as_str())?;
            Ok(RuleKind::Offset { position, length })
        }
        Rule::between_rule => {
            let mut it = inner.into_inner();
            let start = unescape_bytes(string_content(it.next().ok_or("between: missing start")?))?;
            let end = unescape_bytes(string_content(it.next().ok_or("between: missing end")?))?;
            Ok(RuleKind::Delimited { start, end })
        }
        other => Err(format!("unhandled rule kind: {:?}", other)),
    }
}

fn build_validator(pair: pest::iterators::Pair<Rule>) -> Result<ValidatorDef, String> {
    let mut it = pair.into_inner();
    let name = it.next().ok_or("validator: missing name")?.as_str().to_string();
    let params = it
        .map(|p| unescape_text(string_content(p)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ValidatorDef { name, params })
}

fn parse_num(s: &str) -> Result<usize, String> {
    s.parse().map_err(|_| format!("number out of range: {}", s))
}

/// Text between the quotes of a `string` pair, still escaped.
fn string_content(pair: pest::iterators::Pair<Rule>) -> &str {
    pair.into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or("")
}

/// Delimiter escapes: `\n \r \t \0 \" \\ \xHH`.
fn unescape_bytes(s: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('0') => out.push(0),
            Some('"') => out.push(b'"'),
            Some('\\') => out.push(b'\\'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() != 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return Err(format!("invalid hex escape: \\x{}", hex));
                }
                let byte = u8::from_str_radix(&hex, 16).map_err(|e| e.to_string())?;
                out.push(byte);
            }
            Some(other) => return Err(format!("unknown escape: \\{}", other)),
            None => return Err("dangling backslash".to_string()),
        }
    }
    Ok(out)
}

fn unescape_text(s: &str) -> Result<String, String> {
    String::from_utf8(unescape_bytes(s)?).map_err(|_| format!("parameter is not valid UTF-8: {:?}", s))
}
