//! Definition grammar tests: syntax (parse success/failure) and semantics (build, name checks).

use devwire::{parse, ConfigError, Protocol, RuleKind, TemplateError};

// ==================== Syntax: valid definitions ====================

#[test]
fn parse_empty_definition() {
    let p = parse("").expect("empty definition can parse");
    assert!(p.templates.is_empty());
    assert!(p.scanners.is_empty());
}

#[test]
fn parse_single_template() {
    let p = parse(r##"template ack = "#6;";"##).expect("parse");
    assert_eq!(p.templates.len(), 1);
    assert_eq!(p.templates[0].name, "ack");
    assert_eq!(p.templates[0].source, "#6;");
}

#[test]
fn parse_template_keeps_template_escapes() {
    let p = parse(r#"template t = "a\\b \$X\
c";"#)
        .expect("parse");
    assert_eq!(p.templates[0].source, "a\\\\b \\$X\\\nc");
}

#[test]
fn parse_scanner_rules_in_order() {
    let src = r#"
scanner printer {
  message status {
    code: offset(0, 3);
    text: between("@@", "|");
  }
  message error {
    error: between("ERR:", "\r\n");
  }
}
"#;
    let p = parse(src).expect("parse");
    assert_eq!(p.scanners.len(), 1);
    let scanner = &p.scanners[0];
    assert_eq!(scanner.name, "printer");
    assert_eq!(scanner.messages.len(), 2);

    let status = &scanner.messages[0];
    assert_eq!(status.name, "status");
    assert_eq!(status.rules[0].name, "code");
    assert_eq!(status.rules[0].kind, RuleKind::Offset { position: 0, length: 3 });
    assert_eq!(
        status.rules[1].kind,
        RuleKind::Delimited {
            start: b"@@".to_vec(),
            end: b"|".to_vec()
        }
    );
    assert_eq!(
        scanner.messages[1].rules[0].kind,
        RuleKind::Delimited {
            start: b"ERR:".to_vec(),
            end: b"\r\n".to_vec()
        }
    );
}

#[test]
fn parse_delimiter_hex_escapes() {
    let src = r#"scanner s { message m { body: between("\x02", "\x03"); } }"#;
    let p = parse(src).expect("parse");
    assert_eq!(
        p.scanners[0].messages[0].rules[0].kind,
        RuleKind::Delimited {
            start: vec![0x02],
            end: vec![0x03]
        }
    );
}

#[test]
fn parse_validators_with_params() {
    let src = r#"
scanner s {
  message m {
    when: between("@", ";") [is_date("%Y-%m-%d"), is_equal_to("2024-01-01")];
    n: offset(0, 2) [is_integer];
    d: offset(2, 5) [is_duration()];
  }
}
"#;
    let p = parse(src).expect("parse");
    let rules = &p.scanners[0].messages[0].rules;
    assert_eq!(rules[0].validators.len(), 2);
    assert_eq!(rules[0].validators[0].name, "is_date");
    assert_eq!(rules[0].validators[0].params, ["%Y-%m-%d"]);
    assert_eq!(rules[0].validators[1].params, ["2024-01-01"]);
    assert_eq!(rules[1].validators[0].name, "is_integer");
    assert!(rules[1].validators[0].params.is_empty());
    assert!(rules[2].validators[0].params.is_empty());
}

#[test]
fn parse_with_comments() {
    let src = r#"
// line comment
template a = "x"; /* block */
scanner s {
  /* multi
     line */
  message m { f: offset(0, 1); } // trailing
}
"#;
    let p = parse(src).expect("parse");
    assert_eq!(p.templates.len(), 1);
    assert_eq!(p.scanners[0].messages[0].rules.len(), 1);
}

#[test]
fn parse_sections_in_any_order() {
    let src = r#"
scanner s { message m { f: offset(0, 1); } }
template a = "x";
scanner t { message m { f: offset(0, 1); } }
template b = "y";
"#;
    let p = parse(src).expect("parse");
    let names: Vec<&str> = p.templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(p.scanners.len(), 2);
}

// ==================== Syntax: invalid definitions ====================

#[test]
fn parse_fails_missing_semicolon() {
    assert!(matches!(parse(r#"template a = "x""#), Err(ConfigError::Syntax(_))));
    assert!(parse("scanner s { message m { f: offset(0, 1) } }").is_err());
}

#[test]
fn parse_fails_unterminated_string() {
    assert!(parse(r#"template a = "x;"#).is_err());
}

#[test]
fn parse_fails_unknown_rule_kind() {
    assert!(parse(r#"scanner s { message m { f: regex("x"); } }"#).is_err());
}

#[test]
fn parse_fails_negative_offset() {
    assert!(parse("scanner s { message m { f: offset(-1, 2); } }").is_err());
}

#[test]
fn parse_fails_offset_out_of_range() {
    let src = "scanner s { message m { f: offset(99999999999999999999999, 1); } }";
    assert!(matches!(parse(src), Err(ConfigError::Syntax(_))));
}

#[test]
fn parse_fails_bad_delimiter_escape() {
    assert!(matches!(
        parse(r#"scanner s { message m { f: between("\q", ";"); } }"#),
        Err(ConfigError::Syntax(msg)) if msg.contains("unknown escape")
    ));
}

#[test]
fn parse_fails_unclosed_block() {
    assert!(parse("scanner s { message m { f: offset(0, 1); }").is_err());
}

// ==================== Semantics: build ====================

#[test]
fn build_rejects_empty_scanner() {
    assert!(matches!(
        Protocol::from_source("scanner s { }"),
        Err(ConfigError::EmptyScanner(name)) if name == "s"
    ));
}

#[test]
fn build_rejects_duplicate_message() {
    let src = "scanner s { message m { a: offset(0, 1); } message m { b: offset(1, 1); } }";
    assert!(matches!(
        Protocol::from_source(src),
        Err(ConfigError::DuplicateMessage { scanner, message }) if scanner == "s" && message == "m"
    ));
}

#[test]
fn build_rejects_duplicate_rule() {
    let src = "scanner s { message m { a: offset(0, 1); a: offset(1, 1); } }";
    assert!(matches!(
        Protocol::from_source(src),
        Err(ConfigError::DuplicateRule { message, rule }) if message == "m" && rule == "a"
    ));
}

#[test]
fn build_reports_bad_template_with_position() {
    let err = Protocol::from_source(r#"template bad = "ok#300;";"#).unwrap_err();
    match err {
        ConfigError::Template { name, source } => {
            assert_eq!(name, "bad");
            assert_eq!(
                source,
                TemplateError::IllegalAsciiCode {
                    code: "300".into(),
                    position: 2
                }
            );
        }
        other => panic!("expected template error, got {:?}", other),
    }
}

#[test]
fn build_rejects_validator_arity() {
    let src = r#"scanner s { message m { a: offset(0, 1) [is_equal_to]; } }"#;
    assert!(matches!(
        Protocol::from_source(src),
        Err(ConfigError::Validator { message, rule, .. }) if message == "m" && rule == "a"
    ));
}

#[test]
fn build_rejects_bad_time_format() {
    let src = r#"scanner s { message m { a: offset(0, 8) [is_time("%Q")]; } }"#;
    assert!(matches!(Protocol::from_source(src), Err(ConfigError::Validator { .. })));
}

#[test]
fn message_without_rules_matches_anything() {
    let protocol = Protocol::from_source("scanner s { message any { } }").unwrap();
    let m = protocol.scanner("s").unwrap().scan(b"whatever").unwrap();
    assert_eq!(m.name(), "any");
    assert!(m.fields().is_empty());
}
