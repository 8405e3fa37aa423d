//! Template compiler: a character-driven state machine producing [`Fragment`]s.
//!
//! ## Template language
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | text | literal text |
//! | `\X` | `X` taken literally (including `$`, `\`, `#`) |
//! | `\` + CR or LF | that one character swallowed (soft wrap) |
//! | `#65;` | one raw byte, ASCII code 0 to 126 |
//! | `$(key)` | record value |
//! | `$(key:%5.2f)` | record value through a printf-style format |
//! | `$name(a,b)` | function call through the [`FunctionRegistry`] |
//!
//! All errors are reported here, at compile time; formatting a compiled template
//! cannot fail.

use crate::fragment::Fragment;
use crate::functions::{FunctionError, FunctionRegistry};
use crate::printf::FormatError;
use std::fmt;
use std::mem;

/// Construct left open at the end of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Escape,
    AsciiCode,
    Command,
    FunctionName,
    ParameterList,
    FieldKey,
    FieldFormat,
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Construct::Escape => "escape sequence",
            Construct::AsciiCode => "ASCII code",
            Construct::Command => "command",
            Construct::FunctionName => "function name",
            Construct::ParameterList => "parameter list",
            Construct::FieldKey => "field reference",
            Construct::FieldFormat => "field format",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("function call at offset {position}: {source}")]
    Function {
        position: usize,
        #[source]
        source: FunctionError,
    },
    #[error("illegal ASCII code {code:?} at offset {position}")]
    IllegalAsciiCode { code: String, position: usize },
    #[error("unterminated {construct} starting at offset {position}")]
    Unterminated { construct: Construct, position: usize },
    #[error("empty field key at offset {position}")]
    EmptyFieldKey { position: usize },
    #[error("invalid format {format:?} for field '{key}': {source}")]
    Format {
        key: String,
        format: String,
        #[source]
        source: FormatError,
    },
}

/// Compile `source` into fragments, binding function calls through `registry`.
pub fn compile(source: &str, registry: &FunctionRegistry) -> Result<Vec<Fragment>, TemplateError> {
    let mut compiler = Compiler::new(registry);
    for (pos, c) in source.char_indices() {
        compiler.step(pos, c)?;
    }
    compiler.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Literal,
    Escape,
    AsciiCode,
    Command,
    FunctionName,
    ParameterList,
    FieldKey,
    FieldFormat,
}

struct Compiler<'r> {
    registry: &'r FunctionRegistry,
    fragments: Vec<Fragment>,
    state: State,
    /// Byte offset of the construct being read, for error reporting.
    start: usize,
    literal: String,
    /// Function name or field key.
    name: String,
    format: String,
    params: Vec<String>,
    param: String,
    code: String,
}

impl<'r> Compiler<'r> {
    fn new(registry: &'r FunctionRegistry) -> Self {
        Compiler {
            registry,
            fragments: Vec::new(),
            state: State::Start,
            start: 0,
            literal: String::new(),
            name: String::new(),
            format: String::new(),
            params: Vec::new(),
            param: String::new(),
            code: String::new(),
        }
    }

    fn step(&mut self, pos: usize, c: char) -> Result<(), TemplateError> {
        match self.state {
            State::Start | State::Literal => self.literal_char(pos, c),
            State::Escape => {
                // An escaped CR or LF is dropped.
                if !is_line_break(c) {
                    self.literal.push(c);
                }
                self.state = State::Literal;
            }
            State::AsciiCode => match c {
                ';' => {
                    self.apply_ascii_code()?;
                    self.state = State::Literal;
                }
                '0'..='9' => self.code.push(c),
                _ => {
                    self.code.push(c);
                    return Err(TemplateError::IllegalAsciiCode {
                        code: mem::take(&mut self.code),
                        position: self.start,
                    });
                }
            },
            State::Command => {
                if c == '(' {
                    self.state = State::FieldKey;
                } else {
                    self.name.push(c);
                    self.state = State::FunctionName;
                }
            }
            State::FunctionName => {
                if c == '(' {
                    self.state = State::ParameterList;
                } else {
                    self.name.push(c);
                }
            }
            State::ParameterList => match c {
                ',' => {
                    let param = mem::take(&mut self.param);
                    self.params.push(param);
                }
                ')' => {
                    self.shift_function()?;
                    self.state = State::Start;
                }
                _ => self.param.push(c),
            },
            State::FieldKey => match c {
                ':' => self.state = State::FieldFormat,
                ')' => {
                    self.shift_field()?;
                    self.state = State::Start;
                }
                _ => self.name.push(c),
            },
            State::FieldFormat => {
                if c == ')' {
                    self.shift_field()?;
                    self.state = State::Start;
                } else {
                    self.format.push(c);
                }
            }
        }
        Ok(())
    }

    fn literal_char(&mut self, pos: usize, c: char) {
        match c {
            '\\' => {
                self.start = pos;
                self.state = State::Escape;
            }
            '#' => {
                self.start = pos;
                self.state = State::AsciiCode;
            }
            '$' => {
                self.shift_literal();
                self.start = pos;
                self.state = State::Command;
            }
            _ => {
                self.literal.push(c);
                self.state = State::Literal;
            }
        }
    }

    fn apply_ascii_code(&mut self) -> Result<(), TemplateError> {
        let code = mem::take(&mut self.code);
        match code.parse::<u8>() {
            Ok(byte) if byte < 127 => {
                self.literal.push(char::from(byte));
                Ok(())
            }
            _ => Err(TemplateError::IllegalAsciiCode {
                code,
                position: self.start,
            }),
        }
    }

    fn shift_literal(&mut self) {
        if !self.literal.is_empty() {
            self.fragments.push(Fragment::Literal(mem::take(&mut self.literal)));
        }
    }

    fn shift_function(&mut self) -> Result<(), TemplateError> {
        // `$f()` has no arguments at all, `$f(,)` has two empty ones.
        if !self.params.is_empty() || !self.param.is_empty() {
            let param = mem::take(&mut self.param);
            self.params.push(param);
        }
        let name = mem::take(&mut self.name);
        let params = mem::take(&mut self.params);
        let function = self
            .registry
            .create(&name, &params)
            .map_err(|source| TemplateError::Function {
                position: self.start,
                source,
            })?;
        self.fragments.push(Fragment::Functional { name, function });
        Ok(())
    }

    fn shift_field(&mut self) -> Result<(), TemplateError> {
        let key = mem::take(&mut self.name);
        let format = mem::take(&mut self.format);
        if key.is_empty() {
            return Err(TemplateError::EmptyFieldKey { position: self.start });
        }
        let fragment = Fragment::field(key.clone(), &format)
            .map_err(|source| TemplateError::Format { key, format, source })?;
        self.fragments.push(fragment);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Fragment>, TemplateError> {
        let construct = match self.state {
            State::Start | State::Literal => {
                self.shift_literal();
                return Ok(self.fragments);
            }
            State::Escape => Construct::Escape,
            State::AsciiCode => Construct::AsciiCode,
            State::Command => Construct::Command,
            State::FunctionName => Construct::FunctionName,
            State::ParameterList => Construct::ParameterList,
            State::FieldKey => Construct::FieldKey,
            State::FieldFormat => Construct::FieldFormat,
        };
        Err(TemplateError::Unterminated {
            construct,
            position: self.start,
        })
    }
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}
