//! Generator functions callable from templates (`$name(arg, ...)`).
//!
//! A [`FunctionRegistry`] maps names to factories. A factory validates the argument
//! list once, when the template is compiled, and returns a [`Function`] that is
//! invoked on every `format()` call with the output produced so far.
//!
//! Functions hold only their construction arguments; any scratch state lives on the
//! stack of a single call, so compiled templates can be shared between threads.

use crate::printf::FieldFormat;
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;
use tracing::warn;

/// ASCII start-of-text; skipped by `checksum` when it leads the buffer.
pub const STX: u8 = 0x02;

/// Largest `repeat` count.
pub const MAX_REPEAT: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FunctionError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("arity error: {function} expects at least {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("argument error in {function}: {message}")]
    Argument { function: String, message: String },
}

impl FunctionError {
    fn arity(function: &str, expected: usize, got: usize) -> Self {
        FunctionError::Arity {
            function: function.to_string(),
            expected,
            got,
        }
    }

    fn argument(function: &str, message: impl Into<String>) -> Self {
        FunctionError::Argument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// A bound function instance.
pub trait Function: fmt::Debug + Send + Sync {
    /// Append this function's contribution; `out` holds everything written so far
    /// by the current `format()` call.
    fn apply(&self, out: &mut Vec<u8>);
}

/// Builds a [`Function`] from template arguments.
pub trait FunctionFactory: Send + Sync {
    fn create(&self, args: &[String]) -> Result<Box<dyn Function>, FunctionError>;
}

impl<F> FunctionFactory for F
where
    F: Fn(&[String]) -> Result<Box<dyn Function>, FunctionError> + Send + Sync,
{
    fn create(&self, args: &[String]) -> Result<Box<dyn Function>, FunctionError> {
        self(args)
    }
}

/// Name to factory table used by the template compiler.
pub struct FunctionRegistry {
    factories: HashMap<String, Box<dyn FunctionFactory>>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        FunctionRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry holding `repeat`, `now` and `checksum`.
    pub fn with_builtins() -> Self {
        let mut registry = FunctionRegistry::new();
        registry.register("repeat", Repeat::create);
        registry.register("now", Now::create);
        registry.register("checksum", Checksum::create);
        registry
    }

    /// Register (or replace) a factory.
    pub fn register(&mut self, name: impl Into<String>, factory: impl FunctionFactory + 'static) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn create(&self, name: &str, args: &[String]) -> Result<Box<dyn Function>, FunctionError> {
        self.factories
            .get(name)
            .ok_or_else(|| FunctionError::UnknownFunction(name.to_string()))?
            .create(args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

// ==================== Built-in functions ====================

/// `repeat(charOrCode, count)`: `count` copies of one character.
///
/// The first argument is an ASCII code if it parses as an integer, otherwise its
/// first character is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeat {
    unit: Vec<u8>,
    count: usize,
}

impl Repeat {
    pub fn new(unit: char, count: usize) -> Self {
        let mut buf = [0u8; 4];
        Repeat {
            unit: unit.encode_utf8(&mut buf).as_bytes().to_vec(),
            count,
        }
    }

    fn create(args: &[String]) -> Result<Box<dyn Function>, FunctionError> {
        if args.len() < 2 {
            return Err(FunctionError::arity("repeat", 2, args.len()));
        }

        let unit = match args[0].trim().parse::<u64>() {
            Ok(code) => {
                let byte = u8::try_from(code).map_err(|_| {
                    FunctionError::argument("repeat", format!("character code {} out of range", code))
                })?;
                vec![byte]
            }
            Err(_) => {
                let c = args[0]
                    .chars()
                    .next()
                    .ok_or_else(|| FunctionError::argument("repeat", "empty character argument"))?;
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).as_bytes().to_vec()
            }
        };

        let count = args[1].trim().parse::<usize>().map_err(|_| {
            FunctionError::argument(
                "repeat",
                format!("count must be a non-negative integer, got {:?}", args[1]),
            )
        })?;
        if count > MAX_REPEAT {
            return Err(FunctionError::argument(
                "repeat",
                format!("count {} exceeds {}", count, MAX_REPEAT),
            ));
        }

        Ok(Box::new(Repeat { unit, count }))
    }
}

impl Function for Repeat {
    fn apply(&self, out: &mut Vec<u8>) {
        for _ in 0..self.count {
            out.extend_from_slice(&self.unit);
        }
    }
}

/// `now(timeFormat)`: current local time, sampled on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Now {
    format: String,
}

impl Now {
    fn create(args: &[String]) -> Result<Box<dyn Function>, FunctionError> {
        let format = args.first().ok_or_else(|| FunctionError::arity("now", 1, 0))?;
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(FunctionError::argument(
                "now",
                format!("invalid time format {:?}", format),
            ));
        }
        Ok(Box::new(Now {
            format: format.clone(),
        }))
    }
}

impl Function for Now {
    fn apply(&self, out: &mut Vec<u8>) {
        let mut text = String::new();
        if write!(text, "{}", Local::now().format(&self.format)).is_err() {
            warn!(format = %self.format, "time format could not be rendered");
            return;
        }
        out.extend_from_slice(text.as_bytes());
    }
}

/// `checksum(numericFormat, emitNumeric)`: XOR over the output so far.
///
/// A leading STX byte is excluded from the sum. Unless `emitNumeric` is `"false"`
/// the checksum is first rendered through `numericFormat`; the raw checksum byte
/// is always appended last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    format: FieldFormat,
    emit_numeric: bool,
}

impl Checksum {
    fn create(args: &[String]) -> Result<Box<dyn Function>, FunctionError> {
        let source = args.first().ok_or_else(|| FunctionError::arity("checksum", 1, 0))?;
        let format = FieldFormat::parse(source)
            .map_err(|e| FunctionError::argument("checksum", format!("{:?}: {}", source, e)))?;
        let emit_numeric = args.get(1).map_or(true, |flag| flag != "false");
        Ok(Box::new(Checksum {
            format,
            emit_numeric,
        }))
    }

    /// XOR of all bytes after an optional leading STX.
    pub fn compute(buf: &[u8]) -> u8 {
        let body = match buf.first() {
            Some(&STX) => &buf[1..],
            _ => buf,
        };
        body.iter().fold(0u8, |acc, b| acc ^ b)
    }
}

impl Function for Checksum {
    fn apply(&self, out: &mut Vec<u8>) {
        let sum = Checksum::compute(out);
        if self.emit_numeric {
            out.extend_from_slice(self.format.render(&sum.to_string()).as_bytes());
        }
        out.push(sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(name: &str, list: &[&str], seed: &[u8]) -> Vec<u8> {
        let registry = FunctionRegistry::with_builtins();
        let f = registry.create(name, &args(list)).expect("create");
        let mut out = seed.to_vec();
        f.apply(&mut out);
        out
    }

    #[test]
    fn repeat_literal_char_and_code() {
        assert_eq!(run("repeat", &[" ", "3"], b"x"), b"x   ");
        assert_eq!(run("repeat", &["48", "2"], b""), b"00");
        assert_eq!(run("repeat", &["ab", "2"], b""), b"aa");
        assert_eq!(run("repeat", &["-", "0"], b"q"), b"q");
    }

    #[test]
    fn repeat_argument_errors() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(
            registry.create("repeat", &args(&["x"])).unwrap_err(),
            FunctionError::Arity {
                function: "repeat".into(),
                expected: 2,
                got: 1
            }
        );
        assert!(matches!(
            registry.create("repeat", &args(&["x", "many"])),
            Err(FunctionError::Argument { .. })
        ));
        assert!(matches!(
            registry.create("repeat", &args(&["x", "-1"])),
            Err(FunctionError::Argument { .. })
        ));
        assert!(matches!(
            registry.create("repeat", &args(&["300", "1"])),
            Err(FunctionError::Argument { .. })
        ));
    }

    #[test]
    fn repeat_count_is_bounded() {
        let registry = FunctionRegistry::with_builtins();
        for count in ["18446744073709551615", "65536"] {
            assert!(
                matches!(
                    registry.create("repeat", &args(&["x", count])),
                    Err(FunctionError::Argument { .. })
                ),
                "{count}"
            );
        }
        assert_eq!(run("repeat", &["x", "65535"], b"").len(), MAX_REPEAT);
        assert!(matches!(
            registry.create("checksum", &args(&["%99999X"])),
            Err(FunctionError::Argument { .. })
        ));
    }

    #[test]
    fn checksum_skips_leading_stx() {
        assert_eq!(Checksum::compute(b""), 0);
        assert_eq!(Checksum::compute(&[STX, 0x41, 0x42]), 0x41 ^ 0x42);
        assert_eq!(Checksum::compute(&[0x41, STX]), 0x41 ^ STX);
    }

    #[test]
    fn checksum_numeric_then_raw_byte() {
        let out = run("checksum", &["%2.2X"], &[STX, b'A', b'B']);
        assert_eq!(out, [STX, b'A', b'B', b'0', b'3', 0x03]);
    }

    #[test]
    fn checksum_raw_only() {
        let out = run("checksum", &["%2.2X", "false"], b"AB");
        assert_eq!(out, [b'A', b'B', 0x03]);
    }

    #[test]
    fn checksum_needs_format() {
        let registry = FunctionRegistry::with_builtins();
        assert!(matches!(
            registry.create("checksum", &[]),
            Err(FunctionError::Arity { .. })
        ));
        assert!(matches!(
            registry.create("checksum", &args(&["none"])),
            Err(FunctionError::Argument { .. })
        ));
    }

    #[test]
    fn now_validates_format() {
        let registry = FunctionRegistry::with_builtins();
        assert!(matches!(registry.create("now", &[]), Err(FunctionError::Arity { .. })));
        assert!(matches!(
            registry.create("now", &args(&["%Q"])),
            Err(FunctionError::Argument { .. })
        ));
        let out = run("now", &["%Y"], b"");
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(u8::is_ascii_digit));
    }

    #[test]
    fn unknown_and_custom_functions() {
        let mut registry = FunctionRegistry::new();
        assert_eq!(
            registry.create("repeat", &[]).unwrap_err(),
            FunctionError::UnknownFunction("repeat".into())
        );

        #[derive(Debug)]
        struct Etx;
        impl Function for Etx {
            fn apply(&self, out: &mut Vec<u8>) {
                out.push(0x03);
            }
        }
        registry.register("etx", |_: &[String]| -> Result<Box<dyn Function>, FunctionError> {
            Ok(Box::new(Etx))
        });
        assert!(registry.contains("etx"));
        assert_eq!(registry.names(), vec!["etx"]);
        let f = registry.create("etx", &[]).unwrap();
        let mut out = Vec::new();
        f.apply(&mut out);
        assert_eq!(out, [0x03]);
    }
}
