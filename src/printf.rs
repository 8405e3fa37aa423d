//! printf-style format strings for field values and numeric function output.
//!
//! A format holds at most one conversion surrounded by literal text, e.g. `%3.3d`,
//! `ID=%04d;` or `%-10s`. Supported: flags `-+ 0#`, width, precision, the length
//! modifiers `h l L q j z t` (accepted and ignored) and the conversions
//! `d i u o x X f F e E g G s c`. `%%` is a literal percent sign.
//!
//! Values are always text. Numeric conversions parse the value first and fall back to
//! `%s` rendering (same width and precision) when it does not parse.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("incomplete conversion at offset {0}")]
    Incomplete(usize),
    #[error("unknown conversion '%{conversion}' at offset {offset}")]
    UnknownConversion { conversion: char, offset: usize },
    #[error("format has no conversion")]
    NoConversion,
    #[error("more than one conversion (second at offset {0})")]
    TooManyConversions(usize),
    #[error("width or precision {value} at offset {offset} exceeds {max}", max = MAX_WIDTH)]
    TooWide { value: usize, offset: usize },
}

/// Upper bound for field width and precision.
pub const MAX_WIDTH: usize = u16::MAX as usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Signed,
    Unsigned,
    Octal,
    Hex { upper: bool },
    Fixed,
    Exp { upper: bool },
    General { upper: bool },
    Str,
    Char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Directive {
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Conversion,
}

/// A validated format string with exactly one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFormat {
    source: String,
    prefix: String,
    directive: Directive,
    suffix: String,
}

impl FieldFormat {
    pub fn parse(source: &str) -> Result<Self, FormatError> {
        let mut chars = source.char_indices().peekable();
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut directive = None;

        while let Some((offset, c)) = chars.next() {
            let text = if directive.is_some() { &mut suffix } else { &mut prefix };
            if c != '%' {
                text.push(c);
                continue;
            }
            if let Some(&(_, '%')) = chars.peek() {
                chars.next();
                text.push('%');
                continue;
            }
            if directive.is_some() {
                return Err(FormatError::TooManyConversions(offset));
            }
            directive = Some(parse_directive(&mut chars, offset)?);
        }

        Ok(FieldFormat {
            source: source.to_string(),
            prefix,
            directive: directive.ok_or(FormatError::NoConversion)?,
            suffix,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the conversion consumes an integer (`d i u o x X`).
    pub fn is_integer(&self) -> bool {
        matches!(
            self.directive.conversion,
            Conversion::Signed | Conversion::Unsigned | Conversion::Octal | Conversion::Hex { .. }
        )
    }

    pub fn render(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + value.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(&self.directive.render(value));
        out.push_str(&self.suffix);
        out
    }
}

impl FromStr for FieldFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldFormat::parse(s)
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_directive(chars: &mut Peekable<CharIndices<'_>>, start: usize) -> Result<Directive, FormatError> {
    let mut flags = Flags::default();
    while let Some(&(_, c)) = chars.peek() {
        match c {
            '-' => flags.left = true,
            '+' => flags.plus = true,
            ' ' => flags.space = true,
            '0' => flags.zero = true,
            '#' => flags.alt = true,
            _ => break,
        }
        chars.next();
    }

    let width = take_number(chars)?;
    let precision = if let Some(&(_, '.')) = chars.peek() {
        chars.next();
        Some(take_number(chars)?.unwrap_or(0))
    } else {
        None
    };

    while let Some(&(_, c)) = chars.peek() {
        if !matches!(c, 'h' | 'l' | 'L' | 'q' | 'j' | 'z' | 't') {
            break;
        }
        chars.next();
    }

    let (offset, c) = chars.next().ok_or(FormatError::Incomplete(start))?;
    let conversion = match c {
        'd' | 'i' => Conversion::Signed,
        'u' => Conversion::Unsigned,
        'o' => Conversion::Octal,
        'x' => Conversion::Hex { upper: false },
        'X' => Conversion::Hex { upper: true },
        'f' | 'F' => Conversion::Fixed,
        'e' => Conversion::Exp { upper: false },
        'E' => Conversion::Exp { upper: true },
        'g' => Conversion::General { upper: false },
        'G' => Conversion::General { upper: true },
        's' => Conversion::Str,
        'c' => Conversion::Char,
        other => {
            return Err(FormatError::UnknownConversion {
                conversion: other,
                offset,
            })
        }
    };

    Ok(Directive {
        flags,
        width,
        precision,
        conversion,
    })
}

fn take_number(chars: &mut Peekable<CharIndices<'_>>) -> Result<Option<usize>, FormatError> {
    let mut n: Option<usize> = None;
    let mut start = 0;
    while let Some(&(offset, c)) = chars.peek() {
        let Some(d) = c.to_digit(10) else { break };
        if n.is_none() {
            start = offset;
        }
        n = Some(n.unwrap_or(0).saturating_mul(10).saturating_add(d as usize));
        chars.next();
    }
    match n {
        Some(value) if value > MAX_WIDTH => Err(FormatError::TooWide { value, offset: start }),
        _ => Ok(n),
    }
}

/// Unsigned conversions reinterpret negative input the way C does.
fn parse_unsigned(value: &str) -> Option<u64> {
    let value = value.trim();
    value
        .parse::<u64>()
        .ok()
        .or_else(|| value.parse::<i64>().ok().map(|n| n as u64))
}

impl Directive {
    fn render(&self, value: &str) -> String {
        match self.conversion {
            Conversion::Str => self.render_text(value),
            Conversion::Char => self.pad_text(value.chars().next().map(String::from).unwrap_or_default()),
            Conversion::Signed => match value.trim().parse::<i64>() {
                Ok(n) => self.render_integer(n < 0, n.unsigned_abs()),
                Err(_) => self.render_text(value),
            },
            Conversion::Unsigned | Conversion::Octal | Conversion::Hex { .. } => {
                match parse_unsigned(value) {
                    Some(n) => self.render_integer(false, n),
                    None => self.render_text(value),
                }
            }
            Conversion::Fixed | Conversion::Exp { .. } | Conversion::General { .. } => {
                match value.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => self.render_float(v),
                    _ => self.render_text(value),
                }
            }
        }
    }

    fn render_text(&self, value: &str) -> String {
        let text = match self.precision {
            Some(p) => value.chars().take(p).collect(),
            None => value.to_string(),
        };
        self.pad_text(text)
    }

    fn pad_text(&self, text: String) -> String {
        let len = text.chars().count();
        let width = self.width.unwrap_or(0);
        if len >= width {
            return text;
        }
        let fill = " ".repeat(width - len);
        if self.flags.left {
            text + &fill
        } else {
            fill + &text
        }
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        }
    }

    fn render_integer(&self, negative: bool, magnitude: u64) -> String {
        let mut digits = match self.conversion {
            Conversion::Octal => format!("{:o}", magnitude),
            Conversion::Hex { upper: false } => format!("{:x}", magnitude),
            Conversion::Hex { upper: true } => format!("{:X}", magnitude),
            _ => magnitude.to_string(),
        };

        if let Some(p) = self.precision {
            if p == 0 && magnitude == 0 {
                digits.clear();
            } else if digits.len() < p {
                digits.insert_str(0, &"0".repeat(p - digits.len()));
            }
        }

        let mut prefix = match self.conversion {
            Conversion::Signed => self.sign(negative),
            _ => "",
        };
        if self.flags.alt {
            match self.conversion {
                Conversion::Octal if !digits.starts_with('0') => digits.insert(0, '0'),
                Conversion::Hex { upper } if magnitude != 0 => prefix = if upper { "0X" } else { "0x" },
                _ => {}
            }
        }

        // The zero flag is ignored once a precision is given.
        self.pad_number(prefix, digits, self.precision.is_none())
    }

    fn render_float(&self, v: f64) -> String {
        let precision = self.precision.unwrap_or(6);
        let magnitude = v.abs();
        let mut body = match self.conversion {
            Conversion::Exp { upper } => exp_notation(magnitude, precision, upper),
            Conversion::General { upper } => general_notation(magnitude, precision, upper, self.flags.alt),
            _ => format!("{:.*}", precision, magnitude),
        };
        if self.flags.alt && precision == 0 && self.conversion == Conversion::Fixed {
            body.push('.');
        }
        self.pad_number(self.sign(v < 0.0), body, true)
    }

    fn pad_number(&self, prefix: &str, body: String, zero_allowed: bool) -> String {
        let len = prefix.len() + body.len();
        let width = self.width.unwrap_or(0);
        if len >= width {
            return format!("{prefix}{body}");
        }
        let fill = width - len;
        if self.flags.left {
            format!("{prefix}{body}{}", " ".repeat(fill))
        } else if self.flags.zero && zero_allowed {
            format!("{prefix}{}{body}", "0".repeat(fill))
        } else {
            format!("{}{prefix}{body}", " ".repeat(fill))
        }
    }
}

/// `1.500000e+03` style, exponent at least two digits.
fn exp_notation(v: f64, precision: usize, upper: bool) -> String {
    let rust = format!("{:.*e}", precision, v);
    let (mantissa, exp) = match rust.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (rust.as_str(), 0),
    };
    format!(
        "{mantissa}{}{}{:02}",
        if upper { 'E' } else { 'e' },
        if exp < 0 { '-' } else { '+' },
        exp.unsigned_abs()
    )
}

fn decimal_exponent(v: f64, precision: usize) -> i64 {
    if v == 0.0 {
        return 0;
    }
    let rust = format!("{:.*e}", precision, v);
    rust.split_once('e')
        .and_then(|(_, e)| e.parse::<i64>().ok())
        .unwrap_or(0)
}

fn general_notation(v: f64, precision: usize, upper: bool, alt: bool) -> String {
    let p = precision.max(1);
    let x = decimal_exponent(v, p - 1);
    let text = if x >= -4 && x < p as i64 {
        format!("{:.*}", (p as i64 - 1 - x) as usize, v)
    } else {
        exp_notation(v, p - 1, upper)
    };
    if alt {
        return text;
    }
    match text.find(['e', 'E']) {
        Some(pos) => {
            let (mantissa, exp) = text.split_at(pos);
            format!("{}{}", strip_fraction_zeros(mantissa), exp)
        }
        None => strip_fraction_zeros(&text).to_string(),
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
