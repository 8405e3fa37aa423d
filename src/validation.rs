//! Content validators for scanned field values.
//!
//! Validators are created by name plus string parameters through a
//! [`ValidatorRegistry`], mirroring how template functions are bound. A rule that
//! carries validators only matches when every validator accepts its value.
//!
//! | Name | Parameters | Accepts |
//! |------|------------|---------|
//! | `is_numeric` | | a floating point number |
//! | `is_integer` | | a signed integer |
//! | `is_date` | format, default `%d.%m.%Y` | a calendar date |
//! | `is_time` | format, default `%H:%M:%S` | a time of day |
//! | `is_datetime` | format, default `%Y-%m-%d %H:%M:%S` | date and time |
//! | `is_duration` | | `[[H:]M:]S` or plain seconds |
//! | `is_equal_to` | text | exactly `text` |
//!
//! Numeric checks ignore surrounding whitespace, which fixed-width fields often carry.

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown validator: {0}")]
    UnknownValidator(String),
    #[error("arity error: {validator} expects {expected} parameter(s), got {got}")]
    Arity {
        validator: String,
        expected: usize,
        got: usize,
    },
    #[error("argument error in {validator}: {message}")]
    Argument { validator: String, message: String },
}

pub trait Validator: fmt::Debug + Send + Sync {
    fn validate(&self, value: &str) -> bool;
}

/// Builds a [`Validator`] from its parameters.
pub trait ValidatorFactory: Send + Sync {
    fn create(&self, params: &[String]) -> Result<Arc<dyn Validator>, ValidationError>;
}

impl<F> ValidatorFactory for F
where
    F: Fn(&[String]) -> Result<Arc<dyn Validator>, ValidationError> + Send + Sync,
{
    fn create(&self, params: &[String]) -> Result<Arc<dyn Validator>, ValidationError> {
        self(params)
    }
}

pub struct ValidatorRegistry {
    factories: HashMap<String, Box<dyn ValidatorFactory>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        ValidatorRegistry {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = ValidatorRegistry::new();
        registry.register("is_numeric", is_numeric);
        registry.register("is_integer", is_integer);
        registry.register("is_date", is_date);
        registry.register("is_time", is_time);
        registry.register("is_datetime", is_datetime);
        registry.register("is_duration", is_duration);
        registry.register("is_equal_to", is_equal_to);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: impl ValidatorFactory + 'static) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn create(&self, name: &str, params: &[String]) -> Result<Arc<dyn Validator>, ValidationError> {
        self.factories
            .get(name)
            .ok_or_else(|| ValidationError::UnknownValidator(name.to_string()))?
            .create(params)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ValidatorRegistry").field("validators", &names).finish()
    }
}

type Created = Result<Arc<dyn Validator>, ValidationError>;

fn is_numeric(params: &[String]) -> Created {
    no_params("is_numeric", params)?;
    Ok(Arc::new(IsNumeric))
}

fn is_integer(params: &[String]) -> Created {
    no_params("is_integer", params)?;
    Ok(Arc::new(IsInteger))
}

fn is_date(params: &[String]) -> Created {
    let format = time_format("is_date", params, "%d.%m.%Y")?;
    Ok(Arc::new(DateTimeCheck::Date(format)))
}

fn is_time(params: &[String]) -> Created {
    let format = time_format("is_time", params, "%H:%M:%S")?;
    Ok(Arc::new(DateTimeCheck::Time(format)))
}

fn is_datetime(params: &[String]) -> Created {
    let format = time_format("is_datetime", params, "%Y-%m-%d %H:%M:%S")?;
    Ok(Arc::new(DateTimeCheck::DateTime(format)))
}

fn is_duration(params: &[String]) -> Created {
    no_params("is_duration", params)?;
    Ok(Arc::new(IsDuration))
}

fn is_equal_to(params: &[String]) -> Created {
    match params {
        [text] => Ok(Arc::new(IsEqualTo(text.clone()))),
        _ => Err(ValidationError::Arity {
            validator: "is_equal_to".into(),
            expected: 1,
            got: params.len(),
        }),
    }
}

fn no_params(validator: &str, params: &[String]) -> Result<(), ValidationError> {
    if params.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Arity {
            validator: validator.to_string(),
            expected: 0,
            got: params.len(),
        })
    }
}

fn time_format(validator: &str, params: &[String], default: &str) -> Result<String, ValidationError> {
    let format = match params {
        [] => default.to_string(),
        [format] => format.clone(),
        _ => {
            return Err(ValidationError::Arity {
                validator: validator.to_string(),
                expected: 1,
                got: params.len(),
            })
        }
    };
    if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
        return Err(ValidationError::Argument {
            validator: validator.to_string(),
            message: format!("invalid time format {:?}", format),
        });
    }
    Ok(format)
}

#[derive(Debug)]
struct IsNumeric;

impl Validator for IsNumeric {
    fn validate(&self, value: &str) -> bool {
        value.trim().parse::<f64>().is_ok_and(f64::is_finite)
    }
}

#[derive(Debug)]
struct IsInteger;

impl Validator for IsInteger {
    fn validate(&self, value: &str) -> bool {
        value.trim().parse::<i64>().is_ok()
    }
}

#[derive(Debug)]
enum DateTimeCheck {
    Date(String),
    Time(String),
    DateTime(String),
}

impl Validator for DateTimeCheck {
    fn validate(&self, value: &str) -> bool {
        match self {
            DateTimeCheck::Date(f) => NaiveDate::parse_from_str(value, f).is_ok(),
            DateTimeCheck::Time(f) => NaiveTime::parse_from_str(value, f).is_ok(),
            DateTimeCheck::DateTime(f) => NaiveDateTime::parse_from_str(value, f).is_ok(),
        }
    }
}

#[derive(Debug)]
struct IsDuration;

impl Validator for IsDuration {
    fn validate(&self, value: &str) -> bool {
        let parts: Vec<&str> = value.trim().split(':').collect();
        if parts.len() > 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
            return false;
        }
        // Every component after the first is minutes or seconds.
        parts[1..].iter().all(|p| p.parse::<u32>().is_ok_and(|n| n < 60))
    }
}

#[derive(Debug)]
struct IsEqualTo(String);

impl Validator for IsEqualTo {
    fn validate(&self, value: &str) -> bool {
        value == self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(name: &str, params: &[&str]) -> Arc<dyn Validator> {
        let params: Vec<String> = params.iter().map(|s| s.to_string()).collect();
        ValidatorRegistry::with_builtins()
            .create(name, &params)
            .expect("validator")
    }

    #[test]
    fn numeric() {
        let v = validator("is_numeric", &[]);
        assert!(v.validate("12938"));
        assert!(v.validate(" -1.5e3 "));
        assert!(!v.validate("Jochen Fugalla"));
        assert!(!v.validate(""));
    }

    #[test]
    fn integer() {
        let v = validator("is_integer", &[]);
        assert!(v.validate("-42"));
        assert!(v.validate("  7"));
        assert!(!v.validate("4.2"));
    }

    #[test]
    fn dates_and_times() {
        assert!(validator("is_date", &["%d.%m.%Y"]).validate("22.10.2014"));
        assert!(validator("is_date", &[]).validate("22.10.2014"));
        assert!(!validator("is_date", &[]).validate("32.10.2014"));
        assert!(validator("is_time", &[]).validate("23:59:01"));
        assert!(!validator("is_time", &["%H%M"]).validate("2561"));
        assert!(validator("is_datetime", &[]).validate("2014-10-22 08:00:00"));
        assert!(!validator("is_datetime", &[]).validate("2014-10-22"));
    }

    #[test]
    fn durations() {
        let v = validator("is_duration", &[]);
        assert!(v.validate("90"));
        assert!(v.validate("5:30"));
        assert!(v.validate("100:59:59"));
        assert!(!v.validate("1:60"));
        assert!(!v.validate("1::2"));
        assert!(!v.validate("1:2:3:4"));
        assert!(!v.validate("-5"));
    }

    #[test]
    fn equal_to() {
        let v = validator("is_equal_to", &["ACK"]);
        assert!(v.validate("ACK"));
        assert!(!v.validate("ack"));
    }

    #[test]
    fn construction_errors() {
        let registry = ValidatorRegistry::with_builtins();
        assert_eq!(
            registry.create("is_prime", &[]).unwrap_err(),
            ValidationError::UnknownValidator("is_prime".into())
        );
        assert!(matches!(
            registry.create("is_numeric", &["x".to_string()]),
            Err(ValidationError::Arity { .. })
        ));
        assert!(matches!(
            registry.create("is_equal_to", &[]),
            Err(ValidationError::Arity { expected: 1, got: 0, .. })
        ));
        assert!(matches!(
            registry.create("is_date", &["%Q".to_string()]),
            Err(ValidationError::Argument { .. })
        ));
    }
}
