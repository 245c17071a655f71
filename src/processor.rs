use crate::logging::Logger;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    sync::Arc,
};
use thiserror::Error;

/// One element of an input sequence.
///
/// Only integers and floats are numeric. Booleans, text and anything else a
/// config file can hold (arrays, tables, datetimes) are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Other(toml::Value),
}

impl Value {
    /// Numeric value as a float, or `None` for non-numeric elements.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(num) => Some(num as f64),
            Value::Float(num) => Some(num),
            Value::Bool(_) | Value::Text(_) | Value::Other(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(num) => write!(f, "{num}"),
            // Debug keeps the decimal point on whole floats.
            Value::Float(num) => write!(f, "{num:?}"),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Text(text) => f.write_str(text),
            Value::Other(other) => write!(f, "{other}"),
        }
    }
}

impl From<i64> for Value {
    fn from(num: i64) -> Self {
        Value::Int(num)
    }
}

impl From<i32> for Value {
    fn from(num: i32) -> Self {
        Value::Int(num.into())
    }
}

impl From<f64> for Value {
    fn from(num: f64) -> Self {
        Value::Float(num)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("invalid value: {0}")]
    InvalidValue(Value),
}

/// Running total that stays exact while only integers have been added.
#[derive(Clone, Copy)]
enum Sum {
    Int(i128),
    Float(f64),
}

impl Sum {
    fn mean(self, n_vals: usize) -> f64 {
        match self {
            Sum::Int(total) => {
                // Split off the integer part so it is not rounded before the division.
                let n_vals = n_vals as i128;
                (total / n_vals) as f64 + (total % n_vals) as f64 / n_vals as f64
            }
            Sum::Float(total) => total / n_vals as f64,
        }
    }
}

/// Averages sequences of values, narrating each step through a shared logger.
pub struct Processor {
    logger: Arc<Logger>,
}

impl Processor {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Compute the arithmetic mean of `values`.
    ///
    /// An empty sequence yields `0.0` with a warning. Validation stops at the
    /// first non-numeric element, which is reported through the returned error
    /// after being logged.
    pub fn process(&self, values: &[Value]) -> Result<f64, ValidationFailure> {
        self.logger.info("starting data processing");

        self.average(values).inspect_err(|error| {
            self.logger
                .critical(format_args!("critical error in processing: {error}"));
        })
    }

    fn average(&self, values: &[Value]) -> Result<f64, ValidationFailure> {
        if values.is_empty() {
            self.logger.warning("empty data list");
            return Ok(0.0);
        }

        let mut sum = Sum::Int(0);
        for (idx, value) in values.iter().enumerate() {
            self.logger
                .debug(format_args!("processing value {value} at position {idx}"));

            sum = match (sum, value) {
                (Sum::Int(total), &Value::Int(num)) => Sum::Int(total + i128::from(num)),
                (Sum::Int(total), &Value::Float(num)) => Sum::Float(total as f64 + num),
                (Sum::Float(total), &Value::Int(num)) => Sum::Float(total + num as f64),
                (Sum::Float(total), &Value::Float(num)) => Sum::Float(total + num),
                _ => {
                    self.logger
                        .error(format_args!("invalid value found: {value}"));
                    return Err(ValidationFailure::InvalidValue(value.clone()));
                }
            };
        }

        let mean = sum.mean(values.len());
        self.logger
            .info(format_args!("processing complete, computed mean: {mean:?}"));

        Ok(mean)
    }
}
