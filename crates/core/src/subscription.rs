//! API subscription quotes
//!
//! Validation happens before any payment is attempted; an invalid duration
//! never reaches the network.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Strip everything but ASCII digits, as typed into the months field
pub fn sanitize_months(input: &str) -> Result<String> {
    let non_digits = Regex::new(r"[^0-9]")?;
    Ok(non_digits.replace_all(input, "").into_owned())
}

/// Parse a sanitized duration, rejecting empty and zero
pub fn validate_months(input: &str) -> Result<u32> {
    let digits = sanitize_months(input)?;
    match digits.parse::<u32>() {
        Ok(months) if months > 0 => Ok(months),
        _ => Err(Error::InvalidMonths),
    }
}

/// Price of a subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub months: u32,
    /// Price per month in the chain's native token
    pub unit_price: f64,
    pub total: f64,
}

impl Quote {
    pub fn new(months: u32, unit_price: f64) -> Self {
        Self {
            months,
            unit_price,
            total: unit_price * f64::from(months),
        }
    }

    /// Validate raw input and price it
    pub fn from_input(input: &str, unit_price: f64) -> Result<Self> {
        validate_months(input).map(|months| Self::new(months, unit_price))
    }

    /// Total with two decimals, e.g. `"12.50 MATIC"`
    pub fn display_total(&self, symbol: &str) -> String {
        format!("{:.2} {}", self.total, symbol)
    }
}
