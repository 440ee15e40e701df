//! Configuration access port trait.
//!
//! Missing keys fall back to the caller's default; present but malformed
//! values are errors rather than silent defaults.

use crate::domain::error::SigtraderError;
use std::str::FromStr;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_usize(&self, section: &str, key: &str, default: usize) -> Result<usize, SigtraderError> {
        parse_or_default(self.get_string(section, key), section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SigtraderError> {
        parse_or_default(self.get_string(section, key), section, key, default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SigtraderError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(value) => parse_bool(&value).ok_or_else(|| SigtraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected true/false, got `{value}`"),
            }),
        }
    }
}

fn parse_or_default<T: FromStr>(
    value: Option<String>,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, SigtraderError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| SigtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("cannot parse `{raw}`"),
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
