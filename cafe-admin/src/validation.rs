//! Form checks applied before credentials leave the client.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9 ]*$").expect("name pattern"));
static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%-]+@[A-Za-z0-9._%-]+\.[a-z]{2,3}$").expect("email pattern")
});
static CONTACT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[e0-9]{10}$").expect("contact number pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} is not valid")]
    Invalid(&'static str),
}

pub type InputResult = Result<(), InputError>;

pub fn required(field: &'static str, value: &str) -> InputResult {
    if value.trim().is_empty() {
        return Err(InputError::Required(field));
    }
    Ok(())
}

fn matches(field: &'static str, value: &str, pattern: &Regex) -> InputResult {
    required(field, value)?;
    if !pattern.is_match(value) {
        return Err(InputError::Invalid(field));
    }
    Ok(())
}

pub fn email(value: &str) -> InputResult {
    matches("email", value, &EMAIL)
}

pub fn name(value: &str) -> InputResult {
    matches("name", value, &NAME)
}

/// Ten characters, digits or `e`.
pub fn contact_number(value: &str) -> InputResult {
    matches("contact number", value, &CONTACT_NUMBER)
}
