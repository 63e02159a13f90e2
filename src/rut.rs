//! Chilean RUT handling.
//!
//! Every RUT is stored in canonical form: digits of the body, a dash and the
//! uppercase check digit (`12345678-5`). Input may carry dots, dashes, spaces
//! or a lowercase `k`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RutError {
    #[error("RUT vacío o demasiado corto")]
    TooShort,
    #[error("RUT contiene caracteres no válidos en el cuerpo")]
    InvalidBody,
    #[error("dígito verificador incorrecto")]
    InvalidCheckDigit,
}

/// Keeps only `[0-9kK]` and uppercases.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'k' || *c == 'K')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Canonical `BODY-DV` form without validating the check digit. Used for
/// lookups, where an invalid RUT simply matches nothing.
pub fn canonical(raw: &str) -> String {
    let compact = normalize(raw);
    if compact.len() < 2 {
        return compact;
    }
    let (body, dv) = compact.split_at(compact.len() - 1);
    let body = match body.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    format!("{}-{}", body, dv)
}

/// Mod-11 check digit for a RUT body.
pub fn check_digit(mut body: u64) -> char {
    let mut sum = 0u64;
    let mut factor = 2u64;
    while body > 0 {
        sum += (body % 10) * factor;
        body /= 10;
        factor = if factor == 7 { 2 } else { factor + 1 };
    }
    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        d => char::from(b'0' + d as u8),
    }
}

/// A validated RUT in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rut(String);

impl Rut {
    pub fn parse(raw: &str) -> Result<Self, RutError> {
        let compact = normalize(raw);
        if compact.len() < 2 {
            return Err(RutError::TooShort);
        }
        let (body, dv) = compact.split_at(compact.len() - 1);
        if body.len() > 9 || !body.chars().all(|c| c.is_ascii_digit()) {
            return Err(RutError::InvalidBody);
        }
        let number: u64 = body.parse().map_err(|_| RutError::InvalidBody)?;
        let expected = check_digit(number);
        if dv.chars().next() != Some(expected) {
            return Err(RutError::InvalidCheckDigit);
        }
        Ok(Rut(format!("{}-{}", number, expected)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Rut {
    type Error = RutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rut::parse(&value)
    }
}

impl From<Rut> for String {
    fn from(rut: Rut) -> Self {
        rut.0
    }
}

/// Adapter for `#[validate(custom = "...")]` on request DTOs.
pub fn validate_rut(raw: &str) -> Result<(), validator::ValidationError> {
    Rut::parse(raw).map(|_| ()).map_err(|e| {
        let mut err = validator::ValidationError::new("rut");
        err.message = Some(e.to_string().into());
        err
    })
}
