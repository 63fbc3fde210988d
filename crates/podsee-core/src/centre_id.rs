//! Stable discussion keys for centres.
//!
//! A centre's postal code identifies its discussion thread, so comments
//! survive renames in the dataset.

use thiserror::Error;

use crate::models::Centre;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Centre must have a postal code to generate centerId")]
pub struct MissingPostalCode;

/// The discussion key for a centre: its trimmed postal code.
pub fn generate_centre_id(centre: &Centre) -> Result<String, MissingPostalCode> {
    centre
        .postal_code_trimmed()
        .map(str::to_string)
        .ok_or(MissingPostalCode)
}

pub fn is_valid_centre_id(id: &str) -> bool {
    !id.trim().is_empty()
}
