//! Centre and offering models.
//!
//! `CentreRow` and `OfferingRow` mirror the `centres` and `offerings` sheets
//! of the dataset; `Centre` is the aggregated domain type.

use serde::{Deserialize, Serialize};

use crate::utils::format::format_phone;

/// One row of the `centres` sheet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CentreRow {
    pub centre_name: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website_url: Option<String>,
    pub whatsapp_number: Option<String>,
    #[serde(rename = "Whatsapp/Call")]
    pub contact_type: Option<String>,
}

/// One row of the `offerings` sheet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferingRow {
    pub centre_name: String,
    pub level: Option<String>,
    pub subject: Option<String>,
    pub notes: Option<String>,
}

/// A single class taught by a centre, with normalized level and subject.
///
/// Empty `level` or `subject` means the sheet left the cell blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub level: String,
    pub subject: String,
    pub notes: Option<String>,
}

/// A tuition centre aggregated from the dataset. `name` is the unique key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Centre {
    pub name: String,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub website_url: Option<String>,
    pub whatsapp_number: Option<String>,
    pub contact_type: Option<String>,
    /// Distinct levels, in level priority order.
    pub levels: Vec<String>,
    /// Distinct subjects, in subject priority order.
    pub subjects: Vec<String>,
    pub offerings: Vec<Offering>,
}

impl Centre {
    pub fn from_row(row: CentreRow) -> Self {
        Self {
            name: row.centre_name,
            address: row.address,
            postal_code: row.postal_code,
            website_url: row.website_url,
            whatsapp_number: row.whatsapp_number,
            contact_type: row.contact_type,
            levels: Vec::new(),
            subjects: Vec::new(),
            offerings: Vec::new(),
        }
    }

    /// Postal code with surrounding whitespace removed, if present and non-empty.
    pub fn postal_code_trimmed(&self) -> Option<&str> {
        self.postal_code
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Address with surrounding whitespace removed, if present and non-empty.
    pub fn address_trimmed(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// How the centre prefers to be contacted, e.g. "WhatsApp" or "Call".
    pub fn contact_display(&self) -> Option<String> {
        let number = self.whatsapp_number.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        match self.contact_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(kind) => Some(format!("{} ({})", format_phone(number), kind)),
            None => Some(format_phone(number)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_code_trimmed() {
        let mut centre = Centre {
            postal_code: Some(" 449269 ".to_string()),
            ..Default::default()
        };
        assert_eq!(centre.postal_code_trimmed(), Some("449269"));

        centre.postal_code = Some("   ".to_string());
        assert_eq!(centre.postal_code_trimmed(), None);

        centre.postal_code = None;
        assert_eq!(centre.postal_code_trimmed(), None);
    }

    #[test]
    fn test_contact_display() {
        let mut centre = Centre {
            whatsapp_number: Some("91234567".to_string()),
            contact_type: Some("Whatsapp".to_string()),
            ..Default::default()
        };
        assert_eq!(centre.contact_display().as_deref(), Some("9123 4567 (Whatsapp)"));

        centre.contact_type = None;
        assert_eq!(centre.contact_display().as_deref(), Some("9123 4567"));

        centre.whatsapp_number = None;
        assert_eq!(centre.contact_display(), None);
    }
}
