//! Buyers, their contact mechanisms and addresses, plus the geographic and
//! currency reference data that addresses and orders point at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A buyer. `amazon_email` is globally unique across Amazon and is the key
/// used to recognise a returning buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: i64,
    pub name: String,
    pub amazon_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Email,
    Phone,
    Mobile,
}

impl ContactKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContactKind::Email => "email",
            ContactKind::Phone => "phone",
            ContactKind::Mobile => "mobile",
        }
    }

    /// `true` for the kinds that hold a dialable number.
    #[must_use]
    pub fn is_telephone(self) -> bool {
        matches!(self, ContactKind::Phone | ContactKind::Mobile)
    }
}

impl std::fmt::Display for ContactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(ContactKind::Email),
            "phone" => Ok(ContactKind::Phone),
            "mobile" => Ok(ContactKind::Mobile),
            other => Err(format!("unknown contact kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMechanism {
    pub id: i64,
    pub party_id: i64,
    pub kind: ContactKind,
    pub value: String,
}

/// The comparable part of an address. Two addresses of the same party are
/// the same address exactly when their fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub name: String,
    pub street: String,
    pub streetbis: Option<String>,
    pub zip: String,
    pub city: String,
    pub country_id: i64,
    pub subdivision_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub party_id: i64,
    pub fields: AddressFields,
}

impl Address {
    /// Full-field structural comparison against a candidate.
    #[must_use]
    pub fn matches(&self, candidate: &AddressFields) -> bool {
        self.fields == *candidate
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: i64,
    /// ISO 3166-1 alpha-2 code.
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdivision {
    pub id: i64,
    pub country_id: i64,
    /// ISO 3166-2 code, e.g. `"US-CA"`.
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> AddressFields {
        AddressFields {
            name: "Jane Buyer".to_string(),
            street: "1 Main St".to_string(),
            streetbis: None,
            zip: "94105".to_string(),
            city: "San Francisco".to_string(),
            country_id: 1,
            subdivision_id: 5,
        }
    }

    #[test]
    fn address_matches_identical_fields() {
        let address = Address {
            id: 9,
            party_id: 3,
            fields: fields(),
        };
        assert!(address.matches(&fields()));
    }

    #[test]
    fn address_differs_on_any_single_field() {
        let address = Address {
            id: 9,
            party_id: 3,
            fields: fields(),
        };

        let mut other = fields();
        other.streetbis = Some("Apt 4".to_string());
        assert!(!address.matches(&other));

        let mut other = fields();
        other.subdivision_id = 6;
        assert!(!address.matches(&other));

        let mut other = fields();
        other.zip = "94106".to_string();
        assert!(!address.matches(&other));
    }

    #[test]
    fn contact_kind_round_trips_through_str() {
        for kind in [ContactKind::Email, ContactKind::Phone, ContactKind::Mobile] {
            assert_eq!(kind.as_str().parse::<ContactKind>(), Ok(kind));
        }
        assert!("fax".parse::<ContactKind>().is_err());
    }

    #[test]
    fn telephone_kinds() {
        assert!(ContactKind::Phone.is_telephone());
        assert!(ContactKind::Mobile.is_telephone());
        assert!(!ContactKind::Email.is_telephone());
    }
}
