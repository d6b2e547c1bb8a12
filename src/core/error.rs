use thiserror::Error;

/// Errors that can occur while reading an invoice or converting it to NAV XML.
///
/// All variants except [`NavError::Input`] and [`NavError::Xml`] are validation
/// errors: the invoice data cannot be legally represented in the NAV schema, and
/// retrying the conversion will never succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum NavError {
    /// Invoice is not in HUF and carries no exchange rate to HUF.
    #[error("no exchange rate to HUF found")]
    NoExchangeRate,

    /// A tax rate matches none of the NAV VAT rate representations.
    #[error("no vat rate field found")]
    NoVatRateField,

    /// The supplier's tax identity is not Hungarian.
    #[error("supplier tax identity is not Hungarian (country {0:?})")]
    NotHungarian(String),

    /// A VAT group member reference is not an 11-digit code with vat code 4.
    #[error("invalid group member code: {0:?}")]
    InvalidGroupMemberCode(String),

    /// A party that must be identified for tax purposes has no tax identity.
    #[error("{0} has no tax identity")]
    MissingTaxId(String),

    /// A party that must have an address has none.
    #[error("{0} has no address")]
    MissingAddress(String),

    /// The input document could not be read or built.
    #[error("invalid input: {0}")]
    Input(String),

    /// XML generation error.
    #[error("XML error: {0}")]
    Xml(String),
}

impl NavError {
    /// True when the error describes invoice data NAV cannot accept.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Input(_) | Self::Xml(_))
    }
}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        Self::Input(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_classification() {
        assert!(NavError::NoExchangeRate.is_validation());
        assert!(NavError::NotHungarian("DE".into()).is_validation());
        assert!(NavError::InvalidGroupMemberCode("123".into()).is_validation());
        assert!(!NavError::Input("bad json".into()).is_validation());
        assert!(!NavError::Xml("write".into()).is_validation());
    }

    #[test]
    fn messages() {
        assert_eq!(
            NavError::NoExchangeRate.to_string(),
            "no exchange rate to HUF found"
        );
        assert_eq!(
            NavError::NotHungarian("DE".into()).to_string(),
            "supplier tax identity is not Hungarian (country \"DE\")"
        );
    }
}
