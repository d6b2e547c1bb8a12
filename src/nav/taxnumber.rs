//! Hungarian tax number decomposition.
//!
//! A Hungarian tax number is `xxxxxxxx-y-zz`: an 8-digit taxpayer id, a VAT code
//! and a 2-digit county code. VAT code 5 marks a VAT group; the member's own
//! number (VAT code 4) is then reported alongside it.

use crate::core::{NavError, Party};

/// VAT code of a VAT group's own tax number.
const VAT_CODE_GROUP: &str = "5";

/// VAT code of a VAT group member.
const VAT_CODE_GROUP_MEMBER: &str = "4";

/// Decomposed tax number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxNumber {
    pub taxpayer_id: String,
    pub vat_code: Option<String>,
    pub county_code: Option<String>,
}

impl TaxNumber {
    /// A tax number carrying only a taxpayer id.
    pub fn taxpayer_only(taxpayer_id: impl Into<String>) -> Self {
        Self {
            taxpayer_id: taxpayer_id.into(),
            vat_code: None,
            county_code: None,
        }
    }

    /// Split an 11-character Hungarian code. Returns `None` for any other length
    /// or for non-ASCII input.
    pub fn split_hungarian(code: &str) -> Option<Self> {
        if code.len() != 11 || !code.is_ascii() {
            return None;
        }
        Some(Self {
            taxpayer_id: code[..8].to_string(),
            vat_code: Some(code[8..9].to_string()),
            county_code: Some(code[9..11].to_string()),
        })
    }

    pub fn is_group(&self) -> bool {
        self.vat_code.as_deref() == Some(VAT_CODE_GROUP)
    }
}

/// Decompose the party's tax identity into its tax number and, for VAT group
/// numbers, the group member number taken from the first secondary identity.
///
/// A party without a tax identity is reported as [`NavError::MissingTaxId`].
pub fn decompose(party: &Party) -> Result<(TaxNumber, Option<TaxNumber>), NavError> {
    let tax_id = party
        .tax_id
        .as_ref()
        .ok_or_else(|| NavError::MissingTaxId(party.name.clone()))?;

    if !tax_id.is_hungarian() {
        return Ok((TaxNumber::taxpayer_only(tax_id.to_string()), None));
    }

    let Some(number) = TaxNumber::split_hungarian(&tax_id.code) else {
        // 8-digit taxpayer id only
        return Ok((TaxNumber::taxpayer_only(tax_id.code.clone()), None));
    };

    if !number.is_group() {
        return Ok((number, None));
    }

    let member = party
        .identities
        .first()
        .map(|id| id.code.as_str())
        .ok_or_else(|| NavError::InvalidGroupMemberCode(String::new()))?;
    Ok((number, Some(group_member(member)?)))
}

fn group_member(code: &str) -> Result<TaxNumber, NavError> {
    let invalid = || NavError::InvalidGroupMemberCode(code.to_string());
    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let member = TaxNumber::split_hungarian(code).ok_or_else(invalid)?;
    if member.vat_code.as_deref() != Some(VAT_CODE_GROUP_MEMBER) {
        return Err(invalid());
    }
    Ok(member)
}
