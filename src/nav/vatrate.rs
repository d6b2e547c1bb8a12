//! VAT rate classification.
//!
//! Every NAV `vatRate` element carries exactly one of eight variants. Rate
//! totals (summary) and line tax combos (lines) are classified by separate
//! functions sharing the same precedence; only rate totals can produce
//! [`VatRate::Content`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::amount::{HUF_SCALE, round};
use super::xml_utils::{XmlWriter, format_amount, format_decimal};
use crate::core::{Invoice, NavError, Percentage, RateTotal, TaxCombo};

/// Extension holding the exemption case (e.g. `AAM`, `TAM`, `KBAET`).
pub const EXT_EXEMPTION_CODE: &str = "hu-exemption-code";

/// Extension holding the out-of-scope case (e.g. `ATK`, `EUFAD37`).
pub const EXT_OUT_OF_SCOPE_CODE: &str = "hu-vat-out-of-scope-code";

pub const TAG_SIMPLIFIED: &str = "simplified";
pub const TAG_DOMESTIC_REVERSE_CHARGE: &str = "domestic-reverse-charge";
pub const TAG_TRAVEL_AGENCY: &str = "travel-agency";
pub const TAG_SECOND_HAND: &str = "second-hand";
pub const TAG_ART: &str = "art";
pub const TAG_ANTIQUES: &str = "antiques";

/// Regime flags derived once per invoice from its tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxInfo {
    pub simplified: bool,
    pub domestic_reverse_charge: bool,
    pub travel_agency: bool,
    pub second_hand: bool,
    pub art: bool,
    pub antiques: bool,
}

impl TaxInfo {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self::from_tags(invoice.tags())
    }

    /// Unknown tags are ignored.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        let mut info = Self::default();
        for tag in tags {
            match tag {
                TAG_SIMPLIFIED => info.simplified = true,
                TAG_DOMESTIC_REVERSE_CHARGE => info.domestic_reverse_charge = true,
                TAG_TRAVEL_AGENCY => info.travel_agency = true,
                TAG_SECOND_HAND => info.second_hand = true,
                TAG_ART => info.art = true,
                TAG_ANTIQUES => info.antiques = true,
                _ => {}
            }
        }
        info
    }

    /// Margin scheme in precedence order: travel agency, second hand, art, antiques.
    pub fn margin_scheme(&self) -> Option<MarginScheme> {
        if self.travel_agency {
            Some(MarginScheme::TravelAgency)
        } else if self.second_hand {
            Some(MarginScheme::SecondHand)
        } else if self.art {
            Some(MarginScheme::Artwork)
        } else if self.antiques {
            Some(MarginScheme::Antique)
        } else {
            None
        }
    }
}

/// Margin scheme taxation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginScheme {
    TravelAgency,
    SecondHand,
    Artwork,
    Antique,
}

impl MarginScheme {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TravelAgency => "TRAVEL_AGENCY",
            Self::SecondHand => "SECOND_HAND",
            Self::Artwork => "ARTWORK",
            Self::Antique => "ANTIQUE",
        }
    }
}

/// NAV VAT rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VatRate {
    /// Rate as a fraction, e.g. `0.27`.
    Percentage(Decimal),
    /// VAT amount contained in a simplified invoice's gross amount.
    Content(Decimal),
    Exemption { case: String, reason: String },
    OutOfScope { case: String, reason: String },
    DomesticReverseCharge,
    MarginScheme(MarginScheme),
    AmountMismatch { rate: Decimal, case: String },
    NoVatCharge,
}

impl VatRate {
    pub fn exemption(case: impl Into<String>) -> Self {
        Self::Exemption {
            case: case.into(),
            reason: "Exempt".to_string(),
        }
    }

    pub fn out_of_scope(case: impl Into<String>) -> Self {
        Self::OutOfScope {
            case: case.into(),
            reason: "Out of Scope".to_string(),
        }
    }

    /// Write the variant's child element inside an already opened `vatRate`
    /// (or `lineVatRate`) element.
    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        match self {
            Self::Percentage(fraction) => {
                w.text_element("vatPercentage", &format_decimal(*fraction))?;
            }
            Self::Content(amount) => {
                w.text_element("vatContent", &format_amount(*amount))?;
            }
            Self::Exemption { case, reason } => {
                w.start_element("vatExemption")?;
                w.text_element("case", case)?;
                w.text_element("reason", reason)?;
                w.end_element("vatExemption")?;
            }
            Self::OutOfScope { case, reason } => {
                w.start_element("vatOutOfScope")?;
                w.text_element("case", case)?;
                w.text_element("reason", reason)?;
                w.end_element("vatOutOfScope")?;
            }
            Self::DomesticReverseCharge => {
                w.bool_element("vatDomesticReverseCharge", true)?;
            }
            Self::MarginScheme(scheme) => {
                w.text_element("marginSchemeIndicator", scheme.code())?;
            }
            Self::AmountMismatch { rate, case } => {
                w.start_element("vatAmountMismatch")?;
                w.text_element("vatRate", &format_decimal(*rate))?;
                w.text_element("case", case)?;
                w.end_element("vatAmountMismatch")?;
            }
            Self::NoVatCharge => {
                w.bool_element("noVatCharge", true)?;
            }
        }
        Ok(())
    }
}

/// What a VAT rate is classified from.
#[derive(Debug, Clone, Copy)]
pub enum RateSource<'a> {
    Total(&'a RateTotal),
    Combo(&'a TaxCombo),
}

pub fn classify(source: RateSource<'_>, info: &TaxInfo) -> Result<VatRate, NavError> {
    match source {
        RateSource::Total(total) => classify_total(total, info),
        RateSource::Combo(combo) => classify_combo(combo, info),
    }
}

/// Classify a VAT rate total of the invoice summary.
pub fn classify_total(total: &RateTotal, info: &TaxInfo) -> Result<VatRate, NavError> {
    if let Some(p) = total.percent {
        return Ok(VatRate::Percentage(p.fraction()));
    }
    if info.simplified {
        return Ok(VatRate::Content(round(total.amount, HUF_SCALE)));
    }
    classify_without_percent(total.percent, &total.ext, info)
}

/// Classify the VAT combo of an invoice line.
pub fn classify_combo(combo: &TaxCombo, info: &TaxInfo) -> Result<VatRate, NavError> {
    if let Some(p) = combo.percent {
        return Ok(VatRate::Percentage(p.fraction()));
    }
    classify_without_percent(combo.percent, &combo.ext, info)
}

fn classify_without_percent(
    percent: Option<Percentage>,
    ext: &BTreeMap<String, String>,
    info: &TaxInfo,
) -> Result<VatRate, NavError> {
    if let Some(case) = ext.get(EXT_EXEMPTION_CODE) {
        return Ok(VatRate::exemption(case.as_str()));
    }
    if let Some(case) = ext.get(EXT_OUT_OF_SCOPE_CODE) {
        return Ok(VatRate::out_of_scope(case.as_str()));
    }
    if info.domestic_reverse_charge {
        return Ok(VatRate::DomesticReverseCharge);
    }
    if let Some(scheme) = info.margin_scheme() {
        return Ok(VatRate::MarginScheme(scheme));
    }
    if percent.is_none() {
        return Ok(VatRate::NoVatCharge);
    }
    Err(NavError::NoVatRateField)
}
