use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::NavError;

/// Tax category code used by GOBL for value added tax.
pub const CATEGORY_VAT: &str = "VAT";

/// Currency NAV reports in.
pub const CURRENCY_HUF: &str = "HUF";

/// Country code of Hungarian tax identities.
pub const COUNTRY_HU: &str = "HU";

/// A GOBL `bill.Invoice`, the read-only input of the conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice type (standard, credit-note, ...).
    #[serde(rename = "type", default)]
    pub invoice_type: InvoiceType,
    /// Optional series the code belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    /// Invoice number.
    pub code: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// ISO 4217 currency of all amounts.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Conversion rates from the invoice currency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchange_rates: Vec<ExchangeRate>,
    /// Invoice-wide tax settings (regime tags).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<TaxSettings>,
    /// Tags attached directly to the document (`$tags`).
    #[serde(rename = "$tags", default, skip_serializing_if = "Vec::is_empty")]
    pub doc_tags: Vec<String>,
    /// Party issuing the invoice.
    pub supplier: Party,
    /// Party receiving the invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Party>,
    /// Invoice lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Line>,
    /// Delivery date or period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
    /// Payment terms and instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    /// Calculated totals.
    #[serde(default)]
    pub totals: Totals,
}

fn default_currency() -> String {
    CURRENCY_HUF.to_string()
}

/// GOBL invoice types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceType {
    #[default]
    Standard,
    Proforma,
    Corrective,
    CreditNote,
    DebitNote,
    #[serde(other)]
    Other,
}

/// Invoice-level tax settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Tax regime tags, e.g. "simplified" or "domestic-reverse-charge".
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Conversion rate from one currency to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    /// Units of `to` per unit of `from`.
    pub amount: Decimal,
}

/// Supplier or customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<TaxIdentity>,
    /// Secondary identities; the first one carries a VAT group member code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    /// Postal addresses; the first one is used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
}

impl Party {
    /// The authoritative address.
    pub fn address(&self) -> Option<&Address> {
        self.addresses.first()
    }
}

/// Tax identity: country plus national code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxIdentity {
    pub country: String,
    #[serde(default)]
    pub code: String,
}

impl TaxIdentity {
    pub fn new(country: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            code: code.into(),
        }
    }

    pub fn is_hungarian(&self) -> bool {
        self.country == COUNTRY_HU
    }
}

impl fmt::Display for TaxIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.country, self.code)
    }
}

/// Generic typed code (party identities, product identifiers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub id_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub code: String,
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_box: Option<String>,
    #[serde(rename = "num", default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door: Option<String>,
    #[serde(default)]
    pub street: String,
    /// Public place category (utca, út, tér, ...), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_extra: Option<String>,
    #[serde(default)]
    pub locality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub code: String,
    /// ISO 3166-1 alpha-2 country.
    #[serde(default)]
    pub country: String,
}

/// Invoice line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    /// 1-based position in the invoice.
    #[serde(rename = "i")]
    pub index: u32,
    pub quantity: Decimal,
    pub item: Item,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taxes: Vec<TaxCombo>,
    /// quantity × price.
    #[serde(default)]
    pub sum: Decimal,
    /// Sum after discounts.
    #[serde(default)]
    pub total: Decimal,
}

impl Line {
    /// The VAT entry of the line, if any.
    pub fn vat(&self) -> Option<&TaxCombo> {
        self.taxes.iter().find(|t| t.category == CATEGORY_VAT)
    }
}

/// Item sold on a line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Nature of the item (PRODUCT, SERVICE, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
}

/// Line discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    pub amount: Decimal,
}

/// Tax applied to a line ("combo" in GOBL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCombo {
    #[serde(rename = "cat")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ext: BTreeMap<String, String>,
}

/// Delivery information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delivery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

/// Date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Payment details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<PaymentTerms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<PaymentInstructions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentTerms {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub due_dates: Vec<DueDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueDate {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

/// Means of payment, identified by a GOBL key such as `credit-transfer+sepa`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstructions {
    pub key: String,
}

/// Calculated invoice totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line totals.
    #[serde(default)]
    pub sum: Decimal,
    /// Net total after document discounts and charges.
    #[serde(default)]
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxes: Option<TaxTotal>,
    /// Total tax amount.
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub total_with_tax: Decimal,
    #[serde(default)]
    pub payable: Decimal,
}

impl Totals {
    /// Rate totals of the given tax category, in document order.
    pub fn category_rates(&self, category: &str) -> &[RateTotal] {
        self.taxes
            .as_ref()
            .and_then(|t| t.categories.iter().find(|c| c.code == category))
            .map(|c| c.rates.as_slice())
            .unwrap_or_default()
    }
}

/// Tax totals by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxTotal {
    #[serde(default)]
    pub categories: Vec<CategoryTotal>,
    #[serde(default)]
    pub sum: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub code: String,
    #[serde(default)]
    pub rates: Vec<RateTotal>,
    #[serde(default)]
    pub amount: Decimal,
}

/// Tax totals for one rate (and extension set) within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTotal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ext: BTreeMap<String, String>,
    /// Taxable base.
    pub base: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<Percentage>,
    /// Tax amount.
    pub amount: Decimal,
}

/// A percentage, stored as a fraction (`27%` is `0.27`).
///
/// Serialized the GOBL way, as a string with a `%` suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percentage(Decimal);

impl Percentage {
    /// From a percent value: `from_percent(dec!(27))` is 27%.
    pub fn from_percent(percent: Decimal) -> Self {
        Self(percent / Decimal::ONE_HUNDRED)
    }

    /// From a fraction: `from_fraction(dec!(0.27))` is 27%.
    pub fn from_fraction(fraction: Decimal) -> Self {
        Self(fraction)
    }

    pub fn fraction(&self) -> Decimal {
        self.0.normalize()
    }

    pub fn percent(&self) -> Decimal {
        self.0.saturating_mul(Decimal::ONE_HUNDRED).normalize()
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

impl FromStr for Percentage {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |_| NavError::Input(format!("invalid percentage {s:?}"));
        match s.strip_suffix('%') {
            Some(p) => Decimal::from_str(p.trim())
                .map(Self::from_percent)
                .map_err(invalid),
            None => Decimal::from_str(s)
                .map_err(invalid)
                .and_then(|f| match f.checked_mul(Decimal::ONE_HUNDRED) {
                    Some(_) => Ok(Self::from_fraction(f)),
                    None => Err(NavError::Input(format!("percentage {s:?} out of range"))),
                }),
        }
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Invoice {
    /// Parse a GOBL invoice from JSON. Accepts either a bare invoice or an
    /// envelope (`{"head": ..., "doc": {...}}`).
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match value {
            serde_json::Value::Object(mut map) if map.contains_key("doc") => {
                let doc = map.remove("doc").unwrap_or_default();
                Ok(serde_json::from_value(doc)?)
            }
            other => Ok(serde_json::from_value(other)?),
        }
    }

    /// All regime tags, from the tax settings and the document itself.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tax
            .iter()
            .flat_map(|t| t.tags.iter())
            .chain(self.doc_tags.iter())
            .map(String::as_str)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }

    pub fn is_credit_note(&self) -> bool {
        self.invoice_type == InvoiceType::CreditNote
    }

    /// A copy with the sign of every quantity and calculated amount flipped.
    /// Prices and percentages keep their sign.
    pub fn inverted(&self) -> Self {
        let mut inv = self.clone();
        for line in &mut inv.lines {
            line.quantity = -line.quantity;
            line.sum = -line.sum;
            line.total = -line.total;
            for d in &mut line.discounts {
                d.amount = -d.amount;
            }
        }
        let t = &mut inv.totals;
        t.sum = -t.sum;
        t.total = -t.total;
        t.tax = -t.tax;
        t.total_with_tax = -t.total_with_tax;
        t.payable = -t.payable;
        if let Some(taxes) = &mut t.taxes {
            taxes.sum = -taxes.sum;
            for cat in &mut taxes.categories {
                cat.amount = -cat.amount;
                for rate in &mut cat.rates {
                    rate.base = -rate.base;
                    rate.amount = -rate.amount;
                }
            }
        }
        inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percentage_parse() {
        let p: Percentage = "27%".parse().unwrap();
        assert_eq!(p.fraction(), dec!(0.27));
        assert_eq!(p.percent(), dec!(27));
        assert_eq!(p.to_string(), "27%");

        let p: Percentage = "18.5%".parse().unwrap();
        assert_eq!(p.fraction(), dec!(0.185));

        let p: Percentage = "0.05".parse().unwrap();
        assert_eq!(p.percent(), dec!(5));

        assert!("abc%".parse::<Percentage>().is_err());
    }

    #[test]
    fn percentage_serde() {
        let p: Percentage = serde_json::from_str("\"5%\"").unwrap();
        assert_eq!(p.fraction(), dec!(0.05));
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"5%\"");
    }

    #[test]
    fn tax_identity_display() {
        assert_eq!(TaxIdentity::new("DE", "123456789").to_string(), "DE123456789");
    }

    #[test]
    fn invoice_type_unknown_is_other() {
        let t: InvoiceType = serde_json::from_str("\"self-billed\"").unwrap();
        assert_eq!(t, InvoiceType::Other);
        let t: InvoiceType = serde_json::from_str("\"credit-note\"").unwrap();
        assert_eq!(t, InvoiceType::CreditNote);
    }
}
