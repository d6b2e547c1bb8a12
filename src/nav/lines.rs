//! Invoice line mapping.

use rust_decimal::Decimal;

use super::amount::{HUF_SCALE, mul, round, sum, to_huf};
use super::units::nav_unit;
use super::vatrate::{TaxInfo, VatRate, classify_combo};
use super::xml_utils::{XmlWriter, format_decimal};
use crate::core::{Discount, Identity, Line, NavError};

/// Product code categories NAV accepts with a plain value.
const CODE_CATEGORIES: &[&str] = &["AHK", "CSK", "EJ", "KN", "KT", "SZJ", "TESZOR", "VTSZ"];

const CODE_CATEGORY_OWN: &str = "OWN";
const CODE_CATEGORY_OTHER: &str = "OTHER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductCode {
    /// Registered category (VTSZ, SZJ, ...) or OTHER, with its value.
    Value { category: String, value: String },
    /// The issuer's own product code.
    Own(String),
}

impl ProductCode {
    pub fn from_identity(identity: &Identity) -> Self {
        let id_type = identity.id_type.as_deref().unwrap_or_default();
        if id_type == CODE_CATEGORY_OWN {
            return Self::Own(identity.code.clone());
        }
        let category = match CODE_CATEGORIES.binary_search(&id_type) {
            Ok(_) => id_type,
            Err(_) => CODE_CATEGORY_OTHER,
        };
        Self::Value {
            category: category.to_string(),
            value: identity.code.clone(),
        }
    }

    fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        w.start_element("productCode")?;
        match self {
            Self::Value { category, value } => {
                w.text_element("productCodeCategory", category)?;
                w.text_element("productCodeValue", value)?;
            }
            Self::Own(value) => {
                w.text_element("productCodeCategory", CODE_CATEGORY_OWN)?;
                w.text_element("productCodeOwnValue", value)?;
            }
        }
        w.end_element("productCode")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDiscount {
    pub description: String,
    pub value: Decimal,
    /// Fraction; only set for a single percentage discount.
    pub rate: Option<Decimal>,
}

impl LineDiscount {
    fn from_discounts(discounts: &[Discount]) -> Result<Option<Self>, NavError> {
        if discounts.is_empty() {
            return Ok(None);
        }
        let description = discounts
            .iter()
            .map(|d| format!("{}. ", d.reason.as_deref().unwrap_or_default()))
            .collect();
        let value = round(sum(discounts.iter().map(|d| d.amount))?, HUF_SCALE);
        let rate = match discounts {
            [single] => single.percent.map(|p| p.fraction()),
            _ => None,
        };
        Ok(Some(Self {
            description,
            value,
            rate,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAmounts {
    Normal {
        net: Decimal,
        net_huf: Decimal,
        vat_rate: VatRate,
    },
    Simplified {
        vat_rate: VatRate,
        gross: Decimal,
        gross_huf: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLine {
    pub number: u32,
    pub product_codes: Vec<ProductCode>,
    /// True when the unit is one of NAV's natural units.
    pub expression_indicator: bool,
    pub nature: Option<&'static str>,
    pub description: String,
    pub quantity: Decimal,
    pub unit_of_measure: Option<&'static str>,
    pub unit_of_measure_own: Option<String>,
    pub unit_price: Decimal,
    pub unit_price_huf: Decimal,
    pub discount: Option<LineDiscount>,
    pub amounts: Option<LineAmounts>,
}

impl NavLine {
    pub fn new(line: &Line, info: &TaxInfo, rate: Decimal) -> Result<Self, NavError> {
        let item = &line.item;

        let (expression_indicator, unit_of_measure, unit_of_measure_own) =
            match item.unit.as_deref().filter(|u| !u.is_empty()) {
                None => (false, None, None),
                Some(unit) => match nav_unit(unit) {
                    Some(nav) => (true, Some(nav), None),
                    None => (false, Some(CODE_CATEGORY_OWN), Some(unit.to_string())),
                },
            };

        let nature = item
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|k| match k {
                "PRODUCT" => "PRODUCT",
                "SERVICE" => "SERVICE",
                _ => "OTHER",
            });

        let amounts = match line.vat() {
            None => None,
            Some(vat) if info.simplified => {
                let vat_rate = match vat.percent {
                    Some(p) => VatRate::Content(round(mul(line.total, p.fraction())?, HUF_SCALE)),
                    None => classify_combo(vat, info)?,
                };
                Some(LineAmounts::Simplified {
                    vat_rate,
                    gross: line.total,
                    gross_huf: to_huf(line.total, rate)?,
                })
            }
            Some(vat) => Some(LineAmounts::Normal {
                net: line.total,
                net_huf: to_huf(line.total, rate)?,
                vat_rate: classify_combo(vat, info)?,
            }),
        };

        Ok(Self {
            number: line.index,
            product_codes: item.identities.iter().map(ProductCode::from_identity).collect(),
            expression_indicator,
            nature,
            description: item.name.clone(),
            quantity: line.quantity,
            unit_of_measure,
            unit_of_measure_own,
            unit_price: item.price,
            unit_price_huf: to_huf(item.price, rate)?,
            discount: LineDiscount::from_discounts(&line.discounts)?,
            amounts,
        })
    }

    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<(), NavError> {
        w.start_element("line")?;
        w.text_element("lineNumber", &self.number.to_string())?;
        if !self.product_codes.is_empty() {
            w.start_element("productCodes")?;
            for code in &self.product_codes {
                code.write_xml(w)?;
            }
            w.end_element("productCodes")?;
        }
        w.bool_element("lineExpressionIndicator", self.expression_indicator)?;
        w.opt_text_element("lineNatureIndicator", self.nature)?;
        w.text_element("lineDescription", &self.description)?;
        w.text_element("quantity", &format_decimal(self.quantity))?;
        w.opt_text_element("unitOfMeasure", self.unit_of_measure)?;
        w.opt_text_element("unitOfMeasureOwn", self.unit_of_measure_own.as_deref())?;
        w.amount_element("unitPrice", self.unit_price)?;
        w.amount_element("unitPriceHUF", self.unit_price_huf)?;

        if let Some(discount) = &self.discount {
            w.start_element("lineDiscountData")?;
            w.text_element("discountDescription", &discount.description)?;
            w.amount_element("discountValue", discount.value)?;
            if let Some(rate) = discount.rate {
                w.text_element("discountRate", &format_decimal(rate))?;
            }
            w.end_element("lineDiscountData")?;
        }

        match &self.amounts {
            Some(LineAmounts::Normal {
                net,
                net_huf,
                vat_rate,
            }) => {
                w.start_element("lineAmountsNormal")?;
                w.start_element("lineNetAmountData")?;
                w.amount_element("lineNetAmount", *net)?;
                w.amount_element("lineNetAmountHUF", *net_huf)?;
                w.end_element("lineNetAmountData")?;
                w.start_element("lineVatRate")?;
                vat_rate.write_xml(w)?;
                w.end_element("lineVatRate")?;
                w.end_element("lineAmountsNormal")?;
            }
            Some(LineAmounts::Simplified {
                vat_rate,
                gross,
                gross_huf,
            }) => {
                w.start_element("lineAmountsSimplified")?;
                w.start_element("lineVatRate")?;
                vat_rate.write_xml(w)?;
                w.end_element("lineVatRate")?;
                w.amount_element("lineGrossAmountSimplified", *gross)?;
                w.amount_element("lineGrossAmountSimplifiedHUF", *gross_huf)?;
                w.end_element("lineAmountsSimplified")?;
            }
            None => {}
        }

        w.end_element("line")?;
        Ok(())
    }
}

/// Map all lines of an invoice, in order.
pub fn map_lines(lines: &[Line], info: &TaxInfo, rate: Decimal) -> Result<Vec<NavLine>, NavError> {
    lines.iter().map(|l| NavLine::new(l, info, rate)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InvoiceBuilder, LineBuilder, PartyBuilder};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn calculated(line: Line) -> Line {
        let inv = InvoiceBuilder::new("L-1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .supplier(PartyBuilder::new("S").build())
            .add_line(line)
            .build()
            .unwrap();
        inv.lines.into_iter().next().unwrap()
    }

    #[test]
    fn code_categories_sorted() {
        for w in CODE_CATEGORIES.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn product_codes() {
        let id = |t: &str| Identity {
            id_type: Some(t.into()),
            key: None,
            code: "123".into(),
        };
        assert_eq!(ProductCode::from_identity(&id("OWN")), ProductCode::Own("123".into()));
        assert_eq!(
            ProductCode::from_identity(&id("TESZOR")),
            ProductCode::Value {
                category: "TESZOR".into(),
                value: "123".into()
            }
        );
        assert_eq!(
            ProductCode::from_identity(&id("EAN")),
            ProductCode::Value {
                category: "OTHER".into(),
                value: "123".into()
            }
        );
    }

    #[test]
    fn natural_unit() {
        let line = calculated(LineBuilder::new("Kábel", dec!(2.5), dec!(100)).unit("m").vat(dec!(27)).build());
        let nav = NavLine::new(&line, &TaxInfo::default(), Decimal::ONE).unwrap();
        assert!(nav.expression_indicator);
        assert_eq!(nav.unit_of_measure, Some("METER"));
        assert!(nav.unit_of_measure_own.is_none());
        assert_eq!(
            nav.amounts,
            Some(LineAmounts::Normal {
                net: dec!(250.0),
                net_huf: dec!(250.00),
                vat_rate: VatRate::Percentage(dec!(0.27)),
            })
        );
    }

    #[test]
    fn own_unit() {
        let line = calculated(LineBuilder::new("Doboz", dec!(1), dec!(10)).unit("box").build());
        let nav = NavLine::new(&line, &TaxInfo::default(), Decimal::ONE).unwrap();
        assert!(!nav.expression_indicator);
        assert_eq!(nav.unit_of_measure, Some("OWN"));
        assert_eq!(nav.unit_of_measure_own.as_deref(), Some("box"));
        assert!(nav.amounts.is_none());
    }

    #[test]
    fn nature_indicator() {
        let line = |key: &str| calculated(LineBuilder::new("x", dec!(1), dec!(1)).key(key).build());
        let nature = |l: &Line| NavLine::new(l, &TaxInfo::default(), Decimal::ONE).unwrap().nature;
        assert_eq!(nature(&line("SERVICE")), Some("SERVICE"));
        assert_eq!(nature(&line("goods")), Some("OTHER"));
        assert_eq!(nature(&line("")), None);
    }

    #[test]
    fn discounts() {
        let line = calculated(
            LineBuilder::new("x", dec!(3), dec!(33.33))
                .discount("Promo", dec!(1.005))
                .discount("Loyalty", dec!(2))
                .build(),
        );
        let nav = NavLine::new(&line, &TaxInfo::default(), Decimal::ONE).unwrap();
        assert_eq!(
            nav.discount,
            Some(LineDiscount {
                description: "Promo. Loyalty. ".into(),
                value: dec!(3.01),
                rate: None,
            })
        );

        let line = calculated(
            LineBuilder::new("x", dec!(1), dec!(200))
                .discount_percent("Season", dec!(15))
                .build(),
        );
        let nav = NavLine::new(&line, &TaxInfo::default(), Decimal::ONE).unwrap();
        let discount = nav.discount.unwrap();
        assert_eq!(discount.value, dec!(30.00));
        assert_eq!(discount.rate, Some(dec!(0.15)));
    }

    #[test]
    fn simplified_line() {
        let line = calculated(LineBuilder::new("Kenyér", dec!(2), dec!(500)).vat(dec!(5)).build());
        let info = TaxInfo {
            simplified: true,
            ..TaxInfo::default()
        };
        let nav = NavLine::new(&line, &info, dec!(2)).unwrap();
        assert_eq!(
            nav.amounts,
            Some(LineAmounts::Simplified {
                vat_rate: VatRate::Content(dec!(50.00)),
                gross: dec!(1000),
                gross_huf: dec!(2000.00),
            })
        );
        assert_eq!(nav.unit_price_huf, dec!(1000.00));
    }

    #[test]
    fn simplified_line_without_percent() {
        let line = calculated(
            LineBuilder::new("x", dec!(1), dec!(10))
                .vat_ext("hu-exemption-code", "AAM")
                .build(),
        );
        let info = TaxInfo {
            simplified: true,
            ..TaxInfo::default()
        };
        let nav = NavLine::new(&line, &info, Decimal::ONE).unwrap();
        assert!(matches!(
            nav.amounts,
            Some(LineAmounts::Simplified {
                vat_rate: VatRate::Exemption { .. },
                ..
            })
        ));
    }

    #[test]
    fn line_xml_order() {
        let line = calculated(
            LineBuilder::new("Tanácsadás", dec!(10), dec!(15000))
                .unit("h")
                .key("SERVICE")
                .product_code("SZJ", "7022")
                .vat(dec!(27))
                .build(),
        );
        let nav = NavLine::new(&line, &TaxInfo::default(), Decimal::ONE).unwrap();
        let mut w = XmlWriter::new().unwrap();
        nav.write_xml(&mut w).unwrap();
        let xml = w.into_string().unwrap();

        let order = [
            "<lineNumber>1</lineNumber>",
            "<productCodeCategory>SZJ</productCodeCategory>",
            "<lineExpressionIndicator>true</lineExpressionIndicator>",
            "<lineNatureIndicator>SERVICE</lineNatureIndicator>",
            "<lineDescription>Tanácsadás</lineDescription>",
            "<quantity>10</quantity>",
            "<unitOfMeasure>HOUR</unitOfMeasure>",
            "<unitPrice>15000.00</unitPrice>",
            "<lineNetAmount>150000.00</lineNetAmount>",
            "<vatPercentage>0.27</vatPercentage>",
        ];
        let mut pos = 0;
        for needle in order {
            let found = xml[pos..].find(needle).unwrap_or_else(|| panic!("{needle} missing in {xml}"));
            pos += found + needle.len();
        }
    }
}
