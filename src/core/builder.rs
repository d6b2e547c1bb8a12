use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::NavError;
use super::types::*;

/// Builder for invoices with calculated line and tax totals.
///
/// GOBL documents read with [`Invoice::from_json`] are already calculated; this
/// builder is for constructing invoices in code.
///
/// ```
/// use szamla::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new("INV-001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
///     .supplier(PartyBuilder::new("Minta Kft.")
///         .tax_id("HU", "12345678202")
///         .address(AddressBuilder::new("Budapest", "1051", "HU").street("Fő").number("1").build())
///         .build())
///     .add_line(LineBuilder::new("Tanácsadás", dec!(10), dec!(15000)).unit("h").vat(dec!(27)).build())
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.totals.total, dec!(150000));
/// assert_eq!(invoice.totals.tax, dec!(40500.00));
/// ```
pub struct InvoiceBuilder {
    invoice_type: InvoiceType,
    code: String,
    issue_date: NaiveDate,
    currency: String,
    exchange_rates: Vec<ExchangeRate>,
    tags: Vec<String>,
    supplier: Option<Party>,
    customer: Option<Party>,
    lines: Vec<Line>,
    delivery: Option<Delivery>,
    payment: Option<Payment>,
}

impl InvoiceBuilder {
    pub fn new(code: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            invoice_type: InvoiceType::Standard,
            code: code.into(),
            issue_date,
            currency: CURRENCY_HUF.to_string(),
            exchange_rates: Vec::new(),
            tags: Vec::new(),
            supplier: None,
            customer: None,
            lines: Vec::new(),
            delivery: None,
            payment: None,
        }
    }

    pub fn invoice_type(mut self, invoice_type: InvoiceType) -> Self {
        self.invoice_type = invoice_type;
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn exchange_rate(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        self.exchange_rates.push(ExchangeRate {
            from: from.into(),
            to: to.into(),
            amount,
        });
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn supplier(mut self, party: Party) -> Self {
        self.supplier = Some(party);
        self
    }

    pub fn customer(mut self, party: Party) -> Self {
        self.customer = Some(party);
        self
    }

    /// Add a line; its index is its 1-based position.
    pub fn add_line(mut self, mut line: Line) -> Self {
        line.index = self.lines.len() as u32 + 1;
        self.lines.push(line);
        self
    }

    pub fn delivery_date(mut self, date: NaiveDate) -> Self {
        self.delivery.get_or_insert_with(Delivery::default).date = Some(date);
        self
    }

    pub fn delivery_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.delivery.get_or_insert_with(Delivery::default).period = Some(Period { start, end });
        self
    }

    /// Payment means key, e.g. `credit-transfer` or `cash`.
    pub fn payment_key(mut self, key: impl Into<String>) -> Self {
        self.payment.get_or_insert_with(Payment::default).instructions =
            Some(PaymentInstructions { key: key.into() });
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.payment
            .get_or_insert_with(Payment::default)
            .terms
            .get_or_insert_with(PaymentTerms::default)
            .due_dates
            .push(DueDate { date, amount: None });
        self
    }

    /// Build the invoice, calculating line totals and VAT totals.
    pub fn build(self) -> Result<Invoice, NavError> {
        let supplier = self
            .supplier
            .ok_or_else(|| NavError::Input("supplier is required".into()))?;

        if self.code.trim().is_empty() {
            return Err(NavError::Input("invoice code must not be empty".into()));
        }

        let mut invoice = Invoice {
            invoice_type: self.invoice_type,
            series: None,
            code: self.code,
            issue_date: self.issue_date,
            currency: self.currency,
            exchange_rates: self.exchange_rates,
            tax: (!self.tags.is_empty()).then(|| TaxSettings { tags: self.tags }),
            doc_tags: Vec::new(),
            supplier,
            customer: self.customer,
            lines: self.lines,
            delivery: self.delivery,
            payment: self.payment,
            totals: Totals::default(),
        };

        calculate_totals(&mut invoice);
        Ok(invoice)
    }
}

/// Calculate line sums and totals, VAT rate totals and invoice totals.
pub fn calculate_totals(invoice: &mut Invoice) {
    for line in &mut invoice.lines {
        line.sum = line.quantity * line.item.price;
        let discounts: Decimal = line.discounts.iter().map(|d| d.amount).sum();
        line.total = line.sum - discounts;
    }

    let sum: Decimal = invoice.lines.iter().map(|l| l.total).sum();

    // Group VAT bases by (percent, extensions); BTreeMap keeps the output deterministic.
    let mut groups: BTreeMap<(Option<Percentage>, BTreeMap<String, String>), Decimal> =
        BTreeMap::new();
    for line in &invoice.lines {
        if let Some(vat) = line.vat() {
            *groups
                .entry((vat.percent, vat.ext.clone()))
                .or_insert(Decimal::ZERO) += line.total;
        }
    }

    let mut tax = Decimal::ZERO;
    let rates: Vec<RateTotal> = groups
        .into_iter()
        .map(|((percent, ext), base)| {
            let amount = percent
                .map(|p| round_half_up(base * p.fraction(), 2))
                .unwrap_or(Decimal::ZERO);
            tax += amount;
            RateTotal {
                key: None,
                ext,
                base,
                percent,
                amount,
            }
        })
        .collect();

    invoice.totals = Totals {
        sum,
        total: sum,
        taxes: (!rates.is_empty()).then(|| TaxTotal {
            categories: vec![CategoryTotal {
                code: CATEGORY_VAT.to_string(),
                rates,
                amount: tax,
            }],
            sum: tax,
        }),
        tax,
        total_with_tax: sum + tax,
        payable: sum + tax,
    };
}

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Builder for Party (supplier/customer).
pub struct PartyBuilder {
    name: String,
    tax_id: Option<TaxIdentity>,
    identities: Vec<Identity>,
    addresses: Vec<Address>,
}

impl PartyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tax_id: None,
            identities: Vec::new(),
            addresses: Vec::new(),
        }
    }

    pub fn tax_id(mut self, country: impl Into<String>, code: impl Into<String>) -> Self {
        self.tax_id = Some(TaxIdentity::new(country, code));
        self
    }

    /// Add a secondary identity; the first one is read as the VAT group member code.
    pub fn identity(mut self, code: impl Into<String>) -> Self {
        self.identities.push(Identity {
            code: code.into(),
            ..Identity::default()
        });
        self
    }

    pub fn address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn build(self) -> Party {
        Party {
            name: self.name,
            tax_id: self.tax_id,
            identities: self.identities,
            addresses: self.addresses,
        }
    }
}

/// Builder for Address.
pub struct AddressBuilder {
    address: Address,
}

impl AddressBuilder {
    pub fn new(
        locality: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            address: Address {
                locality: locality.into(),
                code: postal_code.into(),
                country: country.into(),
                ..Address::default()
            },
        }
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.address.street = street.into();
        self
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.address.number = Some(number.into());
        self
    }

    pub fn street_type(mut self, street_type: impl Into<String>) -> Self {
        self.address.street_type = Some(street_type.into());
        self
    }

    pub fn street_extra(mut self, extra: impl Into<String>) -> Self {
        self.address.street_extra = Some(extra.into());
        self
    }

    pub fn block(mut self, block: impl Into<String>) -> Self {
        self.address.block = Some(block.into());
        self
    }

    pub fn floor(mut self, floor: impl Into<String>) -> Self {
        self.address.floor = Some(floor.into());
        self
    }

    pub fn door(mut self, door: impl Into<String>) -> Self {
        self.address.door = Some(door.into());
        self
    }

    pub fn po_box(mut self, po_box: impl Into<String>) -> Self {
        self.address.po_box = Some(po_box.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.address.region = Some(region.into());
        self
    }

    pub fn build(self) -> Address {
        self.address
    }
}

/// Builder for Line.
pub struct LineBuilder {
    item: Item,
    quantity: Decimal,
    discounts: Vec<Discount>,
    taxes: Vec<TaxCombo>,
}

impl LineBuilder {
    pub fn new(name: impl Into<String>, quantity: Decimal, price: Decimal) -> Self {
        Self {
            item: Item {
                name: name.into(),
                price,
                unit: None,
                key: None,
                identities: Vec::new(),
            },
            quantity,
            discounts: Vec::new(),
            taxes: Vec::new(),
        }
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.item.unit = Some(unit.into());
        self
    }

    /// Item nature, e.g. `PRODUCT` or `SERVICE`.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.item.key = Some(key.into());
        self
    }

    /// Add a product code, e.g. `("VTSZ", "8471")` or `("OWN", "SKU-1")`.
    pub fn product_code(mut self, id_type: impl Into<String>, code: impl Into<String>) -> Self {
        self.item.identities.push(Identity {
            id_type: Some(id_type.into()),
            key: None,
            code: code.into(),
        });
        self
    }

    pub fn discount(mut self, reason: impl Into<String>, amount: Decimal) -> Self {
        self.discounts.push(Discount {
            reason: Some(reason.into()),
            percent: None,
            amount,
        });
        self
    }

    /// Discount given as a percent of the line sum.
    pub fn discount_percent(mut self, reason: impl Into<String>, percent: Decimal) -> Self {
        let percent = Percentage::from_percent(percent);
        let amount = round_half_up(self.quantity * self.item.price * percent.fraction(), 2);
        self.discounts.push(Discount {
            reason: Some(reason.into()),
            percent: Some(percent),
            amount,
        });
        self
    }

    /// VAT at the given percent, e.g. `vat(dec!(27))`.
    pub fn vat(mut self, percent: Decimal) -> Self {
        self.taxes.push(TaxCombo {
            category: CATEGORY_VAT.to_string(),
            rate: None,
            percent: Some(Percentage::from_percent(percent)),
            ext: BTreeMap::new(),
        });
        self
    }

    /// VAT without a percentage, classified by an extension such as
    /// `hu-exemption-code`.
    pub fn vat_ext(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut ext = BTreeMap::new();
        ext.insert(key.into(), value.into());
        self.taxes.push(TaxCombo {
            category: CATEGORY_VAT.to_string(),
            rate: None,
            percent: None,
            ext,
        });
        self
    }

    /// VAT with neither percentage nor extension.
    pub fn vat_none(mut self) -> Self {
        self.taxes.push(TaxCombo {
            category: CATEGORY_VAT.to_string(),
            rate: None,
            percent: None,
            ext: BTreeMap::new(),
        });
        self
    }

    pub fn build(self) -> Line {
        Line {
            index: 0,
            quantity: self.quantity,
            item: self.item,
            discounts: self.discounts,
            taxes: self.taxes,
            sum: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn totals_grouped_by_rate() {
        let inv = InvoiceBuilder::new("A-1", date())
            .supplier(PartyBuilder::new("S").build())
            .add_line(LineBuilder::new("a", dec!(2), dec!(100)).vat(dec!(27)).build())
            .add_line(LineBuilder::new("b", dec!(1), dec!(50)).vat(dec!(5)).build())
            .add_line(LineBuilder::new("c", dec!(1), dec!(10)).vat(dec!(27)).build())
            .build()
            .unwrap();

        assert_eq!(inv.lines[0].index, 1);
        assert_eq!(inv.lines[2].index, 3);
        assert_eq!(inv.totals.total, dec!(260));

        let rates = inv.totals.category_rates(CATEGORY_VAT);
        assert_eq!(rates.len(), 2);
        // 5% sorts before 27%
        assert_eq!(rates[0].base, dec!(50));
        assert_eq!(rates[0].amount, dec!(2.50));
        assert_eq!(rates[1].base, dec!(210));
        assert_eq!(rates[1].amount, dec!(56.70));
        assert_eq!(inv.totals.tax, dec!(59.20));
    }

    #[test]
    fn discounts_reduce_line_total() {
        let inv = InvoiceBuilder::new("A-2", date())
            .supplier(PartyBuilder::new("S").build())
            .add_line(
                LineBuilder::new("a", dec!(10), dec!(10))
                    .discount_percent("Loyalty", dec!(10))
                    .discount("Promo", dec!(5))
                    .vat(dec!(27))
                    .build(),
            )
            .build()
            .unwrap();

        assert_eq!(inv.lines[0].sum, dec!(100));
        assert_eq!(inv.lines[0].total, dec!(85.00));
    }

    #[test]
    fn supplier_required() {
        let err = InvoiceBuilder::new("A-3", date()).build().unwrap_err();
        assert_eq!(err, NavError::Input("supplier is required".into()));
    }

    #[test]
    fn exempt_lines_have_zero_tax() {
        let inv = InvoiceBuilder::new("A-4", date())
            .supplier(PartyBuilder::new("S").build())
            .add_line(
                LineBuilder::new("a", dec!(1), dec!(100))
                    .vat_ext("hu-exemption-code", "AAM")
                    .build(),
            )
            .build()
            .unwrap();

        let rates = inv.totals.category_rates(CATEGORY_VAT);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].amount, Decimal::ZERO);
        assert_eq!(rates[0].ext.get("hu-exemption-code").map(String::as_str), Some("AAM"));
    }
}
