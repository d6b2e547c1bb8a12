//! Exchange rate resolution and HUF conversion.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{CURRENCY_HUF, Invoice, NavError};

/// Decimal digits kept on a resolved exchange rate.
pub const RATE_SCALE: u32 = 6;

/// Decimal digits of HUF amounts.
pub const HUF_SCALE: u32 = 2;

/// Rate from the invoice currency to HUF.
///
/// 1 for HUF invoices; otherwise the first exchange rate targeting HUF,
/// rounded to six decimals.
pub fn resolve_rate(invoice: &Invoice) -> Result<Decimal, NavError> {
    if invoice.currency == CURRENCY_HUF {
        return Ok(Decimal::ONE);
    }

    invoice
        .exchange_rates
        .iter()
        .find(|ex| ex.to == CURRENCY_HUF)
        .map(|ex| round(ex.amount, RATE_SCALE))
        .ok_or(NavError::NoExchangeRate)
}

/// Convert an amount to HUF with the resolved rate.
pub fn to_huf(amount: Decimal, rate: Decimal) -> Result<Decimal, NavError> {
    Ok(round(mul(amount, rate)?, HUF_SCALE))
}

pub(crate) fn mul(a: Decimal, b: Decimal) -> Result<Decimal, NavError> {
    a.checked_mul(b)
        .ok_or_else(|| NavError::Input(format!("amount overflow: {a} * {b}")))
}

pub(crate) fn sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, NavError> {
    amounts.into_iter().try_fold(Decimal::ZERO, |acc, a| {
        acc.checked_add(a)
            .ok_or_else(|| NavError::Input(format!("amount overflow: {acc} + {a}")))
    })
}

/// Round to `dp` decimals, half away from zero.
pub fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}
