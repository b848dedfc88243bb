use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::ledger::Currency;
use crate::core::{AccountingClient, CurrencyRates, create, find, replace};

/// Decimal places of a stored exchange rate.
const RATE_DECIMALS: u32 = 6;

/// Base-currency price of one unit of a currency quoted at `rate` units per
/// base, rounded half away from zero. `None` for a zero rate.
pub fn inverse_rate(rate: Decimal) -> Option<Decimal> {
    Decimal::ONE
        .checked_div(rate)
        .map(|r| r.round_dp_with_strategy(RATE_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
}

/// Store every rate of a snapshot as buy and sell rate of its currency.
///
/// Currencies are looked up by uppercased code; new ones get the code as
/// description. Returns the number of currencies saved.
pub async fn upsert_currencies<C: AccountingClient>(client: &C, rates: &CurrencyRates) -> usize {
    let mut saved = 0;
    for (code, rate) in &rates.rates {
        let code = code.to_uppercase();
        let Some(rate) = inverse_rate(*rate) else {
            tracing::warn!(currency = %code, "zero exchange rate skipped");
            continue;
        };

        let path = format!("currencies/{code}");
        let exists = find::<C, Currency>(client, &path).await.is_some();
        let currency = Currency {
            code: Some(code.clone()),
            description: (!exists).then(|| code.clone()),
            unit: Some(Decimal::ONE),
            buy_rate: Some(rate),
            sell_rate: Some(rate),
        };

        let stored = if exists {
            replace(client, currency, &path).await
        } else {
            create(client, currency, "currencies").await
        };
        if stored.is_some() {
            saved += 1;
        }
    }
    tracing::info!(saved, base = %rates.base, "currency rates updated");
    saved
}
