//! Money formatting.
//!
//! The merchant API accepts amounts as strings with exactly two decimals and
//! a `.` separator regardless of locale. Rounding is half-up (away from zero
//! on the midpoint), so `99.995` becomes `"100.00"`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// Number of decimals the API expects on every amount.
pub const MONEY_SCALE: u32 = 2;

/// Format an amount as a two-decimal string.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// `serialize_with` helper for amount fields.
pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_money(*amount))
}

/// `serialize_with` helper for optional amount fields.
pub mod option {
    use rust_decimal::Decimal;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        amount: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match amount {
            Some(amount) => serializer.serialize_str(&super::format_money(*amount)),
            None => serializer.serialize_none(),
        }
    }
}
