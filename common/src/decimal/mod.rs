//! Decimal type utilities for precise money calculations

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with high precision
pub type Price = Decimal;

/// Quantity type with high precision
pub type Quantity = Decimal;

/// Amount type with high precision (balances, P&L)
pub type Amount = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Default price precision (8 decimal places)
    pub const PRICE_PRECISION: u32 = 8;

    /// Default amount precision (8 decimal places)
    pub const AMOUNT_PRECISION: u32 = 8;

    /// Round price to standard precision
    pub fn round_price(price: Price) -> Price {
        price.round_dp(PRICE_PRECISION)
    }

    /// Integer digits a stored value may carry (`NUMERIC(28, 8)`)
    pub const MAX_INTEGER_DIGITS: u32 = 20;

    /// Round a money amount to standard precision
    pub fn round_amount(amount: Amount) -> Amount {
        amount.round_dp(AMOUNT_PRECISION)
    }

    /// True when `value` fits a `NUMERIC(28, 8)` column
    pub fn is_storable(value: Decimal) -> bool {
        value.abs() < Decimal::from_i128_with_scale(10i128.pow(MAX_INTEGER_DIGITS), 0)
    }
}
