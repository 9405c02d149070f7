//! Conversión de montos entre unidades mayores y menores
//!
//! El gateway de pagos trabaja con unidades menores enteras (centavos);
//! internamente los precios son `Decimal` en unidades mayores. Esta es la
//! única conversión permitida en todo el sistema.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::utils::errors::{AppError, AppResult};

/// Convertir un monto en unidades mayores a unidades menores enteras
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    let minor = (amount * Decimal::from(100)).round();
    minor
        .to_i64()
        .ok_or_else(|| AppError::Internal(format!("Amount {} cannot be represented in minor units", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_whole_amounts() {
        assert_eq!(to_minor_units(dec!(80)).unwrap(), 8000);
        assert_eq!(to_minor_units(dec!(0)).unwrap(), 0);
    }

    #[test]
    fn test_fractional_amounts_round() {
        assert_eq!(to_minor_units(dec!(10.5)).unwrap(), 1050);
        assert_eq!(to_minor_units(dec!(10.555)).unwrap(), 1056);
        assert_eq!(to_minor_units(dec!(10.554)).unwrap(), 1055);
    }
}
