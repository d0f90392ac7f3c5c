//! Bill derivation - the arithmetic behind every bill.
//!
//! Pure functions with no I/O. All money math happens in [`Decimal`] so totals
//! never pick up binary floating point drift.
//!
//! Money columns are `DECIMAL(12, 2)`. [`ensure_money`] keeps amounts inside
//! that range, so a value read back from storage equals the value written and
//! stored totals keep matching their inputs.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Serialize;

/// Decimal places kept for rents, rates and derived amounts.
pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound on the magnitude of any stored amount.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Rejects an amount with more than [`MONEY_SCALE`] decimal places or a
/// magnitude of [`MONEY_LIMIT`] or more.
pub fn ensure_money(field: &str, amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(Error::invalid(format!(
            "{field} allows at most {MONEY_SCALE} decimal places, got {amount}"
        )));
    }
    if amount.abs() >= MONEY_LIMIT {
        return Err(Error::invalid(format!(
            "{field} must be below {MONEY_LIMIT}, got {amount}"
        )));
    }
    Ok(())
}

impl BillFigures {
    /// Checks that the derived amounts fit the money columns.
    pub fn ensure_storable(&self) -> Result<()> {
        ensure_money("electricityAmt", self.electricity_amt)?;
        ensure_money("total", self.total)
    }
}

/// The derived part of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillFigures {
    /// `curr_units - prev_units`
    pub units_used: i32,
    /// `units_used * rate_per_unit`
    pub electricity_amt: Decimal,
    /// `rent_amount + electricity_amt`
    pub total: Decimal,
}

/// Derives usage, electricity charge and total from a bill's inputs.
///
/// A reading below the previous one produces negative usage; rejecting that is
/// the caller's decision.
#[must_use]
pub fn derive_bill(
    prev_units: i32,
    curr_units: i32,
    rate_per_unit: Decimal,
    rent_amount: Decimal,
) -> BillFigures {
    reprice(curr_units - prev_units, rate_per_unit, rent_amount)
}

/// Prices an already known `units_used`.
///
/// Rate-only edits go through here so the stored usage stays authoritative.
#[must_use]
pub fn reprice(units_used: i32, rate_per_unit: Decimal, rent_amount: Decimal) -> BillFigures {
    let electricity_amt = Decimal::from(units_used) * rate_per_unit;
    BillFigures {
        units_used,
        electricity_amt,
        total: rent_amount + electricity_amt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_limit_is_ten_billion() {
        assert_eq!(MONEY_LIMIT, dec!(10000000000));
    }

    #[test]
    fn test_ensure_money() {
        assert!(ensure_money("rent", dec!(5000)).is_ok());
        assert!(ensure_money("rate", dec!(7.35)).is_ok());
        // Trailing zeros do not count as precision
        assert!(ensure_money("rate", dec!(7.3500)).is_ok());
        assert!(ensure_money("rent", dec!(9999999999.99)).is_ok());

        assert!(matches!(
            ensure_money("rate", dec!(0.1234567890123456789)),
            Err(Error::Invalid { .. })
        ));
        assert!(ensure_money("rate", dec!(0.125)).is_err());
        assert!(ensure_money("rent", dec!(12345678901234.56)).is_err());
        assert!(ensure_money("rent", dec!(-10000000000)).is_err());
    }

    #[test]
    fn test_huge_usage_is_not_storable() {
        let figures = derive_bill(0, i32::MAX, dec!(9999999999.99), dec!(5000));
        assert!(figures.ensure_storable().is_err());
        assert!(derive_bill(50, 90, dec!(5), dec!(5000)).ensure_storable().is_ok());
    }

    #[test]
    fn test_room_101_scenario() {
        let figures = derive_bill(50, 90, dec!(5), dec!(5000));
        assert_eq!(figures.units_used, 40);
        assert_eq!(figures.electricity_amt, dec!(200));
        assert_eq!(figures.total, dec!(5200));
    }

    #[test]
    fn test_fractional_rate_has_no_drift() {
        // 0.1 and 0.2 are the classic floating point offenders
        let figures = derive_bill(0, 3, dec!(0.1), dec!(0.2));
        assert_eq!(figures.electricity_amt, dec!(0.3));
        assert_eq!(figures.total, dec!(0.5));

        let figures = derive_bill(1000, 1333, dec!(7.35), dec!(4999.99));
        assert_eq!(figures.electricity_amt, dec!(2447.55));
        assert_eq!(figures.total, dec!(7447.54));
    }

    #[test]
    fn test_zero_usage_total_is_rent() {
        let figures = derive_bill(120, 120, dec!(5), dec!(5500));
        assert_eq!(figures.units_used, 0);
        assert_eq!(figures.electricity_amt, Decimal::ZERO);
        assert_eq!(figures.total, dec!(5500));
    }

    #[test]
    fn test_meter_rollback_yields_negative_usage() {
        let figures = derive_bill(90, 50, dec!(5), dec!(5000));
        assert_eq!(figures.units_used, -40);
        assert_eq!(figures.electricity_amt, dec!(-200));
        assert_eq!(figures.total, dec!(4800));
    }

    #[test]
    fn test_reprice_uses_given_usage() {
        let figures = reprice(40, dec!(6.5), dec!(5000));
        assert_eq!(figures.units_used, 40);
        assert_eq!(figures.electricity_amt, dec!(260));
        assert_eq!(figures.total, dec!(5260));
    }

    #[test]
    fn test_derivation_identities_hold_across_inputs() {
        for prev in [0, 17, 250] {
            for used in [0, 1, 99, 1234] {
                for rate in [dec!(0), dec!(4.25), dec!(11)] {
                    let rent = dec!(3150.50);
                    let figures = derive_bill(prev, prev + used, rate, rent);
                    assert_eq!(figures.units_used, used);
                    assert_eq!(figures.electricity_amt, Decimal::from(used) * rate);
                    assert_eq!(figures.total, rent + figures.electricity_amt);
                }
            }
        }
    }
}
