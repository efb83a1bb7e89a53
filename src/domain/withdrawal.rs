//! Withdrawal domain rules: state machine, admission limits, and
//! advance-withdrawal pricing.

use bigdecimal::BigDecimal;

use crate::error::AppError;

/// Minimum amount accepted for a withdrawal request, in whole currency units.
pub const MONTO_MINIMO_RETIRO: i64 = 20000;

/// Fee percentage applied to advance withdrawals.
pub const PORCENTAJE_CARGO_ADELANTADO: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalState {
    Pendiente,
    Procesando,
    Completado,
    Rechazado,
    Cancelado,
}

impl WithdrawalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Procesando => "procesando",
            Self::Completado => "completado",
            Self::Rechazado => "rechazado",
            Self::Cancelado => "cancelado",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(Self::Pendiente),
            "procesando" => Some(Self::Procesando),
            "completado" => Some(Self::Completado),
            "rechazado" => Some(Self::Rechazado),
            "cancelado" => Some(Self::Cancelado),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completado | Self::Rechazado | Self::Cancelado)
    }

    /// Legal transitions: pendiente may move to any other state, procesando
    /// only to a terminal state. Terminal states are final.
    pub fn can_transition_to(&self, next: WithdrawalState) -> bool {
        match self {
            Self::Pendiente => next != Self::Pendiente,
            Self::Procesando => next.is_terminal(),
            _ => false,
        }
    }
}

/// Fee breakdown computed at admission time.
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalPricing {
    pub porcentaje_cargo_adicional: BigDecimal,
    pub monto_cargo_adicional: BigDecimal,
    pub monto_neto: BigDecimal,
}

impl WithdrawalPricing {
    /// Prices a withdrawal: advance requests pay `PORCENTAJE_CARGO_ADELANTADO`
    /// percent of the requested amount, rounded to the cent; standard
    /// requests carry no fee.
    pub fn price(monto: &BigDecimal, es_adelantado: bool) -> Self {
        if es_adelantado {
            let porcentaje = BigDecimal::from(PORCENTAJE_CARGO_ADELANTADO);
            let cargo = (monto * &porcentaje / BigDecimal::from(100)).round(2);
            let neto = monto - &cargo;
            Self {
                porcentaje_cargo_adicional: porcentaje,
                monto_cargo_adicional: cargo,
                monto_neto: neto,
            }
        } else {
            Self {
                porcentaje_cargo_adicional: BigDecimal::from(0),
                monto_cargo_adicional: BigDecimal::from(0),
                monto_neto: monto.clone(),
            }
        }
    }
}

/// Admission checks on the raw amount. Must run before any balance check:
/// a positive amount with at most two decimal places.
pub fn validate_amount(monto: &BigDecimal) -> Result<(), AppError> {
    if monto <= &BigDecimal::from(0) {
        return Err(AppError::InvalidAmount);
    }
    if monto.with_scale(2) != *monto {
        return Err(AppError::InvalidAmount);
    }
    Ok(())
}

pub fn validate_minimum(monto: &BigDecimal) -> Result<(), AppError> {
    if monto < &BigDecimal::from(MONTO_MINIMO_RETIRO) {
        return Err(AppError::BelowMinimum(MONTO_MINIMO_RETIRO));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn test_advance_pricing_at_minimum() {
        let pricing = WithdrawalPricing::price(&BigDecimal::from(20000), true);
        assert_eq!(pricing.monto_cargo_adicional, BigDecimal::from(1000));
        assert_eq!(pricing.monto_neto, BigDecimal::from(19000));
        assert_eq!(pricing.porcentaje_cargo_adicional, BigDecimal::from(5));
    }

    #[test]
    fn test_standard_pricing_has_no_fee() {
        let monto = BigDecimal::from(50000);
        let pricing = WithdrawalPricing::price(&monto, false);
        assert_eq!(pricing.monto_cargo_adicional, BigDecimal::from(0));
        assert_eq!(pricing.monto_neto, monto);
    }

    #[test]
    fn test_pricing_rounds_to_cents() {
        // 5% of 20000.33 = 1000.0165 -> rounded to cents
        let monto = BigDecimal::from_str("20000.33").unwrap();
        let pricing = WithdrawalPricing::price(&monto, true);
        assert_eq!(pricing.monto_cargo_adicional.with_scale(2), pricing.monto_cargo_adicional);
        assert_eq!(
            &pricing.monto_cargo_adicional + &pricing.monto_neto,
            monto
        );
    }

    #[test]
    fn test_validate_amount_rejects_non_positive() {
        assert!(matches!(
            validate_amount(&BigDecimal::from(0)),
            Err(AppError::InvalidAmount)
        ));
        assert!(matches!(
            validate_amount(&BigDecimal::from(-100)),
            Err(AppError::InvalidAmount)
        ));
    }

    #[test]
    fn test_validate_amount_rejects_sub_cent_precision() {
        let monto = BigDecimal::from_str("20000.001").unwrap();
        assert!(matches!(validate_amount(&monto), Err(AppError::InvalidAmount)));
        assert!(validate_amount(&BigDecimal::from_str("20000.01").unwrap()).is_ok());
    }

    #[test]
    fn test_minimum_is_boundary_inclusive() {
        assert!(matches!(
            validate_minimum(&BigDecimal::from(19999)),
            Err(AppError::BelowMinimum(20000))
        ));
        assert!(validate_minimum(&BigDecimal::from(20000)).is_ok());
    }

    #[test]
    fn test_state_transitions() {
        use WithdrawalState::*;
        assert!(Pendiente.can_transition_to(Procesando));
        assert!(Pendiente.can_transition_to(Completado));
        assert!(Pendiente.can_transition_to(Cancelado));
        assert!(Procesando.can_transition_to(Completado));
        assert!(Procesando.can_transition_to(Rechazado));
        assert!(!Procesando.can_transition_to(Pendiente));
        assert!(!Completado.can_transition_to(Rechazado));
        assert!(!Rechazado.can_transition_to(Pendiente));
        assert!(!Cancelado.can_transition_to(Completado));
    }

    #[test]
    fn test_state_parse_roundtrip() {
        for s in ["pendiente", "procesando", "completado", "rechazado", "cancelado"] {
            assert_eq!(WithdrawalState::parse(s).unwrap().as_str(), s);
        }
        assert!(WithdrawalState::parse("unknown").is_none());
    }

    proptest! {
        #[test]
        fn prop_fee_plus_net_equals_amount(units in 20000i64..10_000_000, cents in 0i64..100) {
            let monto = BigDecimal::from(units) + BigDecimal::from(cents) / BigDecimal::from(100);
            let pricing = WithdrawalPricing::price(&monto, true);
            prop_assert_eq!(&pricing.monto_cargo_adicional + &pricing.monto_neto, monto.clone());
            prop_assert!(pricing.monto_cargo_adicional > BigDecimal::from(0));
            prop_assert!(pricing.monto_neto < monto);
        }

        #[test]
        fn prop_standard_withdrawal_is_fee_free(units in 20000i64..10_000_000) {
            let monto = BigDecimal::from(units);
            let pricing = WithdrawalPricing::price(&monto, false);
            prop_assert_eq!(pricing.monto_cargo_adicional, BigDecimal::from(0));
            prop_assert_eq!(pricing.monto_neto, monto);
        }
    }
}
