//! Payout destination rules for manually entered accounts.

use serde::Deserialize;

use crate::error::AppError;

pub const TIPO_MERCADO_PAGO: &str = "mercado_pago";
pub const TIPO_CUENTA_BANCARIA: &str = "cuenta_bancaria";

/// Caller-provided fields for a new payout destination. Mercado Pago entries
/// require an email; bank entries require CBU and account holder.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationSpec {
    pub tipo: String,
    pub mp_email: Option<String>,
    pub banco: Option<String>,
    pub tipo_cuenta: Option<String>,
    pub cbu: Option<String>,
    pub alias: Option<String>,
    pub titular: Option<String>,
    pub cuit_cuil: Option<String>,
}

impl DestinationSpec {
    pub fn validate(&self) -> Result<(), AppError> {
        match self.tipo.as_str() {
            TIPO_MERCADO_PAGO => {
                if self.mp_email.as_deref().map_or(true, |e| e.trim().is_empty()) {
                    return Err(AppError::BadRequest(
                        "Por favor ingresa tu email de Mercado Pago".to_string(),
                    ));
                }
            }
            TIPO_CUENTA_BANCARIA => {
                let cbu = self.cbu.as_deref().unwrap_or("");
                let titular = self.titular.as_deref().unwrap_or("");
                if cbu.is_empty() || titular.trim().is_empty() {
                    return Err(AppError::BadRequest(
                        "Por favor completa todos los campos obligatorios".to_string(),
                    ));
                }
                if !is_valid_cbu(cbu) {
                    return Err(AppError::BadRequest("El CBU ingresado no es válido".to_string()));
                }
            }
            other => {
                return Err(AppError::BadRequest(format!(
                    "Tipo de cuenta desconocido: {}",
                    other
                )));
            }
        }
        Ok(())
    }
}

/// A CBU is exactly 22 digits.
pub fn is_valid_cbu(cbu: &str) -> bool {
    cbu.len() == 22 && cbu.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_spec() -> DestinationSpec {
        DestinationSpec {
            tipo: TIPO_CUENTA_BANCARIA.to_string(),
            mp_email: None,
            banco: Some("Banco Nación".to_string()),
            tipo_cuenta: Some("caja_ahorro".to_string()),
            cbu: Some("2850590940090418135201".to_string()),
            alias: Some("parkit.cobros".to_string()),
            titular: Some("Juana Pérez".to_string()),
            cuit_cuil: Some("27-12345678-3".to_string()),
        }
    }

    #[test]
    fn test_bank_spec_valid() {
        assert!(bank_spec().validate().is_ok());
    }

    #[test]
    fn test_bank_spec_requires_cbu_and_titular() {
        let mut spec = bank_spec();
        spec.cbu = None;
        assert!(spec.validate().is_err());

        let mut spec = bank_spec();
        spec.titular = Some("  ".to_string());
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_mp_spec_requires_email() {
        let spec = DestinationSpec {
            tipo: TIPO_MERCADO_PAGO.to_string(),
            mp_email: None,
            banco: None,
            tipo_cuenta: None,
            cbu: None,
            alias: None,
            titular: None,
            cuit_cuil: None,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_cbu_validation() {
        assert!(is_valid_cbu("2850590940090418135201"));
        assert!(!is_valid_cbu("285059094009041813520"));
        assert!(!is_valid_cbu("28505909400904181352011"));
        assert!(!is_valid_cbu("28505909400904181352Z1"));
    }
}
