// src/common/validation.rs
//
// Validadores customizados para o `validator` (Decimal não implementa range).

use rust_decimal::Decimal;
use validator::ValidationError;

/// Casas decimais das colunas de dinheiro e de taxa (`NUMERIC(14,4)` / `NUMERIC(7,4)`).
pub const STORAGE_SCALE: u32 = 4;

/// Limite (exclusivo) de `NUMERIC(14,4)`: 10 dígitos inteiros.
pub const MONEY_LIMIT: i64 = 10_000_000_000;

// 10.50000 é aceito; 10.00005 não (o banco arredondaria em silêncio)
fn fits_storage_scale(value: &Decimal) -> bool {
    value.normalize().scale() <= STORAGE_SCALE
}

/// Valor monetário gravável sem arredondamento nem estouro da coluna.
pub fn money(value: &Decimal) -> Result<(), ValidationError> {
    if !fits_storage_scale(value) {
        return Err(ValidationError::new("money_scale").with_message("must have at most 4 decimal places".into()));
    }
    if value.abs() >= Decimal::from(MONEY_LIMIT) {
        return Err(ValidationError::new("money_range").with_message("must be below 10000000000".into()));
    }
    Ok(())
}

pub fn positive_money(value: &Decimal) -> Result<(), ValidationError> {
    money(value)?;
    if *value > Decimal::ZERO {
        return Ok(());
    }
    Err(ValidationError::new("positive").with_message("must be greater than zero".into()))
}

pub fn non_negative_money(value: &Decimal) -> Result<(), ValidationError> {
    money(value)?;
    if *value >= Decimal::ZERO {
        return Ok(());
    }
    Err(ValidationError::new("non_negative").with_message("must not be negative".into()))
}

pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if !fits_storage_scale(value) {
        return Err(ValidationError::new("percentage_scale").with_message("must have at most 4 decimal places".into()));
    }
    if *value >= Decimal::ZERO && *value <= Decimal::ONE_HUNDRED {
        return Ok(());
    }
    Err(ValidationError::new("percentage").with_message("must be between 0 and 100".into()))
}
