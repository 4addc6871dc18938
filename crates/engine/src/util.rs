//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;

use crate::{CurrencyCode, EngineError, ResultEngine};

/// Parse a currency code stored in the DB into a strongly typed `CurrencyCode`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<CurrencyCode> {
    CurrencyCode::try_from(value)
        .map_err(|_| EngineError::Validation(format!("invalid stored currency: {value}")))
}

/// Trim a required name and reject it when empty.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.nfc().collect())
}

/// NFKC-fold and lowercase free text so visually equal inputs compare equal.
pub(crate) fn fold_text(value: &str) -> String {
    value.nfkc().collect::<String>().to_lowercase()
}
