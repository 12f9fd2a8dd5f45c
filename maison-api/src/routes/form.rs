//! Form field helpers shared by the handlers

use maison_shared::models::{numeric_max, room::Room};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use sqlx::PgPool;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Deserializes an optional form field, treating a blank value as absent
///
/// HTML forms submit untouched inputs and `<select>` placeholders as empty
/// strings.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;

    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parses a closed-choice field (role, priority, ...) into a validation error
pub fn parse_choice<T>(raw: &str) -> ApiResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse::<T>().map_err(|e| ApiError::Validation(e.to_string()))
}

/// Trimmed, non-empty text of at most `max` characters
pub fn required_text(raw: &str, field: &str, max: usize) -> ApiResult<String> {
    let value = raw.trim();

    if value.is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }

    Ok(value.to_string())
}

/// An amount or quantity rounded to cents and within `NUMERIC(10, 2)`
///
/// Zero passes only when `allow_zero`.
pub fn decimal_field(value: Decimal, field: &str, allow_zero: bool) -> ApiResult<Decimal> {
    let value = value.round_dp(2);

    if value.is_sign_negative() && !value.is_zero() {
        return Err(ApiError::Validation(format!("{} cannot be negative", field)));
    }
    if value.is_zero() && !allow_zero {
        return Err(ApiError::Validation(format!("{} must be positive", field)));
    }
    if value > numeric_max() {
        return Err(ApiError::Validation(format!(
            "{} must be at most {}",
            field,
            numeric_max()
        )));
    }

    Ok(value)
}

/// Checks that an optional room belongs to the household
pub async fn room_in_household(
    db: &PgPool,
    room_id: Option<Uuid>,
    household_id: Uuid,
) -> ApiResult<Option<Uuid>> {
    let Some(room_id) = room_id else {
        return Ok(None);
    };

    Room::find_in_household(db, room_id, household_id)
        .await?
        .map(|room| Some(room.id))
        .ok_or_else(|| ApiError::Validation("This room is not part of your household".to_string()))
}
