use axum::http::StatusCode;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::constants::*;
use crate::models::{TransactionForm, TransactionValues};

pub fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err(bad_request(format!("{} cannot be empty", field_name)));
    }
    if value.len() > max_length {
        return Err(bad_request(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

/// Parses a user-entered amount; only finite numbers above zero pass.
pub fn parse_positive_amount(input: &str) -> Result<f64, (StatusCode, String)> {
    match input.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(bad_request(ERR_INVALID_AMOUNT)),
    }
}

pub fn validate_positive_amount(amount: f64) -> Result<(), (StatusCode, String)> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(bad_request(ERR_INVALID_AMOUNT));
    }
    Ok(())
}

/// Blank or unreadable prices count as zero. Negative prices are refused.
pub fn parse_price(input: &str, field_name: &str) -> Result<f64, (StatusCode, String)> {
    let price = input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0);
    validate_price(price, field_name)?;
    Ok(price)
}

pub fn validate_price(price: f64, field_name: &str) -> Result<(), (StatusCode, String)> {
    if !price.is_finite() || price < 0.0 {
        return Err(bad_request(format!("{} cannot be negative", field_name)));
    }
    Ok(())
}

pub fn validate_item_name(item: &str) -> Result<(), (StatusCode, String)> {
    if item.trim().is_empty() {
        return Err(bad_request(ERR_ITEM_REQUIRED));
    }
    validate_string_length(item, "Item name", MAX_ITEM_NAME_LENGTH)
}

pub fn validate_note(note: &str) -> Result<(), (StatusCode, String)> {
    if note.len() > MAX_NOTE_LENGTH {
        return Err(bad_request(format!(
            "Note must be less than {} characters",
            MAX_NOTE_LENGTH
        )));
    }
    Ok(())
}

/// Turns editor input into storable values. Item name is the only required field.
pub fn validate_transaction_form(
    form: &TransactionForm,
) -> Result<TransactionValues, (StatusCode, String)> {
    validate_item_name(&form.item)?;
    validate_note(&form.note)?;
    let rain_price = parse_price(&form.rain_price, "Rain price")?;
    let baht_price = parse_price(&form.baht_price, "Baht price")?;

    Ok(TransactionValues {
        status: form.status,
        item: form.item.trim().to_string(),
        rain_price,
        baht_price,
        note: form.note.trim().to_string(),
    })
}

pub fn validate_username(username: &str) -> Result<(), (StatusCode, String)> {
    validate_string_length(username, "Username", MAX_USERNAME_LENGTH)
}

pub fn validate_email(email: &str) -> Result<(), (StatusCode, String)> {
    let email = email.trim();
    if email.is_empty() {
        return Err(bad_request("Email cannot be empty"));
    }
    if !email.contains('@') {
        return Err(bad_request("Email is not valid"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), (StatusCode, String)> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_date(value: &str) -> Result<(), (StatusCode, String)> {
    let value = value.trim();
    if value.is_empty() {
        return Err(bad_request("Date cannot be empty"));
    }

    if OffsetDateTime::parse(value, &Rfc3339).is_ok() {
        return Ok(());
    }

    let format = time::format_description::parse("[year]-[month]-[day]")
        .map_err(|_| bad_request("Invalid date format"))?;
    time::Date::parse(value, &format).map_err(|_| bad_request("Invalid date format"))?;

    Ok(())
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string())
}

pub fn unix_timestamp_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
