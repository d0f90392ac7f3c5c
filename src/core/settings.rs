//! Settings business logic - Key/value configuration stored in the database.
//!
//! The one key the billing core depends on is [`DEFAULT_RATE_KEY`]. Its value is
//! read once per operation and passed explicitly to the code that needs it.

use crate::{
    core::bill::ensure_amount,
    entities::{Setting, setting},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Setting key holding the electricity rate for rooms without billing history.
pub const DEFAULT_RATE_KEY: &str = "default_rate_per_unit";

/// Parses a rate setting, which must be a non-negative amount with at most
/// two decimal places.
pub fn parse_rate(value: &str) -> Result<Decimal> {
    let rate = Decimal::from_str(value.trim())
        .map_err(|e| Error::invalid(format!("Rate {value:?} is not a decimal number: {e}")))?;
    ensure_amount("Rate", rate)?;
    Ok(rate)
}

/// Looks up a setting, failing with [`Error::NotFound`] if it was never set.
pub async fn get_setting<C>(db: &C, key: &str) -> Result<setting::Model>
where
    C: ConnectionTrait,
{
    find_setting(db, key)
        .await?
        .ok_or_else(|| Error::not_found("Setting", key))
}

async fn find_setting<C>(db: &C, key: &str) -> Result<Option<setting::Model>>
where
    C: ConnectionTrait,
{
    Setting::find()
        .filter(setting::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all settings ordered by key.
pub async fn list_settings<C>(db: &C) -> Result<Vec<setting::Model>>
where
    C: ConnectionTrait,
{
    Setting::find()
        .order_by_asc(setting::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates or replaces a setting.
///
/// Values for [`DEFAULT_RATE_KEY`] must parse as a non-negative decimal.
#[instrument(skip(db))]
pub async fn upsert_setting<C>(db: &C, key: &str, value: &str) -> Result<setting::Model>
where
    C: ConnectionTrait,
{
    if key.trim().is_empty() {
        return Err(Error::invalid("Setting key cannot be empty"));
    }
    if key == DEFAULT_RATE_KEY {
        parse_rate(value)?;
    }

    let now = Utc::now().naive_utc();
    let stored = if let Some(existing) = find_setting(db, key).await? {
        let mut active_model: setting::ActiveModel = existing.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?
    } else {
        setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?
    };

    info!(key, value, "Stored setting");
    Ok(stored)
}

/// The default electricity rate, or `fallback` when none has been stored.
///
/// A stored value that is not a valid rate is an error rather than silently
/// replaced by the fallback.
pub async fn default_rate<C>(db: &C, fallback: Decimal) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    match find_setting(db, DEFAULT_RATE_KEY).await? {
        Some(setting) => parse_rate(&setting.value),
        None => {
            debug!(%fallback, "No stored default rate, using fallback");
            Ok(fallback)
        }
    }
}
