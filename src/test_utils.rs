//! Shared test utilities for `RentLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating rooms and bills with sensible defaults.

use crate::{
    core::{
        bill::NewBill,
        period::Period,
        room::{self, RoomInput},
    },
    entities::{self, RoomStatus},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test room with sensible defaults.
///
/// # Defaults
/// * `tenant_name`: `"Test Tenant"`
/// * `rent`: 5000
/// * `status`: Occupied
pub async fn create_test_room(
    db: &DatabaseConnection,
    number: i32,
) -> Result<entities::room::Model> {
    create_custom_room(db, number, Decimal::from(5000), RoomStatus::Occupied).await
}

/// Creates a test room with custom rent and status.
pub async fn create_custom_room(
    db: &DatabaseConnection,
    number: i32,
    rent: Decimal,
    status: RoomStatus,
) -> Result<entities::room::Model> {
    let created = room::create_room(
        db,
        RoomInput {
            number: Some(number),
            tenant_name: Some("Test Tenant".to_string()),
            rent: Some(rent),
            status: Some(status),
        },
        None,
    )
    .await?;
    Ok(created.room)
}

/// Stores a bill directly, bypassing service validation.
///
/// `period` is a `YYYY-MM` token and must be valid. Rent is fixed at 5000.
pub async fn create_test_bill(
    db: &DatabaseConnection,
    room_id: i64,
    period: &str,
    prev_units: i32,
    curr_units: i32,
    rate_per_unit: Decimal,
) -> Result<entities::bill::Model> {
    let period = Period::parse(period)?;
    NewBill::new(
        room_id,
        period,
        prev_units,
        curr_units,
        rate_per_unit,
        Decimal::from(5000),
    )
    .insert(db)
    .await
}
