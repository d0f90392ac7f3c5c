//! Database configuration module for `RentLedger`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. The one constraint entities cannot express, a single bill per room
//! and period, is added as a separate unique index.

use crate::entities::{Bill, Room, Setting, bill};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema, sea_query::Index};
use std::path::Path;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/rentledger.sqlite?mode=rwc";

/// Name of the unique index on `bills (room_id, period)`.
pub const BILL_PERIOD_INDEX: &str = "idx_bills_room_period";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file, created on first use, if no
/// environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_dir(&database_url)?;
    info!(url = %database_url, "Connecting to database");

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the directory holding a file-backed `SQLite` database.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split_once('?').map_or(path, |(file, _)| file);
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Creates all tables and indexes that do not exist yet.
///
/// Rooms are created before bills because bills reference them.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut room_table = schema.create_table_from_entity(Room);
    let mut bill_table = schema.create_table_from_entity(Bill);
    let mut setting_table = schema.create_table_from_entity(Setting);
    room_table.if_not_exists();
    bill_table.if_not_exists();
    setting_table.if_not_exists();

    db.execute(builder.build(&room_table)).await?;
    db.execute(builder.build(&bill_table)).await?;
    db.execute(builder.build(&setting_table)).await?;

    let bill_period_index = Index::create()
        .name(BILL_PERIOD_INDEX)
        .table(Bill)
        .col(bill::Column::RoomId)
        .col(bill::Column::Period)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&bill_period_index)).await?;

    Ok(())
}
