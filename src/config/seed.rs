//! Database seeding from config.toml
//!
//! Seeding only adds what is missing, so it is safe to run on every start:
//! existing rooms and an already stored default rate are left alone.

use crate::{
    config::app::Config,
    core::{
        period::Period,
        room::{RoomInput, RoomSeed, create_room, get_room_by_number},
        settings::{self, DEFAULT_RATE_KEY},
    },
    entities::RoomStatus,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, instrument};

/// What a seeding run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Whether the configured default rate was stored
    pub rate_stored: bool,
    /// Numbers of the rooms that were created
    pub rooms_created: Vec<i32>,
    /// Opening bills created for occupied rooms
    pub bills_created: usize,
}

/// Seeds settings and rooms from `config`.
///
/// Occupied rooms get an opening bill for the current period with no usage,
/// priced at the effective default rate.
#[instrument(skip_all)]
pub async fn seed_database(db: &DatabaseConnection, config: &Config) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    match settings::get_setting(db, DEFAULT_RATE_KEY).await {
        Ok(existing) => debug!(value = %existing.value, "Default rate already stored"),
        Err(Error::NotFound { .. }) => {
            settings::upsert_setting(
                db,
                DEFAULT_RATE_KEY,
                &config.billing.default_rate_per_unit.to_string(),
            )
            .await?;
            summary.rate_stored = true;
        }
        Err(e) => return Err(e),
    }

    let rate = settings::default_rate(db, config.billing.default_rate_per_unit).await?;
    let period = Period::current();

    for room_config in &config.rooms {
        if get_room_by_number(db, room_config.number).await?.is_some() {
            debug!(number = room_config.number, "Room already exists, skipping");
            continue;
        }

        let seed = (room_config.status == RoomStatus::Occupied).then_some(RoomSeed {
            period,
            opening_units: room_config.opening_units,
            rate_per_unit: rate,
        });

        let created = create_room(
            db,
            RoomInput {
                number: Some(room_config.number),
                tenant_name: room_config.tenant_name.clone(),
                rent: Some(room_config.rent),
                status: Some(room_config.status),
            },
            seed,
        )
        .await?;

        summary.rooms_created.push(created.room.number);
        if created.seed_bill.is_some() {
            summary.bills_created += 1;
        }
    }

    info!(
        rooms = summary.rooms_created.len(),
        bills = summary.bills_created,
        rate_stored = summary.rate_stored,
        "Seeded database"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::app::{BillingConfig, RoomConfig},
        core::{
            bill::{BillFilter, list_bills},
            room::list_rooms,
        },
        test_utils::*,
    };
    use rust_decimal_macros::dec;

    fn sample_config() -> Config {
        Config {
            billing: BillingConfig {
                default_rate_per_unit: dec!(6),
                ..Default::default()
            },
            rooms: vec![
                RoomConfig {
                    number: 101,
                    tenant_name: Some("John Doe".to_string()),
                    rent: dec!(5000),
                    status: RoomStatus::Occupied,
                    opening_units: 50,
                },
                RoomConfig {
                    number: 104,
                    tenant_name: None,
                    rent: dec!(4500),
                    status: RoomStatus::Vacant,
                    opening_units: 0,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_seed_creates_rooms_and_opening_bills() -> Result<()> {
        let db = setup_test_db().await?;

        let summary = seed_database(&db, &sample_config()).await?;

        assert!(summary.rate_stored);
        assert_eq!(summary.rooms_created, vec![101, 104]);
        assert_eq!(summary.bills_created, 1);

        let bills = list_bills(&db, BillFilter::default()).await?;
        assert_eq!(bills.len(), 1);
        let opening = &bills[0].bill;
        assert_eq!(bills[0].room.number, 101);
        assert_eq!(opening.period, Period::current().token());
        assert_eq!(opening.prev_units, 50);
        assert_eq!(opening.curr_units, 50);
        assert_eq!(opening.rate_per_unit, dec!(6));
        assert_eq!(opening.total, dec!(5000));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() -> Result<()> {
        let db = setup_test_db().await?;
        seed_database(&db, &sample_config()).await?;

        let second = seed_database(&db, &sample_config()).await?;

        assert_eq!(second, SeedSummary::default());
        assert_eq!(list_rooms(&db, None).await?.len(), 2);
        assert_eq!(list_bills(&db, BillFilter::default()).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_keeps_stored_rate() -> Result<()> {
        let db = setup_test_db().await?;
        settings::upsert_setting(&db, DEFAULT_RATE_KEY, "8").await?;

        let summary = seed_database(&db, &sample_config()).await?;

        assert!(!summary.rate_stored);
        assert_eq!(settings::default_rate(&db, dec!(5)).await?, dec!(8));
        let bills = list_bills(&db, BillFilter::default()).await?;
        assert_eq!(bills[0].bill.rate_per_unit, dec!(8));

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_skips_existing_room() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_room(&db, 101).await?;

        let summary = seed_database(&db, &sample_config()).await?;

        assert_eq!(summary.rooms_created, vec![104]);
        assert_eq!(summary.bills_created, 0);

        Ok(())
    }
}
