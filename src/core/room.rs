//! Room business logic - Handles all room-related operations.
//!
//! Provides functions for creating, retrieving, updating and deleting rooms.
//! Room numbers are unique; a clash is reported as [`Error::Conflict`] both
//! when it is caught up front and when the database's unique index catches it.

use crate::{
    core::{
        bill::{NewBill, ensure_amount},
        derivation::ensure_money,
        period::Period,
    },
    entities::{Bill, Room, RoomStatus, bill, room},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// What happens to a room's bills when the room is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomDeletePolicy {
    /// Refuse to delete a room that still has bills
    #[default]
    Block,
    /// Delete the room's bills together with the room
    Cascade,
}

/// Room fields as submitted by an operator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInput {
    /// Room number, required
    pub number: Option<i32>,
    /// Tenant name; blank means none
    pub tenant_name: Option<String>,
    /// Monthly rent, required and positive
    pub rent: Option<Decimal>,
    /// Occupancy status, required
    pub status: Option<RoomStatus>,
}

/// Opening bill created together with a new room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSeed {
    /// Period of the opening bill
    pub period: Period,
    /// Meter reading when the tenant moved in
    pub opening_units: i32,
    /// Rate for the opening bill, usually the configured default
    pub rate_per_unit: Decimal,
}

/// Editable room fields. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    /// New room number
    pub number: Option<i32>,
    /// New tenant name; an empty string clears it
    pub tenant_name: Option<String>,
    /// New monthly rent
    pub rent: Option<Decimal>,
    /// New status
    pub status: Option<RoomStatus>,
}

/// A newly created room and, when seeded, its opening bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRoom {
    /// The stored room
    pub room: room::Model,
    /// Opening bill, if a seed was given
    pub seed_bill: Option<bill::Model>,
}

/// A room with its bills, newest period first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomWithBills {
    /// The room
    pub room: room::Model,
    /// Its bills, newest first
    pub bills: Vec<bill::Model>,
}

fn normalize_tenant(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

fn ensure_positive_rent(rent: Decimal) -> Result<()> {
    if rent <= Decimal::ZERO {
        return Err(Error::invalid(format!("Rent must be positive, got {rent}")));
    }
    ensure_money("rent", rent)
}

/// Creates a room, optionally opening its first bill in the same database
/// transaction.
///
/// Fails with [`Error::Invalid`] for missing fields or a non-positive rent and
/// with [`Error::Conflict`] when the room number is taken. On failure nothing
/// is stored.
#[instrument(skip(db))]
pub async fn create_room(
    db: &DatabaseConnection,
    input: RoomInput,
    seed: Option<RoomSeed>,
) -> Result<CreatedRoom> {
    let (Some(number), Some(rent), Some(status)) = (input.number, input.rent, input.status) else {
        return Err(Error::invalid(
            "Missing required fields: number, rent and status are required",
        ));
    };
    ensure_positive_rent(rent)?;
    if let Some(seed) = &seed {
        if seed.opening_units < 0 {
            return Err(Error::invalid("Opening meter reading cannot be negative"));
        }
        ensure_amount("ratePerUnit", seed.rate_per_unit)?;
    }

    let txn = db.begin().await?;

    if get_room_by_number(&txn, number).await?.is_some() {
        return Err(Error::conflict(format!("Room number {number} already exists")));
    }

    let now = Utc::now().naive_utc();
    let room = room::ActiveModel {
        number: Set(number),
        tenant_name: Set(normalize_tenant(input.tenant_name)),
        rent: Set(rent),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let seed_bill = match seed {
        Some(seed) => {
            let bill = NewBill::new(
                room.id,
                seed.period,
                seed.opening_units,
                seed.opening_units,
                seed.rate_per_unit,
                room.rent,
            )
            .insert(&txn)
            .await?;
            Some(bill)
        }
        None => None,
    };

    txn.commit().await?;

    info!(room_id = room.id, number, seeded = seed_bill.is_some(), "Created room");
    Ok(CreatedRoom { room, seed_bill })
}

/// Applies `patch` to a room.
///
/// Changing the number to one used by a different room fails with
/// [`Error::Conflict`]. Rent changes do not touch existing bills; their rent is
/// a snapshot.
#[instrument(skip(db))]
pub async fn update_room<C>(db: &C, room_id: i64, patch: RoomPatch) -> Result<room::Model>
where
    C: ConnectionTrait,
{
    let existing = Room::find_by_id(room_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Room", room_id))?;

    let mut active_model: room::ActiveModel = existing.clone().into();

    if let Some(number) = patch.number {
        if number != existing.number {
            if let Some(other) = get_room_by_number(db, number).await? {
                if other.id != existing.id {
                    return Err(Error::conflict(format!("Room number {number} already exists")));
                }
            }
            active_model.number = Set(number);
        }
    }
    if let Some(rent) = patch.rent {
        ensure_positive_rent(rent)?;
        active_model.rent = Set(rent);
    }
    if let Some(status) = patch.status {
        active_model.status = Set(status);
    }
    if patch.tenant_name.is_some() {
        active_model.tenant_name = Set(normalize_tenant(patch.tenant_name));
    }
    active_model.updated_at = Set(Utc::now().naive_utc());

    let updated = active_model.update(db).await?;
    info!(room_id, number = updated.number, "Updated room");
    Ok(updated)
}

/// Deletes a room according to `policy`.
///
/// With [`RoomDeletePolicy::Block`] a room that still has bills is kept and
/// [`Error::Conflict`] is returned. With [`RoomDeletePolicy::Cascade`] the
/// bills and the room are deleted in one database transaction.
#[instrument(skip(db))]
pub async fn delete_room(
    db: &DatabaseConnection,
    room_id: i64,
    policy: RoomDeletePolicy,
) -> Result<()> {
    let txn = db.begin().await?;

    let room = Room::find_by_id(room_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Room", room_id))?;

    let bill_count = Bill::find()
        .filter(bill::Column::RoomId.eq(room_id))
        .count(&txn)
        .await?;

    if bill_count > 0 {
        match policy {
            RoomDeletePolicy::Block => {
                return Err(Error::conflict(format!(
                    "Room {} still has {bill_count} bills",
                    room.number
                )));
            }
            RoomDeletePolicy::Cascade => {
                warn!(room = room.number, bill_count, "Deleting room together with its bills");
                Bill::delete_many()
                    .filter(bill::Column::RoomId.eq(room_id))
                    .exec(&txn)
                    .await?;
            }
        }
    }

    room.delete(&txn).await?;
    txn.commit().await?;

    info!(room_id, "Deleted room");
    Ok(())
}

/// Finds a room by its id.
pub async fn get_room_by_id<C>(db: &C, room_id: i64) -> Result<Option<room::Model>>
where
    C: ConnectionTrait,
{
    Room::find_by_id(room_id).one(db).await.map_err(Into::into)
}

/// Finds a room by its number.
pub async fn get_room_by_number<C>(db: &C, number: i32) -> Result<Option<room::Model>>
where
    C: ConnectionTrait,
{
    Room::find()
        .filter(room::Column::Number.eq(number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists rooms ordered by number, optionally only those with `status`.
pub async fn list_rooms<C>(db: &C, status: Option<RoomStatus>) -> Result<Vec<room::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Room::find();
    if let Some(status) = status {
        query = query.filter(room::Column::Status.eq(status));
    }
    query
        .order_by_asc(room::Column::Number)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads a room together with all of its bills.
pub async fn get_room_with_bills<C>(db: &C, room_id: i64) -> Result<RoomWithBills>
where
    C: ConnectionTrait,
{
    let room = get_room_by_id(db, room_id)
        .await?
        .ok_or_else(|| Error::not_found("Room", room_id))?;

    let bills = room
        .find_related(Bill)
        .order_by_desc(bill::Column::Period)
        .all(db)
        .await?;

    Ok(RoomWithBills { room, bills })
}

/// Lists every room with its most recent bill, ordered by room number.
pub async fn list_rooms_with_latest_bill<C>(
    db: &C,
) -> Result<Vec<(room::Model, Option<bill::Model>)>>
where
    C: ConnectionTrait,
{
    let rooms = list_rooms(db, None).await?;
    let mut latest = latest_bills_before(db, None).await?;

    Ok(rooms
        .into_iter()
        .map(|room| {
            let bill = latest.remove(&room.id);
            (room, bill)
        })
        .collect())
}

/// Most recent bill per room, optionally only considering periods strictly
/// before `before`.
pub async fn latest_bills_before<C>(
    db: &C,
    before: Option<Period>,
) -> Result<HashMap<i64, bill::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Bill::find();
    if let Some(before) = before {
        query = query.filter(bill::Column::Period.lt(before.token()));
    }
    let bills = query.order_by_desc(bill::Column::Period).all(db).await?;

    let mut latest = HashMap::new();
    for bill in bills {
        // Ordered newest first, so the first bill seen per room wins
        latest.entry(bill.room_id).or_insert(bill);
    }
    Ok(latest)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;

    fn input(number: i32) -> RoomInput {
        RoomInput {
            number: Some(number),
            tenant_name: Some("John Doe".to_string()),
            rent: Some(dec!(5000)),
            status: Some(RoomStatus::Occupied),
        }
    }

    #[tokio::test]
    async fn test_create_room() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_room(&db, input(101), None).await?;
        assert_eq!(created.room.number, 101);
        assert_eq!(created.room.tenant_name.as_deref(), Some("John Doe"));
        assert_eq!(created.room.rent, dec!(5000));
        assert!(created.seed_bill.is_none());

        let found = get_room_by_number(&db, 101).await?.unwrap();
        assert_eq!(found, created.room);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_room_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let mut missing_rent = input(101);
        missing_rent.rent = None;
        assert!(matches!(
            create_room(&db, missing_rent, None).await,
            Err(Error::Invalid { .. })
        ));

        let mut zero_rent = input(101);
        zero_rent.rent = Some(Decimal::ZERO);
        assert!(matches!(
            create_room(&db, zero_rent, None).await,
            Err(Error::Invalid { .. })
        ));

        let mut precise_rent = input(101);
        precise_rent.rent = Some(dec!(12345678901234.56));
        assert!(matches!(
            create_room(&db, precise_rent, None).await,
            Err(Error::Invalid { .. })
        ));

        let precise_rate = RoomSeed {
            period: Period::parse("2024-03").unwrap(),
            opening_units: 0,
            rate_per_unit: dec!(0.1234567890123456789),
        };
        assert!(matches!(
            create_room(&db, input(101), Some(precise_rate)).await,
            Err(Error::Invalid { .. })
        ));

        assert!(list_rooms(&db, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_room_number_conflicts_and_persists_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        create_room(&db, input(101), None).await?;

        let mut duplicate = input(101);
        duplicate.tenant_name = Some("Jane Smith".to_string());
        let seed = RoomSeed {
            period: Period::parse("2024-03").unwrap(),
            opening_units: 10,
            rate_per_unit: dec!(5),
        };
        let result = create_room(&db, duplicate, Some(seed)).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        let rooms = list_rooms(&db, None).await?;
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].tenant_name.as_deref(), Some("John Doe"));
        assert_eq!(Bill::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_room_with_seed_bill() -> Result<()> {
        let db = setup_test_db().await?;
        let seed = RoomSeed {
            period: Period::parse("2024-03").unwrap(),
            opening_units: 75,
            rate_per_unit: dec!(5),
        };

        let created = create_room(&db, input(101), Some(seed)).await?;
        let bill = created.seed_bill.unwrap();

        assert_eq!(bill.room_id, created.room.id);
        assert_eq!(bill.period, "2024-03");
        assert_eq!(bill.prev_units, 75);
        assert_eq!(bill.curr_units, 75);
        assert_eq!(bill.units_used, 0);
        assert_eq!(bill.rent_amount, dec!(5000));
        assert_eq!(bill.total, dec!(5000));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_room_number_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let room_101 = create_room(&db, input(101), None).await?.room;
        create_room(&db, input(102), None).await?;

        let result = update_room(
            &db,
            room_101.id,
            RoomPatch {
                number: Some(102),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        // Keeping its own number is not a conflict
        let updated = update_room(
            &db,
            room_101.id,
            RoomPatch {
                number: Some(101),
                rent: Some(dec!(5300)),
                tenant_name: Some("  ".to_string()),
                status: Some(RoomStatus::Vacant),
            },
        )
        .await?;
        assert_eq!(updated.number, 101);
        assert_eq!(updated.rent, dec!(5300));
        assert!(updated.tenant_name.is_none());
        assert_eq!(updated.status, RoomStatus::Vacant);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_room_rent_keeps_bill_snapshot() -> Result<()> {
        let db = setup_test_db().await?;
        let room = create_test_room(&db, 101).await?;
        let bill = create_test_bill(&db, room.id, "2024-03", 0, 10, dec!(5)).await?;

        update_room(
            &db,
            room.id,
            RoomPatch {
                rent: Some(dec!(9000)),
                ..Default::default()
            },
        )
        .await?;

        let stored = Bill::find_by_id(bill.id).one(&db).await?.unwrap();
        assert_eq!(stored.rent_amount, dec!(5000));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_room() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_room(&db, 404, RoomPatch::default()).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Room", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_room_blocked_while_bills_exist() -> Result<()> {
        let db = setup_test_db().await?;
        let room = create_test_room(&db, 101).await?;
        create_test_bill(&db, room.id, "2024-03", 0, 10, dec!(5)).await?;

        let result = delete_room(&db, room.id, RoomDeletePolicy::Block).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        assert!(get_room_by_id(&db, room.id).await?.is_some());
        assert_eq!(Bill::find().count(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_room_without_bills_under_block_policy() -> Result<()> {
        let db = setup_test_db().await?;
        let room = create_test_room(&db, 101).await?;

        delete_room(&db, room.id, RoomDeletePolicy::Block).await?;
        assert!(get_room_by_id(&db, room.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_room_cascade_removes_bills() -> Result<()> {
        let db = setup_test_db().await?;
        let room = create_test_room(&db, 101).await?;
        let other = create_test_room(&db, 102).await?;
        create_test_bill(&db, room.id, "2024-02", 0, 10, dec!(5)).await?;
        create_test_bill(&db, room.id, "2024-03", 10, 20, dec!(5)).await?;
        create_test_bill(&db, other.id, "2024-03", 0, 10, dec!(5)).await?;

        delete_room(&db, room.id, RoomDeletePolicy::Cascade).await?;

        assert!(get_room_by_id(&db, room.id).await?.is_none());
        let remaining = Bill::find().all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].room_id, other.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_room() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_room(&db, 404, RoomDeletePolicy::Cascade).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_room_listings() -> Result<()> {
        let db = setup_test_db().await?;
        let room_102 = create_test_room(&db, 102).await?;
        let room_101 = create_test_room(&db, 101).await?;
        let mut vacant = input(103);
        vacant.status = Some(RoomStatus::Vacant);
        create_room(&db, vacant, None).await?;

        create_test_bill(&db, room_101.id, "2024-02", 0, 10, dec!(5)).await?;
        create_test_bill(&db, room_101.id, "2024-03", 10, 25, dec!(5)).await?;

        let numbers: Vec<i32> = list_rooms(&db, None).await?.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![101, 102, 103]);

        let occupied = list_rooms(&db, Some(RoomStatus::Occupied)).await?;
        assert_eq!(occupied.len(), 2);

        let with_latest = list_rooms_with_latest_bill(&db).await?;
        assert_eq!(with_latest[0].1.as_ref().unwrap().period, "2024-03");
        assert!(with_latest[1].1.is_none());
        assert_eq!(with_latest[1].0.id, room_102.id);

        let history = get_room_with_bills(&db, room_101.id).await?;
        let periods: Vec<&str> = history.bills.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(periods, vec!["2024-03", "2024-02"]);

        let before_march = latest_bills_before(&db, Some(Period::parse("2024-03").unwrap())).await?;
        assert_eq!(before_march[&room_101.id].period, "2024-02");

        Ok(())
    }
}
