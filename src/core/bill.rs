//! Bill business logic - Handles all bill-related operations.
//!
//! Every write keeps the derived fields (`units_used`, `electricity_amt`,
//! `total`) consistent with the inputs in the same statement. Only the meter
//! reading, the rate and the paid flag can change after a bill is opened; the
//! rent snapshot and the opening reading are fixed.

use crate::{
    core::{
        derivation::{BillFigures, derive_bill, ensure_money, reprice},
        period::Period,
    },
    entities::{Bill, Room, bill, room},
    errors::{Error, Result},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A fully validated bill that is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBill {
    /// Room the bill is for
    pub room_id: i64,
    /// Billing period
    pub period: Period,
    /// Opening meter reading
    pub prev_units: i32,
    /// Current meter reading
    pub curr_units: i32,
    /// Price per unit
    pub rate_per_unit: Decimal,
    /// Rent snapshot
    pub rent_amount: Decimal,
    /// Values derived from the fields above
    pub figures: BillFigures,
    /// Whether the bill starts out settled
    pub paid: bool,
}

impl NewBill {
    /// Builds an unpaid bill and derives its figures.
    #[must_use]
    pub fn new(
        room_id: i64,
        period: Period,
        prev_units: i32,
        curr_units: i32,
        rate_per_unit: Decimal,
        rent_amount: Decimal,
    ) -> Self {
        Self {
            room_id,
            period,
            prev_units,
            curr_units,
            rate_per_unit,
            rent_amount,
            figures: derive_bill(prev_units, curr_units, rate_per_unit, rent_amount),
            paid: false,
        }
    }

    /// Stores the bill. A clash on `(room_id, period)` comes back as [`Error::Conflict`].
    pub async fn insert<C>(self, db: &C) -> Result<bill::Model>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now().naive_utc();
        let model = bill::ActiveModel {
            room_id: Set(self.room_id),
            period: Set(self.period.token()),
            prev_units: Set(self.prev_units),
            curr_units: Set(self.curr_units),
            units_used: Set(self.figures.units_used),
            rate_per_unit: Set(self.rate_per_unit),
            rent_amount: Set(self.rent_amount),
            electricity_amt: Set(self.figures.electricity_amt),
            total: Set(self.figures.total),
            paid: Set(self.paid),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        model.insert(db).await.map_err(Into::into)
    }
}

/// Bill fields as submitted by an operator. Every field is required; missing
/// ones are reported as [`Error::Invalid`] by [`BillInput::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillInput {
    /// Room the bill is for
    pub room_id: Option<i64>,
    /// Billing period token
    pub period: Option<String>,
    /// Opening meter reading
    pub prev_units: Option<i32>,
    /// Current meter reading
    pub curr_units: Option<i32>,
    /// Price per unit
    pub rate_per_unit: Option<Decimal>,
    /// Rent charged for the period
    pub rent_amount: Option<Decimal>,
}

impl BillInput {
    /// Checks presence and ranges, and derives the bill's figures.
    pub fn validate(self) -> Result<NewBill> {
        let mut missing = Vec::new();
        if self.room_id.is_none() {
            missing.push("roomId");
        }
        if self.period.is_none() {
            missing.push("period");
        }
        if self.prev_units.is_none() {
            missing.push("prevUnits");
        }
        if self.curr_units.is_none() {
            missing.push("currUnits");
        }
        if self.rate_per_unit.is_none() {
            missing.push("ratePerUnit");
        }
        if self.rent_amount.is_none() {
            missing.push("rentAmount");
        }

        let (
            Some(room_id),
            Some(period),
            Some(prev_units),
            Some(curr_units),
            Some(rate_per_unit),
            Some(rent_amount),
        ) = (
            self.room_id,
            self.period,
            self.prev_units,
            self.curr_units,
            self.rate_per_unit,
            self.rent_amount,
        )
        else {
            return Err(Error::invalid(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let period = Period::parse(&period)?;
        ensure_amount("rentAmount", rent_amount)?;
        ensure_amount("ratePerUnit", rate_per_unit)?;
        if prev_units < 0 {
            return Err(Error::invalid(format!(
                "prevUnits cannot be negative, got {prev_units}"
            )));
        }
        ensure_reading_not_below(prev_units, curr_units)?;

        let new_bill = NewBill::new(
            room_id,
            period,
            prev_units,
            curr_units,
            rate_per_unit,
            rent_amount,
        );
        new_bill.figures.ensure_storable()?;
        Ok(new_bill)
    }
}

/// Editable bill fields. Absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPatch {
    /// New meter reading
    pub curr_units: Option<i32>,
    /// New price per unit
    pub rate_per_unit: Option<Decimal>,
    /// New paid flag
    pub paid: Option<bool>,
}

/// How a [`BillPatch`] affects the derived fields of an existing bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillRecompute {
    /// The reading changed: usage, charge and total are all re-derived,
    /// using the patched rate when one is given
    CurrUnitsChanged {
        /// Reading to store
        curr_units: i32,
        /// Rate to price the new usage with
        rate_per_unit: Decimal,
    },
    /// Only the rate changed: the stored `units_used` is re-priced as is
    RateOnlyChanged {
        /// Rate to store
        rate_per_unit: Decimal,
    },
    /// Nothing to derive (paid toggle or no-op)
    NoRecompute,
}

impl BillRecompute {
    /// Classifies `patch` against the stored bill.
    #[must_use]
    pub fn classify(existing: &bill::Model, patch: &BillPatch) -> Self {
        match (patch.curr_units, patch.rate_per_unit) {
            (Some(curr_units), rate) if curr_units != existing.curr_units => {
                Self::CurrUnitsChanged {
                    curr_units,
                    rate_per_unit: rate.unwrap_or(existing.rate_per_unit),
                }
            }
            (_, Some(rate)) if rate != existing.rate_per_unit => Self::RateOnlyChanged {
                rate_per_unit: rate,
            },
            _ => Self::NoRecompute,
        }
    }
}

/// Optional filters for [`list_bills`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BillFilter {
    /// Only bills of this period
    pub period: Option<Period>,
    /// Only bills of this room
    pub room_id: Option<i64>,
    /// Only paid (`true`) or unpaid (`false`) bills
    pub paid: Option<bool>,
}

/// A bill together with the room it belongs to, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillWithRoom {
    /// The bill
    pub bill: bill::Model,
    /// Its room
    pub room: room::Model,
}

/// Rejects negative amounts and amounts the money columns cannot hold exactly.
pub(crate) fn ensure_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::invalid(format!(
            "{field} cannot be negative, got {amount}"
        )));
    }
    ensure_money(field, amount)
}

/// Rejects a reading below the opening one (meter rollback or typo).
pub(crate) fn ensure_reading_not_below(prev_units: i32, curr_units: i32) -> Result<()> {
    if curr_units < prev_units {
        return Err(Error::invalid(format!(
            "Current reading {curr_units} is below the previous reading {prev_units}"
        )));
    }
    Ok(())
}

/// Creates a bill from operator input.
///
/// Fails with [`Error::Invalid`] for missing or out-of-range fields,
/// [`Error::NotFound`] when the room does not exist and [`Error::Conflict`]
/// when the room already has a bill for the period.
#[instrument(skip(db))]
pub async fn create_bill<C>(db: &C, input: BillInput) -> Result<bill::Model>
where
    C: ConnectionTrait,
{
    let new_bill = input.validate()?;

    let room = Room::find_by_id(new_bill.room_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Room", new_bill.room_id))?;

    if get_bill_for_room_and_period(db, room.id, new_bill.period)
        .await?
        .is_some()
    {
        return Err(Error::conflict(format!(
            "Bill for room {} and period {} already exists",
            room.number, new_bill.period
        )));
    }

    let bill = new_bill.insert(db).await?;
    info!(bill_id = bill.id, room = room.number, period = %bill.period, total = %bill.total, "Created bill");
    Ok(bill)
}

/// Applies `patch` to a bill, recomputing derived fields as classified by
/// [`BillRecompute::classify`].
#[instrument(skip(db))]
pub async fn update_bill<C>(db: &C, bill_id: i64, patch: BillPatch) -> Result<bill::Model>
where
    C: ConnectionTrait,
{
    let existing = Bill::find_by_id(bill_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Bill", bill_id))?;

    if let Some(rate) = patch.rate_per_unit {
        ensure_amount("ratePerUnit", rate)?;
    }

    let recompute = BillRecompute::classify(&existing, &patch);
    debug!(?recompute, "Classified bill patch");

    let mut active_model: bill::ActiveModel = existing.clone().into();
    match recompute {
        BillRecompute::CurrUnitsChanged {
            curr_units,
            rate_per_unit,
        } => {
            ensure_reading_not_below(existing.prev_units, curr_units)?;
            let figures = derive_bill(
                existing.prev_units,
                curr_units,
                rate_per_unit,
                existing.rent_amount,
            );
            figures.ensure_storable()?;
            active_model.curr_units = Set(curr_units);
            active_model.rate_per_unit = Set(rate_per_unit);
            set_figures(&mut active_model, figures);
        }
        BillRecompute::RateOnlyChanged { rate_per_unit } => {
            let figures = reprice(existing.units_used, rate_per_unit, existing.rent_amount);
            figures.ensure_storable()?;
            active_model.rate_per_unit = Set(rate_per_unit);
            set_figures(&mut active_model, figures);
        }
        BillRecompute::NoRecompute => {}
    }

    if let Some(paid) = patch.paid {
        active_model.paid = Set(paid);
    }
    active_model.updated_at = Set(Utc::now().naive_utc());

    let updated = active_model.update(db).await?;
    info!(bill_id, total = %updated.total, paid = updated.paid, "Updated bill");
    Ok(updated)
}

fn set_figures(active_model: &mut bill::ActiveModel, figures: BillFigures) {
    active_model.units_used = Set(figures.units_used);
    active_model.electricity_amt = Set(figures.electricity_amt);
    active_model.total = Set(figures.total);
}

/// Deletes a bill. Its room is not affected.
#[instrument(skip(db))]
pub async fn delete_bill<C>(db: &C, bill_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Bill::delete_by_id(bill_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Bill", bill_id));
    }
    info!(bill_id, "Deleted bill");
    Ok(())
}

/// Finds a bill by its id.
pub async fn get_bill_by_id<C>(db: &C, bill_id: i64) -> Result<Option<bill::Model>>
where
    C: ConnectionTrait,
{
    Bill::find_by_id(bill_id).one(db).await.map_err(Into::into)
}

/// Finds a bill by id together with its room.
pub async fn get_bill_with_room<C>(db: &C, bill_id: i64) -> Result<BillWithRoom>
where
    C: ConnectionTrait,
{
    let (bill, room) = Bill::find_by_id(bill_id)
        .find_also_related(Room)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Bill", bill_id))?;

    let room = room.ok_or_else(|| Error::not_found("Room", bill.room_id))?;
    Ok(BillWithRoom { bill, room })
}

/// Finds the bill of `room_id` for `period`, if one exists.
pub async fn get_bill_for_room_and_period<C>(
    db: &C,
    room_id: i64,
    period: Period,
) -> Result<Option<bill::Model>>
where
    C: ConnectionTrait,
{
    Bill::find()
        .filter(bill::Column::RoomId.eq(room_id))
        .filter(bill::Column::Period.eq(period.token()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists bills with their rooms, newest period first, then by room number.
pub async fn list_bills<C>(db: &C, filter: BillFilter) -> Result<Vec<BillWithRoom>>
where
    C: ConnectionTrait,
{
    let mut query = Bill::find().find_also_related(Room);
    if let Some(period) = filter.period {
        query = query.filter(bill::Column::Period.eq(period.token()));
    }
    if let Some(room_id) = filter.room_id {
        query = query.filter(bill::Column::RoomId.eq(room_id));
    }
    if let Some(paid) = filter.paid {
        query = query.filter(bill::Column::Paid.eq(paid));
    }

    query
        .order_by_desc(bill::Column::Period)
        .order_by_asc(room::Column::Number)
        .all(db)
        .await?
        .into_iter()
        .map(|(bill, room)| {
            let room = room.ok_or_else(|| Error::not_found("Room", bill.room_id))?;
            Ok(BillWithRoom { bill, room })
        })
        .collect()
}
