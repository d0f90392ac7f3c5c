//! Rollover engine - opens a new billing period for every occupied room.
//!
//! Planning is pure: callers hand over the rooms, each room's latest earlier
//! bill and the set of rooms already billed for the target period, and get
//! back one decision per room. Persisting the plan is `core::monthly`'s job.

use crate::{
    core::{bill::NewBill, period::Period},
    entities::{RoomStatus, bill, room},
};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// What the rollover should do for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolloverAction {
    /// Open this bill for the room
    Create(NewBill),
    /// The room already has a bill for the period
    Skip,
}

/// A planned decision for one occupied room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRoom {
    /// Room the decision applies to
    pub room_id: i64,
    /// Operator-facing room number
    pub room_number: i32,
    /// Decision for this room
    pub action: RolloverAction,
}

/// Outcome of one room after the plan was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomOutcome {
    /// A new bill was stored
    Created(bill::Model),
    /// A bill for the period already existed and was left untouched
    Skipped,
    /// Storing this room's bill failed; other rooms were still processed
    Failed(String),
}

/// Per-room line of a [`RolloverReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRollover {
    /// Room the outcome applies to
    pub room_id: i64,
    /// Operator-facing room number
    pub room_number: i32,
    /// What happened
    pub outcome: RoomOutcome,
}

/// Result of generating a billing period, one entry per occupied room in
/// room-number order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverReport {
    /// Period that was generated
    pub period: Period,
    /// Outcome for each occupied room
    pub rooms: Vec<RoomRollover>,
}

impl RolloverReport {
    /// Bills opened by this run.
    pub fn created_bills(&self) -> impl Iterator<Item = &bill::Model> {
        self.rooms.iter().filter_map(|r| match &r.outcome {
            RoomOutcome::Created(bill) => Some(bill),
            _ => None,
        })
    }

    /// Number of bills opened.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.created_bills().count()
    }

    /// Numbers of rooms that already had a bill for the period.
    #[must_use]
    pub fn skipped_room_numbers(&self) -> Vec<i32> {
        self.rooms
            .iter()
            .filter(|r| r.outcome == RoomOutcome::Skipped)
            .map(|r| r.room_number)
            .collect()
    }

    /// Number of rooms skipped.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped_room_numbers().len()
    }

    /// Rooms whose bill could not be stored, with the reason.
    #[must_use]
    pub fn failures(&self) -> Vec<(i32, &str)> {
        self.rooms
            .iter()
            .filter_map(|r| match &r.outcome {
                RoomOutcome::Failed(reason) => Some((r.room_number, reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Number of rooms that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().len()
    }

    /// One-line operator message summarising the run.
    #[must_use]
    pub fn message(&self) -> String {
        let mut message = format!(
            "Created {} new bills for {}.",
            self.created_count(),
            self.period
        );

        let skipped = self.skipped_room_numbers();
        if !skipped.is_empty() {
            let list = skipped
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str(&format!(
                " Skipped {} rooms that already have bills ({list}).",
                skipped.len()
            ));
        }

        let failures = self.failures();
        if !failures.is_empty() {
            let list = failures
                .iter()
                .map(|(number, _)| number.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            message.push_str(&format!(" Failed for {} rooms ({list}).", failures.len()));
        }

        message
    }
}

/// Plans the bills to open for `period`.
///
/// * `rooms` - any rooms; vacant ones are ignored
/// * `latest_bills` - per room id, its most recent bill before `period`
/// * `already_billed` - room ids that already have a bill for `period`
/// * `default_rate` - rate for rooms with no billing history
///
/// New bills start with no usage: `prev_units` and `curr_units` both take the
/// prior bill's closing reading (0 without history), so the total equals the
/// room's current rent until a reading is entered.
#[must_use]
pub fn plan_period(
    period: Period,
    rooms: &[room::Model],
    latest_bills: &HashMap<i64, bill::Model>,
    already_billed: &HashSet<i64>,
    default_rate: Decimal,
) -> Vec<PlannedRoom> {
    let mut occupied: Vec<&room::Model> = rooms
        .iter()
        .filter(|r| r.status == RoomStatus::Occupied)
        .collect();
    occupied.sort_by_key(|r| r.number);

    occupied
        .into_iter()
        .map(|room| {
            let action = if already_billed.contains(&room.id) {
                RolloverAction::Skip
            } else {
                let prior = latest_bills.get(&room.id);
                let opening_units = prior.map_or(0, |b| b.curr_units);
                let rate = prior.map_or(default_rate, |b| b.rate_per_unit);
                RolloverAction::Create(NewBill::new(
                    room.id,
                    period,
                    opening_units,
                    opening_units,
                    rate,
                    room.rent,
                ))
            };

            PlannedRoom {
                room_id: room.id,
                room_number: room.number,
                action,
            }
        })
        .collect()
}
