//! Monthly rollover business logic
//!
//! Opens a billing period for every occupied room. The data the rollover
//! engine needs (rooms, their latest earlier bills, rooms already billed) is
//! loaded here and handed to [`rollover::plan_period`]; the resulting plan is
//! then stored room by room.
//!
//! Storage is best effort per room: a failure is recorded in the report as
//! [`RoomOutcome::Failed`] and the remaining rooms are still attempted.
//! Running the same period twice is a no-op the second time.

use crate::{
    core::{
        period::Period,
        room::{latest_bills_before, list_rooms},
        rollover::{self, RolloverAction, RolloverReport, RoomOutcome, RoomRollover},
        settings,
    },
    entities::{Bill, RoomStatus, bill},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::prelude::*;
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};

/// Generates bills for `period` for every occupied room that lacks one.
///
/// `default_rate` prices rooms with no earlier bill; callers usually obtain it
/// from [`settings::default_rate`].
#[instrument(skip(db, period), fields(period = %period))]
pub async fn generate_period<C>(
    db: &C,
    period: Period,
    default_rate: Decimal,
) -> Result<RolloverReport>
where
    C: ConnectionTrait,
{
    let rooms = list_rooms(db, Some(RoomStatus::Occupied)).await?;
    let latest = latest_bills_before(db, Some(period)).await?;
    let already_billed: HashSet<i64> = Bill::find()
        .filter(bill::Column::Period.eq(period.token()))
        .all(db)
        .await?
        .into_iter()
        .map(|b| b.room_id)
        .collect();

    let plan = rollover::plan_period(period, &rooms, &latest, &already_billed, default_rate);

    let mut outcomes = Vec::with_capacity(plan.len());
    for planned in plan {
        let outcome = match planned.action {
            RolloverAction::Skip => RoomOutcome::Skipped,
            RolloverAction::Create(new_bill) => match new_bill.insert(db).await {
                Ok(bill) => RoomOutcome::Created(bill),
                Err(Error::Conflict { message }) => {
                    // Someone else opened the bill between planning and insert
                    warn!(room = planned.room_number, %message, "Bill appeared during rollover");
                    RoomOutcome::Skipped
                }
                Err(e) => {
                    error!(room = planned.room_number, error = %e, "Failed to open bill");
                    RoomOutcome::Failed(e.to_string())
                }
            },
        };

        outcomes.push(RoomRollover {
            room_id: planned.room_id,
            room_number: planned.room_number,
            outcome,
        });
    }

    let report = RolloverReport {
        period,
        rooms: outcomes,
    };
    info!(
        created = report.created_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "{}",
        report.message()
    );
    Ok(report)
}

/// Generates the current calendar period using the stored default rate, or
/// `fallback_rate` when none is stored.
pub async fn generate_current_period<C>(db: &C, fallback_rate: Decimal) -> Result<RolloverReport>
where
    C: ConnectionTrait,
{
    let default_rate = settings::default_rate(db, fallback_rate).await?;
    generate_period(db, Period::current(), default_rate).await
}

/// Formats a rollover report into a human-readable summary, one line per room.
#[must_use]
pub fn format_rollover_summary(report: &RolloverReport) -> String {
    use std::fmt::Write;

    let mut summary = format!("Rollover - {}\n  {}\n\n", report.period, report.message());

    for room in &report.rooms {
        let _ = match &room.outcome {
            RoomOutcome::Created(bill) => writeln!(
                summary,
                "  Room {} - Created | opening reading {} | rate {:.2} | total {:.2}",
                room.room_number, bill.prev_units, bill.rate_per_unit, bill.total
            ),
            RoomOutcome::Skipped => {
                writeln!(summary, "  Room {} - Skipped (already billed)", room.room_number)
            }
            RoomOutcome::Failed(reason) => {
                writeln!(summary, "  Room {} - Failed: {reason}", room.room_number)
            }
        };
    }

    summary
}
