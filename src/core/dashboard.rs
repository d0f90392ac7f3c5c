//! Dashboard aggregation.
//!
//! Read-only rollups over rooms and bills for one billing period. The
//! arithmetic lives in [`summarize`], which takes already loaded data; the
//! async functions only fetch it.

use crate::{
    core::{
        bill::{BillFilter, BillWithRoom, list_bills},
        period::Period,
        room::list_rooms,
    },
    entities::{Bill, RoomStatus, bill, room},
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::prelude::*;
use serde::Serialize;

/// Point-in-time snapshot of occupancy and collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    /// Period the money figures refer to
    pub period: Period,
    /// All rooms
    pub total_rooms: usize,
    /// Rooms with status Occupied
    pub occupied_rooms: usize,
    /// `total_rooms - occupied_rooms`
    pub vacant_rooms: usize,
    /// Sum of totals of paid bills in the period
    pub total_collected: Decimal,
    /// Sum of totals of unpaid bills in the period
    pub pending_amount: Decimal,
    /// Every unpaid bill, any period, newest period first then by room number
    pub unpaid_bills: Vec<BillWithRoom>,
}

impl DashboardSnapshot {
    /// Share of the period's billed amount already collected, in percent.
    ///
    /// Zero when nothing has been billed for the period.
    #[must_use]
    pub fn collection_percent(&self) -> Decimal {
        let billed = self.total_collected + self.pending_amount;
        if billed.is_zero() {
            return Decimal::ZERO;
        }
        (self.total_collected / billed * Decimal::ONE_HUNDRED).round_dp(1)
    }
}

/// Builds a snapshot from loaded data.
///
/// `period_bills` must be the bills of `period`; `unpaid_bills` is passed
/// through as given.
#[must_use]
pub fn summarize(
    period: Period,
    rooms: &[room::Model],
    period_bills: &[bill::Model],
    unpaid_bills: Vec<BillWithRoom>,
) -> DashboardSnapshot {
    let total_rooms = rooms.len();
    let occupied_rooms = rooms
        .iter()
        .filter(|r| r.status == RoomStatus::Occupied)
        .count();

    let (total_collected, pending_amount) = period_bills.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(collected, pending), bill| {
            if bill.paid {
                (collected + bill.total, pending)
            } else {
                (collected, pending + bill.total)
            }
        },
    );

    DashboardSnapshot {
        period,
        total_rooms,
        occupied_rooms,
        vacant_rooms: total_rooms - occupied_rooms,
        total_collected,
        pending_amount,
        unpaid_bills,
    }
}

/// Loads the dashboard for `period`.
pub async fn dashboard_snapshot<C>(db: &C, period: Period) -> Result<DashboardSnapshot>
where
    C: ConnectionTrait,
{
    let rooms = list_rooms(db, None).await?;
    let period_bills = Bill::find()
        .filter(bill::Column::Period.eq(period.token()))
        .all(db)
        .await?;
    let unpaid = list_bills(
        db,
        BillFilter {
            paid: Some(false),
            ..Default::default()
        },
    )
    .await?;

    Ok(summarize(period, &rooms, &period_bills, unpaid))
}

/// Loads the dashboard for the current calendar period.
pub async fn current_dashboard<C>(db: &C) -> Result<DashboardSnapshot>
where
    C: ConnectionTrait,
{
    dashboard_snapshot(db, Period::current()).await
}

/// Formats a snapshot for logs and operator consoles.
#[must_use]
pub fn format_dashboard_summary(snapshot: &DashboardSnapshot) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Dashboard - {}\n  Rooms: {} total | {} occupied | {} vacant\n  Collected: {:.2} | Pending: {:.2} ({}% collected)\n",
        snapshot.period,
        snapshot.total_rooms,
        snapshot.occupied_rooms,
        snapshot.vacant_rooms,
        snapshot.total_collected,
        snapshot.pending_amount,
        snapshot.collection_percent()
    );

    if snapshot.unpaid_bills.is_empty() {
        summary.push_str("  No unpaid bills\n");
    } else {
        let _ = writeln!(summary, "  Unpaid bills ({}):", snapshot.unpaid_bills.len());
        for unpaid in &snapshot.unpaid_bills {
            let tenant = unpaid.room.tenant_name.as_deref().unwrap_or("no tenant");
            let _ = writeln!(
                summary,
                "    {} | Room {} ({tenant}) | {:.2}",
                unpaid.bill.period, unpaid.room.number, unpaid.bill.total
            );
        }
    }

    summary
}
