//! Bill entity - One room's rent and electricity charge for one billing period.
//!
//! `units_used`, `electricity_amt` and `total` are derived from the meter
//! readings, the rate and the rent snapshot; they are stored so listings and
//! dashboards never recompute them, and every write goes through
//! `core::derivation` to keep them consistent. `(room_id, period)` is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    /// Surrogate identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Room this bill belongs to
    pub room_id: i64,
    /// Billing period token, `YYYY-MM`
    pub period: String,
    /// Meter reading carried over from the previous period
    pub prev_units: i32,
    /// Meter reading for this period
    pub curr_units: i32,
    /// `curr_units - prev_units`
    pub units_used: i32,
    /// Price of one unit of electricity
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub rate_per_unit: Decimal,
    /// Room rent copied when the bill was opened
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub rent_amount: Decimal,
    /// `units_used * rate_per_unit`
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub electricity_amt: Decimal,
    /// `rent_amount + electricity_amt`
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    /// Whether the tenant has settled this bill
    pub paid: bool,
    /// When the bill was created
    pub created_at: DateTime,
    /// When the bill was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Bill and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bill belongs to one room
    #[sea_orm(
        belongs_to = "super::room::Entity",
        from = "Column::RoomId",
        to = "super::room::Column::Id",
        on_delete = "Restrict"
    )]
    Room,
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
