//! Room entity - A rentable unit identified by its room number.
//!
//! Each room carries its monthly base rent and occupancy status, and owns the
//! bills issued for it (one per billing period).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Occupancy status of a room. Only occupied rooms take part in rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum RoomStatus {
    /// A tenant lives here and is billed monthly
    #[sea_orm(string_value = "Occupied")]
    Occupied,
    /// Nobody is billed for this room
    #[sea_orm(string_value = "Vacant")]
    Vacant,
}

/// Room database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    /// Surrogate identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Operator-facing room number (e.g. 101), unique across rooms
    #[sea_orm(unique)]
    pub number: i32,
    /// Current tenant, if any
    pub tenant_name: Option<String>,
    /// Monthly base charge
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub rent: Decimal,
    /// Occupied or vacant
    pub status: RoomStatus,
    /// When the room was created
    pub created_at: DateTime,
    /// When the room was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Room and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One room has many bills
    #[sea_orm(has_many = "super::bill::Entity")]
    Bills,
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
