//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod bill;
pub mod room;
pub mod setting;

// Re-export specific types to avoid conflicts
pub use bill::{Column as BillColumn, Entity as Bill, Model as BillModel};
pub use room::{Column as RoomColumn, Entity as Room, Model as RoomModel, RoomStatus};
pub use setting::{Column as SettingColumn, Entity as Setting, Model as SettingModel};
