//! Core billing logic, independent of any user interface.
//!
//! Pure calculations ([`derivation`], [`rollover`], [`period`]) are kept apart
//! from the services that load and store data ([`bill`], [`room`],
//! [`settings`], [`monthly`], [`dashboard`]).

/// Bill creation, updates and queries
pub mod bill;
/// Dashboard rollups for a billing period
pub mod dashboard;
/// Bill derivation engine
pub mod derivation;
/// Storing monthly rollovers
pub mod monthly;
/// Billing period tokens
pub mod period;
/// Rollover planning
pub mod rollover;
/// Room management
pub mod room;
/// Key/value settings such as the default rate
pub mod settings;
