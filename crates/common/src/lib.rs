//! Shared identifiers and value types for the pickup-point service.

mod city;
mod role;
mod types;

pub use city::{City, CityNotAllowed};
pub use role::{Role, UnknownRole};
pub use types::{ProductId, PvzId, ReceptionId};
