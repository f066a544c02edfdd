//! Business rules for pickup points, receptions and products.
//!
//! This crate provides:
//! - [`PvzService`]: pickup-point registration against the city allow-list
//!   and filtered listing
//! - [`ReceptionService`]: opening and closing receptions, one open at a
//!   time per pickup point
//! - [`ProductService`]: LIFO product logging against the open reception
//!
//! Every mutation is gated on the caller's [`Role`](common::Role).

pub mod error;
pub mod product;
pub mod pvz;
pub mod reception;

pub use error::{DomainError, ErrorKind};
pub use product::ProductService;
pub use pvz::PvzService;
pub use reception::ReceptionService;
