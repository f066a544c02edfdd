//! Storage gateway for pickup points, receptions and products.
//!
//! The store traits in [`store`] are the only way the service layer touches
//! persistence. Two implementations are provided: [`InMemoryStore`] for tests
//! and local runs, and [`PostgresStore`] for production.

pub mod clock;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StorageError};
pub use memory::InMemoryStore;
pub use model::{Product, Pvz, Reception, ReceptionStatus};
pub use postgres::PostgresStore;
pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Pagination, PvzQuery};
pub use store::{ProductStore, PvzStore, ReceptionStore, Storage};
