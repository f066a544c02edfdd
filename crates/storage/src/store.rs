use async_trait::async_trait;
use common::{City, PvzId, ReceptionId};

use crate::{Product, Pvz, PvzQuery, Reception, Result};

/// Persistence of pickup points.
#[async_trait]
pub trait PvzStore: Send + Sync {
    /// Registers a pickup point, assigning its id and registration time.
    async fn create_pvz(&self, city: City) -> Result<Pvz>;

    /// Lists pickup points newest-registered first.
    ///
    /// See [`PvzQuery`] for how reception bounds filter the result.
    async fn list_pvz(&self, query: PvzQuery) -> Result<Vec<Pvz>>;
}

/// Persistence of receptions.
///
/// Implementations own the "at most one open reception per pickup point"
/// invariant: the existence check and the insert in `create_reception` must
/// be a single atomic unit.
#[async_trait]
pub trait ReceptionStore: Send + Sync {
    /// Opens a new reception.
    ///
    /// Fails with `PvzNotFound` for an unknown pickup point and with
    /// `OpenReceptionExists` if one is already open.
    async fn create_reception(&self, pvz_id: PvzId) -> Result<Reception>;

    /// Returns the open reception of a pickup point, if any.
    async fn get_open_reception(&self, pvz_id: PvzId) -> Result<Option<Reception>>;

    /// Atomically closes the most recent open reception and returns it.
    ///
    /// Returns None if nothing is open.
    async fn close_open_reception(&self, pvz_id: PvzId) -> Result<Option<Reception>>;
}

/// Persistence of products.
///
/// Mutations re-check inside the same atomic unit that the reception is
/// still open and fail with `ReceptionClosed` otherwise.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Appends a product to an open reception.
    async fn append_product(&self, reception_id: ReceptionId, product_type: &str)
    -> Result<Product>;

    /// Atomically removes the most recently added product of an open
    /// reception and returns it.
    ///
    /// Returns None if the reception has no products.
    async fn remove_last_product(&self, reception_id: ReceptionId) -> Result<Option<Product>>;

    /// Lists a reception's products oldest first.
    async fn list_products(&self, reception_id: ReceptionId) -> Result<Vec<Product>>;
}

/// The full set of store capabilities.
pub trait Storage: PvzStore + ReceptionStore + ProductStore {}

impl<T: PvzStore + ReceptionStore + ProductStore + ?Sized> Storage for T {}
