//! Product ledger: logging and un-logging products against the open
//! reception.

use common::{PvzId, ReceptionId, Role};
use storage::{Product, ProductStore, Reception, ReceptionStore, StorageError};

use crate::error::{DomainError, ensure_role, rejected};
use crate::reception::ReceptionService;

/// Appends products to, and removes them from, a pickup point's open
/// reception.
///
/// The target reception is resolved on every call through
/// [`ReceptionService::current_open_reception`]; the store then re-checks
/// that it is still open inside the same atomic unit as the mutation.
pub struct ProductService<S>
where
    S: ReceptionStore + ProductStore,
{
    store: S,
    receptions: ReceptionService<S>,
}

impl<S> ProductService<S>
where
    S: ReceptionStore + ProductStore + Clone,
{
    pub fn new(store: S) -> Self {
        let receptions = ReceptionService::new(store.clone());
        Self { store, receptions }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Logs a product against the open reception.
    #[tracing::instrument(skip(self))]
    pub async fn add_product(
        &self,
        pvz_id: PvzId,
        product_type: &str,
        role: Role,
    ) -> Result<Product, DomainError> {
        ensure_role(role, Role::Employee, "add products")?;
        let reception = self.active_reception(pvz_id).await?;

        let product = self
            .store
            .append_product(reception.id, product_type)
            .await
            .map_err(|e| rejected(closed_as_inactive(e, pvz_id)))?;

        metrics::counter!("products_added_total").increment(1);
        tracing::info!(%pvz_id, reception_id = %reception.id, product_id = %product.id, "product added");
        Ok(product)
    }

    /// Removes the most recently logged product of the open reception.
    #[tracing::instrument(skip(self))]
    pub async fn delete_last_product(
        &self,
        pvz_id: PvzId,
        role: Role,
    ) -> Result<Product, DomainError> {
        ensure_role(role, Role::Employee, "delete products")?;
        let reception = self.active_reception(pvz_id).await?;

        let product = self
            .store
            .remove_last_product(reception.id)
            .await
            .map_err(|e| rejected(closed_as_inactive(e, pvz_id)))?
            .ok_or_else(|| rejected(DomainError::NothingToRemove(reception.id)))?;

        metrics::counter!("products_removed_total").increment(1);
        tracing::info!(%pvz_id, reception_id = %reception.id, product_id = %product.id, "product removed");
        Ok(product)
    }

    /// Lists a reception's products oldest first.
    pub async fn list_products(&self, reception_id: ReceptionId) -> Result<Vec<Product>, DomainError> {
        self.store
            .list_products(reception_id)
            .await
            .map_err(|e| rejected(e.into()))
    }

    async fn active_reception(&self, pvz_id: PvzId) -> Result<Reception, DomainError> {
        self.receptions
            .current_open_reception(pvz_id)
            .await?
            .ok_or_else(|| rejected(DomainError::NoActiveReception(pvz_id)))
    }
}

/// A reception closed between lookup and mutation reads as "no active
/// reception" to the caller.
fn closed_as_inactive(e: StorageError, pvz_id: PvzId) -> DomainError {
    match e {
        StorageError::ReceptionClosed(_) => DomainError::NoActiveReception(pvz_id),
        other => other.into(),
    }
}
