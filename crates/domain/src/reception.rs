//! Reception lifecycle: opening and closing receptions.
//!
//! Per pickup point the lifecycle is
//!
//! ```text
//! NoOpenReception ──create──► Open ──close──► NoOpenReception
//! ```
//!
//! Closed receptions stay in the store as history.

use common::{PvzId, Role};
use storage::{Reception, ReceptionStore};

use crate::error::{DomainError, ensure_role, rejected};

/// Opens and closes receptions.
pub struct ReceptionService<S: ReceptionStore> {
    store: S,
}

impl<S: ReceptionStore> ReceptionService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a reception for a pickup point.
    ///
    /// The open-reception check here is a fast path; the store's own guard
    /// decides races between concurrent callers.
    #[tracing::instrument(skip(self))]
    pub async fn create_reception(
        &self,
        pvz_id: PvzId,
        role: Role,
    ) -> Result<Reception, DomainError> {
        ensure_role(role, Role::Employee, "open a reception")?;

        if self.current_open_reception(pvz_id).await?.is_some() {
            return Err(rejected(DomainError::ReceptionAlreadyOpen(pvz_id)));
        }

        let reception = self
            .store
            .create_reception(pvz_id)
            .await
            .map_err(|e| rejected(e.into()))?;

        metrics::counter!("receptions_opened_total").increment(1);
        tracing::info!(%pvz_id, reception_id = %reception.id, "reception opened");
        Ok(reception)
    }

    /// Closes the open reception of a pickup point.
    #[tracing::instrument(skip(self))]
    pub async fn close_last_reception(
        &self,
        pvz_id: PvzId,
        role: Role,
    ) -> Result<Reception, DomainError> {
        ensure_role(role, Role::Employee, "close a reception")?;

        let reception = self
            .store
            .close_open_reception(pvz_id)
            .await
            .map_err(|e| rejected(e.into()))?
            .ok_or_else(|| rejected(DomainError::NoReceptionToClose(pvz_id)))?;

        metrics::counter!("receptions_closed_total").increment(1);
        tracing::info!(%pvz_id, reception_id = %reception.id, "reception closed");
        Ok(reception)
    }

    /// Returns the open reception of a pickup point, if any.
    pub async fn current_open_reception(
        &self,
        pvz_id: PvzId,
    ) -> Result<Option<Reception>, DomainError> {
        self.store
            .get_open_reception(pvz_id)
            .await
            .map_err(|e| rejected(e.into()))
    }
}
