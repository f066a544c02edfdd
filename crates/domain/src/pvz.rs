//! Pickup-point directory: registration and listing.

use chrono::{DateTime, Utc};
use common::{City, Role};
use storage::{Pagination, Pvz, PvzQuery, PvzStore};

use crate::error::{DomainError, ensure_role, rejected};

/// Registers pickup points and lists them.
pub struct PvzService<S: PvzStore> {
    store: S,
}

impl<S: PvzStore> PvzService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a pickup point in an allowed city.
    ///
    /// Only moderators may register pickup points.
    #[tracing::instrument(skip(self))]
    pub async fn create_pvz(&self, city: &str, role: Role) -> Result<Pvz, DomainError> {
        ensure_role(role, Role::Moderator, "create a pickup point")?;

        let city: City = city
            .parse()
            .map_err(|e: common::CityNotAllowed| rejected(DomainError::CityNotAllowed(e.0)))?;

        let pvz = self
            .store
            .create_pvz(city)
            .await
            .map_err(|e| rejected(e.into()))?;

        metrics::counter!("pvz_created_total").increment(1);
        tracing::info!(pvz_id = %pvz.id, %city, "pickup point registered");
        Ok(pvz)
    }

    /// Lists pickup points newest first.
    ///
    /// `page` below 1 is treated as 1 and `page_size` outside `1..=30` as 10.
    /// With either bound set, only pickup points that had a reception inside
    /// the window are returned.
    #[tracing::instrument(skip(self))]
    pub async fn list_pvz(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        page: i64,
        page_size: i64,
    ) -> Result<Vec<Pvz>, DomainError> {
        let query = PvzQuery::new()
            .between(from, to)
            .paginate(Pagination::clamped(page, page_size));

        self.store
            .list_pvz(query)
            .await
            .map_err(|e| rejected(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use storage::{InMemoryStore, ManualClock};

    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn employee_cannot_create_pvz() {
        let service = PvzService::new(InMemoryStore::new());

        let err = service.create_pvz("Moscow", Role::Employee).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn moderator_creates_pvz_in_allowed_city() {
        let service = PvzService::new(InMemoryStore::new());

        let pvz = service.create_pvz("Moscow", Role::Moderator).await.unwrap();
        assert_eq!(pvz.city, City::Moscow);

        let pvz = service.create_pvz("Казань", Role::Moderator).await.unwrap();
        assert_eq!(pvz.city, City::Kazan);
    }

    #[tokio::test]
    async fn city_outside_allow_list_is_rejected() {
        let service = PvzService::new(InMemoryStore::new());

        let err = service
            .create_pvz("Novosibirsk", Role::Moderator)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::CityNotAllowed(ref c) if c == "Novosibirsk"));
    }

    #[tokio::test]
    async fn role_is_checked_before_city() {
        let service = PvzService::new(InMemoryStore::new());

        let err = service
            .create_pvz("Novosibirsk", Role::Employee)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn list_is_paged_newest_first_and_repeatable() {
        let clock = ManualClock::new(Utc::now());
        let service = PvzService::new(InMemoryStore::with_clock(Arc::new(clock.clone())));

        for _ in 0..12 {
            service.create_pvz("Moscow", Role::Moderator).await.unwrap();
            clock.advance(Duration::seconds(1));
        }

        let first = service.list_pvz(None, None, 1, 10).await.unwrap();
        assert_eq!(first.len(), 10);
        assert!(
            first
                .windows(2)
                .all(|w| w[0].registration_date >= w[1].registration_date)
        );

        let again = service.list_pvz(None, None, 1, 10).await.unwrap();
        assert_eq!(first, again);

        let second = service.list_pvz(None, None, 2, 10).await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn out_of_range_paging_is_clamped() {
        let service = PvzService::new(InMemoryStore::new());
        for _ in 0..12 {
            service.create_pvz("Kazan", Role::Moderator).await.unwrap();
        }

        let clamped = service.list_pvz(None, None, 0, 100).await.unwrap();
        assert_eq!(clamped.len(), 10);

        let default = service.list_pvz(None, None, 1, 10).await.unwrap();
        assert_eq!(clamped, default);
    }
}
