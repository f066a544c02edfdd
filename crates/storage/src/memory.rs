use std::sync::Arc;

use async_trait::async_trait;
use common::{City, ProductId, PvzId, ReceptionId};
use tokio::sync::RwLock;

use crate::{
    Clock, Product, Pvz, PvzQuery, Reception, ReceptionStatus, Result, StorageError, SystemClock,
    store::{ProductStore, PvzStore, ReceptionStore},
};

/// Rows kept in insertion order.
#[derive(Default)]
struct Tables {
    pvzs: Vec<Pvz>,
    receptions: Vec<Reception>,
    products: Vec<Product>,
}

impl Tables {
    fn reception(&self, reception_id: ReceptionId) -> Result<&Reception> {
        self.receptions
            .iter()
            .find(|r| r.id == reception_id)
            .ok_or(StorageError::ReceptionNotFound(reception_id))
    }

    fn ensure_open(&self, reception_id: ReceptionId) -> Result<()> {
        if self.reception(reception_id)?.status.is_open() {
            Ok(())
        } else {
            Err(StorageError::ReceptionClosed(reception_id))
        }
    }

    fn open_reception_index(&self, pvz_id: PvzId) -> Option<usize> {
        self.receptions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pvz_id == pvz_id && r.status.is_open())
            .max_by_key(|(index, r)| (r.date_time, *index))
            .map(|(index, _)| index)
    }
}

/// In-memory store for tests and local runs.
///
/// Every mutation runs inside one write-lock section, which serializes the
/// check-then-act sequences the store contract requires to be atomic.
#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamped by the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            clock,
        }
    }

    /// Returns how many receptions of a pickup point are open.
    pub async fn open_reception_count(&self, pvz_id: PvzId) -> usize {
        self.tables
            .read()
            .await
            .receptions
            .iter()
            .filter(|r| r.pvz_id == pvz_id && r.status.is_open())
            .count()
    }

    /// Returns every reception of a pickup point in creation order.
    pub async fn receptions_of(&self, pvz_id: PvzId) -> Vec<Reception> {
        self.tables
            .read()
            .await
            .receptions
            .iter()
            .filter(|r| r.pvz_id == pvz_id)
            .cloned()
            .collect()
    }

    /// Clears all rows.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl PvzStore for InMemoryStore {
    async fn create_pvz(&self, city: City) -> Result<Pvz> {
        let pvz = Pvz {
            id: PvzId::new(),
            city,
            registration_date: self.clock.now(),
        };
        self.tables.write().await.pvzs.push(pvz.clone());
        Ok(pvz)
    }

    async fn list_pvz(&self, query: PvzQuery) -> Result<Vec<Pvz>> {
        let tables = self.tables.read().await;

        let mut matching: Vec<(usize, &Pvz)> = tables
            .pvzs
            .iter()
            .enumerate()
            .filter(|(_, pvz)| {
                !query.has_time_filter()
                    || tables
                        .receptions
                        .iter()
                        .any(|r| r.pvz_id == pvz.id && query.covers(r.date_time))
            })
            .collect();

        // Newest registration first; later insertion wins ties.
        matching.sort_by(|(ia, a), (ib, b)| {
            b.registration_date
                .cmp(&a.registration_date)
                .then(ib.cmp(ia))
        });

        let offset = usize::try_from(query.pagination.offset()).unwrap_or(usize::MAX);
        let limit = query.pagination.page_size() as usize;

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, pvz)| pvz.clone())
            .collect())
    }
}

#[async_trait]
impl ReceptionStore for InMemoryStore {
    async fn create_reception(&self, pvz_id: PvzId) -> Result<Reception> {
        let mut tables = self.tables.write().await;

        if !tables.pvzs.iter().any(|p| p.id == pvz_id) {
            return Err(StorageError::PvzNotFound(pvz_id));
        }
        if tables.open_reception_index(pvz_id).is_some() {
            return Err(StorageError::OpenReceptionExists(pvz_id));
        }

        let reception = Reception {
            id: ReceptionId::new(),
            pvz_id,
            date_time: self.clock.now(),
            status: ReceptionStatus::Open,
        };
        tables.receptions.push(reception.clone());
        Ok(reception)
    }

    async fn get_open_reception(&self, pvz_id: PvzId) -> Result<Option<Reception>> {
        let tables = self.tables.read().await;
        Ok(tables
            .open_reception_index(pvz_id)
            .map(|index| tables.receptions[index].clone()))
    }

    async fn close_open_reception(&self, pvz_id: PvzId) -> Result<Option<Reception>> {
        let mut tables = self.tables.write().await;
        let Some(index) = tables.open_reception_index(pvz_id) else {
            return Ok(None);
        };

        let reception = &mut tables.receptions[index];
        reception.status = ReceptionStatus::Closed;
        Ok(Some(reception.clone()))
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn append_product(
        &self,
        reception_id: ReceptionId,
        product_type: &str,
    ) -> Result<Product> {
        let mut tables = self.tables.write().await;
        tables.ensure_open(reception_id)?;

        let product = Product {
            id: ProductId::new(),
            product_type: product_type.to_string(),
            reception_id,
            date_time: self.clock.now(),
        };
        tables.products.push(product.clone());
        Ok(product)
    }

    async fn remove_last_product(&self, reception_id: ReceptionId) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        tables.ensure_open(reception_id)?;

        let last = tables
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.reception_id == reception_id)
            .max_by_key(|(index, p)| (p.date_time, *index))
            .map(|(index, _)| index);

        Ok(last.map(|index| tables.products.remove(index)))
    }

    async fn list_products(&self, reception_id: ReceptionId) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        tables.reception(reception_id)?;

        let mut products: Vec<(usize, &Product)> = tables
            .products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.reception_id == reception_id)
            .collect();
        products.sort_by_key(|(index, p)| (p.date_time, *index));
        Ok(products.into_iter().map(|(_, p)| p.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{ManualClock, Pagination};

    fn manual_store() -> (InMemoryStore, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (InMemoryStore::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn create_reception_for_unknown_pvz_fails() {
        let store = InMemoryStore::new();
        let pvz_id = PvzId::new();

        let result = store.create_reception(pvz_id).await;
        assert!(matches!(result, Err(StorageError::PvzNotFound(id)) if id == pvz_id));
    }

    #[tokio::test]
    async fn second_open_reception_is_rejected() {
        let store = InMemoryStore::new();
        let pvz = store.create_pvz(City::Moscow).await.unwrap();

        store.create_reception(pvz.id).await.unwrap();
        let result = store.create_reception(pvz.id).await;

        assert!(matches!(result, Err(StorageError::OpenReceptionExists(_))));
        assert_eq!(store.open_reception_count(pvz.id).await, 1);
    }

    #[tokio::test]
    async fn close_then_reopen() {
        let store = InMemoryStore::new();
        let pvz = store.create_pvz(City::Kazan).await.unwrap();
        let first = store.create_reception(pvz.id).await.unwrap();

        let closed = store.close_open_reception(pvz.id).await.unwrap().unwrap();
        assert_eq!(closed.id, first.id);
        assert_eq!(closed.status, ReceptionStatus::Closed);
        assert!(store.get_open_reception(pvz.id).await.unwrap().is_none());
        assert!(store.close_open_reception(pvz.id).await.unwrap().is_none());

        let second = store.create_reception(pvz.id).await.unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(store.receptions_of(pvz.id).await.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_leave_one_open_reception() {
        let store = InMemoryStore::new();
        let pvz = store.create_pvz(City::Moscow).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.create_reception(pvz.id).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(StorageError::OpenReceptionExists(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.open_reception_count(pvz.id).await, 1);
    }

    #[tokio::test]
    async fn remove_last_product_is_lifo() {
        let store = InMemoryStore::new();
        let pvz = store.create_pvz(City::Moscow).await.unwrap();
        let reception = store.create_reception(pvz.id).await.unwrap();

        for kind in ["p1", "p2", "p3"] {
            store.append_product(reception.id, kind).await.unwrap();
        }

        for expected in ["p3", "p2", "p1"] {
            let removed = store.remove_last_product(reception.id).await.unwrap().unwrap();
            assert_eq!(removed.product_type, expected);
        }
        assert!(store.remove_last_product(reception.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn equal_timestamps_fall_back_to_insertion_order() {
        // The manual clock never advances, so every product shares a timestamp.
        let (store, _clock) = manual_store();
        let pvz = store.create_pvz(City::Moscow).await.unwrap();
        let reception = store.create_reception(pvz.id).await.unwrap();

        store.append_product(reception.id, "first").await.unwrap();
        store.append_product(reception.id, "second").await.unwrap();

        let listed = store.list_products(reception.id).await.unwrap();
        assert_eq!(listed[0].product_type, "first");
        assert_eq!(listed[1].product_type, "second");

        let removed = store.remove_last_product(reception.id).await.unwrap().unwrap();
        assert_eq!(removed.product_type, "second");
    }

    #[tokio::test]
    async fn product_mutations_require_open_reception() {
        let store = InMemoryStore::new();
        let pvz = store.create_pvz(City::Moscow).await.unwrap();
        let reception = store.create_reception(pvz.id).await.unwrap();
        store.append_product(reception.id, "kept").await.unwrap();
        store.close_open_reception(pvz.id).await.unwrap();

        let append = store.append_product(reception.id, "late").await;
        assert!(matches!(append, Err(StorageError::ReceptionClosed(_))));

        let remove = store.remove_last_product(reception.id).await;
        assert!(matches!(remove, Err(StorageError::ReceptionClosed(_))));

        // Closing leaves earlier products in place.
        assert_eq!(store.list_products(reception.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_to_unknown_reception_fails() {
        let store = InMemoryStore::new();
        let result = store.append_product(ReceptionId::new(), "ghost").await;
        assert!(matches!(result, Err(StorageError::ReceptionNotFound(_))));
    }

    #[tokio::test]
    async fn list_products_of_unknown_reception_fails() {
        let store = InMemoryStore::new();
        let reception_id = ReceptionId::new();

        let result = store.list_products(reception_id).await;
        assert!(matches!(result, Err(StorageError::ReceptionNotFound(id)) if id == reception_id));
    }

    #[tokio::test]
    async fn list_pvz_breaks_registration_ties_by_insertion() {
        let (store, _clock) = manual_store();
        let first = store.create_pvz(City::Moscow).await.unwrap();
        let second = store.create_pvz(City::Kazan).await.unwrap();
        assert_eq!(first.registration_date, second.registration_date);

        let listed = store.list_pvz(PvzQuery::new()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn list_pvz_orders_newest_first_and_pages() {
        let (store, clock) = manual_store();
        let mut created = Vec::new();
        for _ in 0..5 {
            created.push(store.create_pvz(City::Moscow).await.unwrap());
            clock.advance(Duration::minutes(1));
        }

        let first_page = store
            .list_pvz(PvzQuery::new().paginate(Pagination::clamped(1, 2)))
            .await
            .unwrap();
        assert_eq!(first_page, vec![created[4].clone(), created[3].clone()]);

        let last_page = store
            .list_pvz(PvzQuery::new().paginate(Pagination::clamped(3, 2)))
            .await
            .unwrap();
        assert_eq!(last_page, vec![created[0].clone()]);
    }

    #[tokio::test]
    async fn list_pvz_filters_by_reception_time() {
        let (store, clock) = manual_store();
        let start = clock.now();

        let idle = store.create_pvz(City::Moscow).await.unwrap();
        let early = store.create_pvz(City::Kazan).await.unwrap();
        let late = store.create_pvz(City::SaintPetersburg).await.unwrap();

        store.create_reception(early.id).await.unwrap();
        clock.advance(Duration::hours(2));
        store.create_reception(late.id).await.unwrap();
        // A second reception for the same pickup point must not duplicate it.
        store.close_open_reception(late.id).await.unwrap();
        store.create_reception(late.id).await.unwrap();

        let all = store.list_pvz(PvzQuery::new()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|p| p.id == idle.id));

        let window = store
            .list_pvz(PvzQuery::new().from(start + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(window, vec![late.clone()]);

        let until = store
            .list_pvz(PvzQuery::new().to(start + Duration::minutes(30)))
            .await
            .unwrap();
        assert_eq!(until, vec![early]);
    }
}
