use std::sync::Arc;

use async_trait::async_trait;
use common::{City, ProductId, PvzId, ReceptionId};
use sqlx::{PgPool, Row, error::ErrorKind, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Clock, Product, Pvz, PvzQuery, Reception, ReceptionStatus, Result, StorageError, SystemClock,
    store::{ProductStore, PvzStore, ReceptionStore},
};

/// Name of the partial unique index guarding open receptions.
const OPEN_RECEPTION_INDEX: &str = "reception_one_open_per_pvz";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PostgresStore {
    /// Creates a store stamped by the system clock.
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Creates a store stamped by the given clock.
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_pvz(row: PgRow) -> Result<Pvz> {
        let city: String = row.try_get("city")?;
        Ok(Pvz {
            id: PvzId::from_uuid(row.try_get::<Uuid, _>("id")?),
            city: city
                .parse::<City>()
                .map_err(|e| StorageError::Corrupt(e.to_string()))?,
            registration_date: row.try_get("registration_date")?,
        })
    }

    fn row_to_reception(row: PgRow) -> Result<Reception> {
        let status: String = row.try_get("status")?;
        Ok(Reception {
            id: ReceptionId::from_uuid(row.try_get::<Uuid, _>("id")?),
            pvz_id: PvzId::from_uuid(row.try_get::<Uuid, _>("pvz_id")?),
            date_time: row.try_get("date_time")?,
            status: ReceptionStatus::parse(&status)
                .ok_or_else(|| StorageError::Corrupt(format!("unknown reception status {status}")))?,
        })
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_type: row.try_get("type")?,
            reception_id: ReceptionId::from_uuid(row.try_get::<Uuid, _>("reception_id")?),
            date_time: row.try_get("date_time")?,
        })
    }

    /// Locks the reception row and checks that it is still open.
    ///
    /// `lock` is the row-level lock clause appended to the select.
    async fn lock_open_reception(
        tx: &mut sqlx::PgConnection,
        reception_id: ReceptionId,
        lock: &str,
    ) -> Result<()> {
        let status: Option<String> =
            sqlx::query_scalar(&format!("SELECT status FROM reception WHERE id = $1 {lock}"))
                .bind(reception_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        match status.as_deref().map(ReceptionStatus::parse) {
            None => Err(StorageError::ReceptionNotFound(reception_id)),
            Some(Some(ReceptionStatus::Open)) => Ok(()),
            Some(Some(ReceptionStatus::Closed)) => Err(StorageError::ReceptionClosed(reception_id)),
            Some(None) => Err(StorageError::Corrupt(format!(
                "unknown status for reception {reception_id}"
            ))),
        }
    }
}

/// Maps check and not-null rejections to `ConstraintViolation`.
fn constraint_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(ref db_err) = e
        && matches!(
            db_err.kind(),
            ErrorKind::CheckViolation | ErrorKind::NotNullViolation
        )
    {
        return StorageError::ConstraintViolation(db_err.message().to_string());
    }
    StorageError::Database(e)
}

#[async_trait]
impl PvzStore for PostgresStore {
    async fn create_pvz(&self, city: City) -> Result<Pvz> {
        let row = sqlx::query(
            r#"
            INSERT INTO pvz (id, city, registration_date)
            VALUES ($1, $2, $3)
            RETURNING id, city, registration_date
            "#,
        )
        .bind(PvzId::new().as_uuid())
        .bind(city.as_str())
        .bind(self.clock.now())
        .fetch_one(&self.pool)
        .await
        .map_err(constraint_error)?;

        Self::row_to_pvz(row)
    }

    async fn list_pvz(&self, query: PvzQuery) -> Result<Vec<Pvz>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.city, p.registration_date
            FROM pvz p
            WHERE ($1::timestamptz IS NULL AND $2::timestamptz IS NULL)
               OR EXISTS (
                    SELECT 1 FROM reception r
                    WHERE r.pvz_id = p.id
                      AND ($1::timestamptz IS NULL OR r.date_time >= $1)
                      AND ($2::timestamptz IS NULL OR r.date_time <= $2)
               )
            ORDER BY p.registration_date DESC, p.seq DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.from)
        .bind(query.to)
        .bind(i64::from(query.pagination.page_size()))
        .bind(i64::try_from(query.pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_pvz).collect()
    }
}

#[async_trait]
impl ReceptionStore for PostgresStore {
    async fn create_reception(&self, pvz_id: PvzId) -> Result<Reception> {
        // The partial unique index rejects a second open reception even when
        // two inserts race.
        let row = sqlx::query(
            r#"
            INSERT INTO reception (id, pvz_id, date_time, status)
            SELECT $1, p.id, $3, 'in_progress'
            FROM pvz p
            WHERE p.id = $2
            RETURNING id, pvz_id, date_time, status
            "#,
        )
        .bind(ReceptionId::new().as_uuid())
        .bind(pvz_id.as_uuid())
        .bind(self.clock.now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(OPEN_RECEPTION_INDEX)
            {
                tracing::debug!(%pvz_id, "open reception index rejected insert");
                return StorageError::OpenReceptionExists(pvz_id);
            }
            constraint_error(e)
        })?;

        match row {
            Some(row) => Self::row_to_reception(row),
            None => Err(StorageError::PvzNotFound(pvz_id)),
        }
    }

    async fn get_open_reception(&self, pvz_id: PvzId) -> Result<Option<Reception>> {
        let row = sqlx::query(
            r#"
            SELECT id, pvz_id, date_time, status
            FROM reception
            WHERE pvz_id = $1 AND status = 'in_progress'
            ORDER BY date_time DESC
            LIMIT 1
            "#,
        )
        .bind(pvz_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reception).transpose()
    }

    async fn close_open_reception(&self, pvz_id: PvzId) -> Result<Option<Reception>> {
        let row = sqlx::query(
            r#"
            UPDATE reception
            SET status = 'close'
            WHERE status = 'in_progress'
              AND id = (
                SELECT id FROM reception
                WHERE pvz_id = $1 AND status = 'in_progress'
                ORDER BY date_time DESC
                LIMIT 1
                FOR UPDATE
              )
            RETURNING id, pvz_id, date_time, status
            "#,
        )
        .bind(pvz_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reception).transpose()
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn append_product(
        &self,
        reception_id: ReceptionId,
        product_type: &str,
    ) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE lets appends proceed side by side but blocks a close.
        Self::lock_open_reception(&mut tx, reception_id, "FOR SHARE").await?;

        let row = sqlx::query(
            r#"
            INSERT INTO product (id, type, reception_id, date_time)
            VALUES ($1, $2, $3, $4)
            RETURNING id, type, reception_id, date_time
            "#,
        )
        .bind(ProductId::new().as_uuid())
        .bind(product_type)
        .bind(reception_id.as_uuid())
        .bind(self.clock.now())
        .fetch_one(&mut *tx)
        .await
        .map_err(constraint_error)?;

        tx.commit().await?;
        Self::row_to_product(row)
    }

    async fn remove_last_product(&self, reception_id: ReceptionId) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE serializes removals per reception.
        Self::lock_open_reception(&mut tx, reception_id, "FOR UPDATE").await?;

        let row = sqlx::query(
            r#"
            DELETE FROM product
            WHERE id = (
                SELECT id FROM product
                WHERE reception_id = $1
                ORDER BY date_time DESC, seq DESC
                LIMIT 1
            )
            RETURNING id, type, reception_id, date_time
            "#,
        )
        .bind(reception_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        row.map(Self::row_to_product).transpose()
    }

    async fn list_products(&self, reception_id: ReceptionId) -> Result<Vec<Product>> {
        // Receptions are never deleted, so the existence check cannot go stale.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reception WHERE id = $1)")
                .bind(reception_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(StorageError::ReceptionNotFound(reception_id));
        }

        let rows = sqlx::query(
            r#"
            SELECT id, type, reception_id, date_time
            FROM product
            WHERE reception_id = $1
            ORDER BY date_time ASC, seq ASC
            "#,
        )
        .bind(reception_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }
}
