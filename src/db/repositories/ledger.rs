use crate::config::LedgerConfig;
use crate::db::models::{FileColumn, LedgerSlot};
use crate::error::Error;
use crate::ledger::addressing::{slot_row, HEADER};
use crate::ledger::store::RecordStore;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use sqlx::PgPool;
use std::sync::Arc;

/// PostgreSQL backed ledger
#[derive(Clone)]
pub struct LedgerRepository {
    pub pool: Arc<PgPool>,
}

impl LedgerRepository {
    /// Create a new ledger repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn ensure_ledger(&self, ledger: &LedgerConfig) -> Result<()> {
        let capacity = sqlx::query_scalar::<_, i32>("SELECT capacity FROM ledgers WHERE name = $1")
            .bind(&ledger.name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to look up ledger: {}", e)))?;

        match capacity {
            Some(stored) => {
                capacity_matches(ledger, stored);
                Ok(())
            }
            None => Err(Error::LedgerNotFound(ledger.name.clone()).into()),
        }
    }
}

fn stored_capacity(ledger: &LedgerConfig) -> i32 {
    i32::try_from(ledger.record_limit).unwrap_or(i32::MAX)
}

/// Slots are addressed with the configured capacity, so a ledger built with
/// another `record_limit` maps events onto different rows until rebuilt.
fn capacity_matches(ledger: &LedgerConfig, stored: i32) -> bool {
    let matches = stored == stored_capacity(ledger);
    if !matches {
        warn!(
            "Ledger {} was built with {} rows but record_limit is {}; run rebuild-ledger",
            ledger.name, stored, ledger.record_limit
        );
    }
    matches
}

#[async_trait]
impl RecordStore for LedgerRepository {
    async fn exists(&self, ledger: &LedgerConfig) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM ledgers WHERE name = $1)",
        )
        .bind(&ledger.name)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to look up ledger: {}", e)))?;

        Ok(exists)
    }

    async fn rebuild(&self, ledger: &LedgerConfig) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        // slots go with the ledger row (ON DELETE CASCADE)
        sqlx::query("DELETE FROM ledgers WHERE name = $1")
            .bind(&ledger.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to drop ledger: {}", e)))?;

        sqlx::query("INSERT INTO ledgers (name, capacity, header) VALUES ($1, $2, $3)")
            .bind(&ledger.name)
            .bind(stored_capacity(ledger))
            .bind(serde_json::json!(HEADER))
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to create ledger: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit ledger rebuild: {}", e)))?;

        info!("Rebuilt ledger {} with {} rows", ledger.name, ledger.record_limit);
        Ok(())
    }

    async fn initialize(
        &self,
        ledger: &LedgerConfig,
        event_number: i64,
        event_datetime: Option<NaiveDateTime>,
    ) -> Result<()> {
        self.ensure_ledger(ledger).await?;
        let row = slot_row(event_number, ledger.record_limit);
        debug!("Initializing row {} of {} for event {}", row, ledger.name, event_number);

        sqlx::query(
            r#"
            INSERT INTO ledger_slots (ledger_name, row_pos, event_number, event_datetime, jpg_path, mp4_path)
            VALUES ($1, $2, $3, $4, NULL, NULL)
            ON CONFLICT (ledger_name, row_pos) DO UPDATE
            SET event_number = EXCLUDED.event_number,
                event_datetime = EXCLUDED.event_datetime,
                jpg_path = NULL,
                mp4_path = NULL
            "#,
        )
        .bind(&ledger.name)
        .bind(row)
        .bind(event_number)
        .bind(event_datetime)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to initialize slot: {}", e)))?;

        Ok(())
    }

    async fn patch_file(
        &self,
        ledger: &LedgerConfig,
        event_number: i64,
        column: FileColumn,
        path: &str,
    ) -> Result<()> {
        self.ensure_ledger(ledger).await?;
        let row = slot_row(event_number, ledger.record_limit);
        let column = column.column_name();
        debug!("Setting {} of row {} for event {}", column, row, event_number);

        let sql = format!(
            r#"
            INSERT INTO ledger_slots (ledger_name, row_pos, {column})
            VALUES ($1, $2, $3)
            ON CONFLICT (ledger_name, row_pos) DO UPDATE
            SET {column} = EXCLUDED.{column}
            "#
        );

        sqlx::query(&sql)
            .bind(&ledger.name)
            .bind(row)
            .bind(path)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to update {}: {}", column, e)))?;

        Ok(())
    }

    async fn read(&self, ledger: &LedgerConfig, event_number: i64) -> Result<LedgerSlot> {
        self.ensure_ledger(ledger).await?;

        let slot = sqlx::query_as::<_, LedgerSlot>(
            r#"
            SELECT event_number, event_datetime, jpg_path, mp4_path
            FROM ledger_slots
            WHERE ledger_name = $1 AND row_pos = $2
            "#,
        )
        .bind(&ledger.name)
        .bind(slot_row(event_number, ledger.record_limit))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to read slot: {}", e)))?;

        Ok(slot.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::NaiveDate;
    use sqlx::postgres::PgPoolOptions;

    async fn repository() -> Result<Option<LedgerRepository>> {
        // Skip test if no PostgreSQL is available
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            println!("Skipping PostgreSQL test. Set TEST_DATABASE_URL to run.");
            return Ok(None);
        };
        let pool = PgPoolOptions::new().max_connections(2).connect(&url).await?;
        run_migrations(&pool).await?;
        Ok(Some(LedgerRepository::new(Arc::new(pool))))
    }

    fn ledger(name: &str) -> LedgerConfig {
        LedgerConfig {
            name: name.to_string(),
            record_limit: 10,
            ..LedgerConfig::default()
        }
    }

    #[test]
    fn capacity_mismatch_is_detected() {
        let ledger = ledger("capacity");
        assert!(capacity_matches(&ledger, 10));
        assert!(!capacity_matches(&ledger, 1000));

        let huge = LedgerConfig {
            record_limit: u32::MAX,
            ..ledger
        };
        assert!(capacity_matches(&huge, i32::MAX));
    }

    #[tokio::test]
    async fn slot_lifecycle() -> Result<()> {
        let Some(repo) = repository().await? else {
            return Ok(());
        };
        let ledger = ledger("test_slot_lifecycle");
        repo.rebuild(&ledger).await?;

        let at = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(8, 30, 0);
        repo.initialize(&ledger, 12, at).await?;
        repo.patch_file(&ledger, 12, FileColumn::Jpg, "a/b/c.jpg").await?;

        let slot = repo.read(&ledger, 12).await?;
        assert_eq!(slot.event_number, Some(12));
        assert_eq!(slot.event_datetime, at);
        assert_eq!(slot.jpg_path.as_deref(), Some("a/b/c.jpg"));
        assert_eq!(slot.mp4_path, None);

        // same row, next lap
        assert_eq!(repo.read(&ledger, 2).await?, slot);

        repo.rebuild(&ledger).await?;
        assert_eq!(repo.read(&ledger, 12).await?, LedgerSlot::default());
        Ok(())
    }

    #[tokio::test]
    async fn missing_ledger_is_reported() -> Result<()> {
        let Some(repo) = repository().await? else {
            return Ok(());
        };
        let err = repo
            .read(&ledger("test_ledger_never_built"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::LedgerNotFound(_))));
        Ok(())
    }
}
