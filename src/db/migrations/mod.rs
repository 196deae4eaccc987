use anyhow::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Schema migrations, applied in order. Every statement is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_create_ledgers",
        r#"
        CREATE TABLE IF NOT EXISTS ledgers (
            name TEXT PRIMARY KEY,
            capacity INTEGER NOT NULL,
            header JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    ),
    (
        "002_create_ledger_slots",
        r#"
        CREATE TABLE IF NOT EXISTS ledger_slots (
            ledger_name TEXT NOT NULL REFERENCES ledgers(name) ON DELETE CASCADE,
            row_pos BIGINT NOT NULL,
            event_number BIGINT,
            event_datetime TIMESTAMP,
            jpg_path TEXT,
            mp4_path TEXT,
            PRIMARY KEY (ledger_name, row_pos)
        );
        "#,
    ),
];

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        pool.execute(*sql).await?;
        info!("Applied migration: {}", name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::MIGRATIONS;

    #[test]
    fn migrations_are_ordered_and_unique() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|(name, _)| *name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(names, sorted);
    }
}
