use anyhow::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Migration scripts embedded at compile time, applied in order. Every
/// script is idempotent (IF NOT EXISTS) so re-running on startup is safe.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "01_create_cameras",
        include_str!("sql/01_create_cameras.sql"),
    ),
    ("02_create_alarms", include_str!("sql/02_create_alarms.sql")),
    (
        "03_create_reports",
        include_str!("sql/03_create_reports.sql"),
    ),
];

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        pool.execute(*sql).await?;
        info!("Applied migration: {}", name);
    }

    Ok(())
}
