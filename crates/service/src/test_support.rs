#![cfg(test)]
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    let ok = MIGRATED
        .get_or_init(|| async {
            let db = match models::db::connect().await {
                Ok(db) => db,
                Err(_) => return false,
            };
            migration::Migrator::up(&db, None).await.is_ok()
        })
        .await;
    if !*ok {
        anyhow::bail!("database unavailable for tests");
    }

    // Return a fresh connection for the current test's runtime
    models::db::connect().await
}
