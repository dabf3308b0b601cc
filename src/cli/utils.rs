use serde_json::{json, Value};
use sqlx::PgPool;

use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Open the configured pool, applying migrations when the profile asks for it.
pub async fn open_pool() -> anyhow::Result<PgPool> {
    let database = &config::config().database;
    let pool = DatabaseManager::connect(database).await?;
    if database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }
    Ok(pool)
}
