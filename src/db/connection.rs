//! SurrealDB store handle.
//!
//! The store location comes from the `[database]` section of
//! `concierge.toml` (see [`crate::config`]); the default is an embedded
//! RocksDB under the data directory.

use std::path::Path;

use surrealdb::engine::any::{self, Any};
use surrealdb::opt::capabilities::Capabilities;
use surrealdb::Surreal;

use crate::config::DatabaseConfig;
use crate::ConciergeError;

/// Namespace and database the assistant's tables live in.
const NAMESPACE: &str = "concierge";
const DATABASE: &str = "assistant";

/// Unified store handle, embedded or remote.
pub type ConciergeDb = Surreal<Any>;

/// Connect to the store described by the `[database]` config section.
pub async fn init_db(
    config: &DatabaseConfig,
    data_path: &Path,
) -> Result<ConciergeDb, ConciergeError> {
    match config {
        DatabaseConfig::Embedded { path } => connect_embedded(path.as_deref(), data_path).await,
        DatabaseConfig::Remote {
            endpoint,
            username,
            password,
            namespace,
            database,
        } => {
            connect_remote(
                endpoint,
                username.as_deref(),
                password.as_deref(),
                namespace,
                database,
            )
            .await
        }
    }
}

async fn connect_embedded(
    path: Option<&str>,
    data_path: &Path,
) -> Result<ConciergeDb, ConciergeError> {
    let location = path
        .map(String::from)
        .unwrap_or_else(|| data_path.to_string_lossy().into_owned());
    // The memory tables need the experimental BM25 search and vector
    // functions enabled.
    let options = surrealdb::opt::Config::new()
        .capabilities(Capabilities::all().with_all_experimental_features_allowed());
    let db = any::connect((format!("rocksdb:{location}"), options)).await?;
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;
    Ok(db)
}

async fn connect_remote(
    endpoint: &str,
    username: Option<&str>,
    password: Option<&str>,
    namespace: &str,
    database: &str,
) -> Result<ConciergeDb, ConciergeError> {
    let db = any::connect(endpoint).await?;
    db.signin(surrealdb::opt::auth::Root {
        username: username.unwrap_or("root"),
        password: password.unwrap_or("root"),
    })
    .await?;
    db.use_ns(namespace).use_db(database).await?;
    Ok(db)
}
