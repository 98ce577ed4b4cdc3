use std::env;

/// Pipeline configuration loaded once at startup and passed into component
/// constructors.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared table name (default: "larder")
    pub table_name: String,
    /// Audit entry retention before store-native TTL prunes it, in years
    /// (default: 5)
    pub audit_retention_years: i64,
    /// Share relationships fetched per page during replication (default: 100)
    pub replication_page_size: i32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TABLE_NAME` - shared table name (default: "larder")
    /// - `AUDIT_RETENTION_YEARS` - audit TTL horizon (default: 5)
    /// - `REPLICATION_PAGE_SIZE` - relationship scan page size (default: 100)
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("TABLE_NAME").unwrap_or_else(|_| "larder".to_string()),
            audit_retention_years: env::var("AUDIT_RETENTION_YEARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            replication_page_size: env::var("REPLICATION_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "larder".to_string(),
            audit_retention_years: 5,
            replication_page_size: 100,
        }
    }
}
