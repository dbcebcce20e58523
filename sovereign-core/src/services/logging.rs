//! Logging service - structured event logging to DuckDB
//!
//! Stores export events in logs.duckdb. Only event names, user types,
//! formats, commands and error messages are recorded; record content never
//! reaches the log.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::log_migrations::LOG_MIGRATIONS;

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    // Lower 16 bits: counter (65536 IDs per millisecond)
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    ((now_ms() as u64) << 16) | counter
}

/// Current unix timestamp in milliseconds
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Entry point for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Library,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Library => "library",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    /// Create a new log event with just an event name
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            user_type: None,
            format: None,
            command: None,
            error_message: None,
            error_details: None,
        }
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the command context (for CLI events)
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub user_type: Option<String>,
    pub format: Option<String>,
    pub command: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

const SELECT_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
     event, user_type, format, command, error_message, error_details";

/// Which entries to read back, newest first
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub event: Option<String>,
    pub user_type: Option<String>,
    pub format: Option<String>,
    /// Only entries carrying an error message
    pub errors_only: bool,
    /// Only entries at or after this unix ms timestamp
    pub since_ms: Option<i64>,
    pub limit: usize,
}

impl LogFilter {
    pub fn recent(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn errors(limit: usize) -> Self {
        Self {
            errors_only: true,
            limit,
            ..Self::default()
        }
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn since(mut self, since_ms: i64) -> Self {
        self.since_ms = Some(since_ms);
        self
    }

    /// WHERE clause and its string parameters, in placeholder order
    fn where_clause(&self) -> (String, Vec<&str>) {
        let mut conditions = Vec::new();
        let mut params = Vec::new();
        for (column, value) in [
            ("event", &self.event),
            ("user_type", &self.user_type),
            ("format", &self.format),
        ] {
            if let Some(value) = value {
                conditions.push(format!("{} = ?", column));
                params.push(value.as_str());
            }
        }
        if self.errors_only {
            conditions.push("error_message IS NOT NULL".to_string());
        }
        if let Some(since) = self.since_ms {
            conditions.push(format!("timestamp >= {}", since));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

/// Completed and failed exports for one (user type, format) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTally {
    pub user_type: String,
    pub format: String,
    pub completed: u64,
    pub failed: u64,
}

/// Service for structured event logging
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open or create logs.duckdb in the sovereign directory and run pending migrations
    pub fn new(
        sovereign_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = sovereign_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open log database: {:?}", db_path))?;

        let service = Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        };

        service.run_migrations()?;

        Ok(service)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Log database lock poisoned: {}", e))
    }

    /// Apply every embedded migration not yet recorded in sys_migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        let (bootstrap, pending) = LOG_MIGRATIONS
            .split_first()
            .context("No log migrations embedded")?;
        conn.execute_batch(bootstrap.1)
            .context("Failed to create migration table")?;

        let mut stmt = conn.prepare("SELECT migration_name FROM sys_migrations")?;
        let applied: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<duckdb::Result<_>>()?;

        for (name, sql) in pending.iter().filter(|(n, _)| !applied.iter().any(|a| a == n)) {
            conn.execute_batch(sql)
                .with_context(|| format!("Log migration {} failed", name))?;
            conn.execute(
                "INSERT INTO sys_migrations (migration_name) VALUES (?)",
                [name],
            )?;
        }

        Ok(())
    }

    /// Record an event
    ///
    /// Entry point, app version and platform are added from the service configuration.
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO sys_logs (
                id, timestamp, entry_point, app_version, platform,
                event, user_type, format, command, error_message, error_details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                generate_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.user_type,
                &event.format,
                &event.command,
                &event.error_message,
                &event.error_details,
            ],
        )?;

        Ok(())
    }

    /// Entries matching `filter`, newest first
    pub fn entries(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let (where_clause, params) = filter.where_clause();
        let sql = format!(
            "SELECT {} FROM sys_logs {} ORDER BY id DESC LIMIT {}",
            SELECT_COLUMNS, where_clause, filter.limit
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(duckdb::params_from_iter(params), |row| {
                Ok(LogEntry {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    entry_point: row.get(2)?,
                    app_version: row.get(3)?,
                    platform: row.get(4)?,
                    event: row.get(5)?,
                    user_type: row.get(6)?,
                    format: row.get(7)?,
                    command: row.get(8)?,
                    error_message: row.get(9)?,
                    error_details: row.get(10)?,
                })
            })?
            .collect::<duckdb::Result<_>>()?;

        Ok(entries)
    }

    /// Export outcomes per (user type, format), from `export_completed` and
    /// `export_failed` events
    pub fn export_tallies(&self) -> Result<Vec<ExportTally>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT user_type, format,
                   COUNT(*) FILTER (WHERE event = 'export_completed'),
                   COUNT(*) FILTER (WHERE event = 'export_failed')
            FROM sys_logs
            WHERE event IN ('export_completed', 'export_failed')
              AND user_type IS NOT NULL AND format IS NOT NULL
            GROUP BY user_type, format
            ORDER BY user_type, format
            "#,
        )?;

        let tallies = stmt
            .query_map([], |row| {
                Ok(ExportTally {
                    user_type: row.get(0)?,
                    format: row.get(1)?,
                    completed: row.get(2)?,
                    failed: row.get(3)?,
                })
            })?
            .collect::<duckdb::Result<_>>()?;

        Ok(tallies)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete entries older than the given unix ms timestamp
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn service(dir: &Path) -> LoggingService {
        LoggingService::new(dir, EntryPoint::Library, "1.0.0").unwrap()
    }

    fn completed(user_type: &str, format: &str) -> LogEvent {
        LogEvent::new("export_completed")
            .with_user_type(user_type)
            .with_format(format)
    }

    fn failed(user_type: &str, format: &str) -> LogEvent {
        LogEvent::new("export_failed")
            .with_user_type(user_type)
            .with_format(format)
            .with_error("Permission denied: government export")
            .with_error_details("stage=received kind=permission_denied")
    }

    #[test]
    fn test_logging_service_creation() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());
        assert!(service.db_path().exists());
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let dir = tempdir().unwrap();
        service(dir.path()).log(completed("ngo", "json")).unwrap();

        let reopened = service(dir.path());
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_entries_newest_first() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());
        service.log(completed("journalist", "json")).unwrap();
        service.log(LogEvent::new("command_executed").with_command("batch")).unwrap();

        let entries = service.entries(&LogFilter::recent(10)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].command.as_deref(), Some("batch"));
        assert_eq!(entries[1].user_type.as_deref(), Some("journalist"));
        assert_eq!(entries[1].format.as_deref(), Some("json"));
        assert_eq!(entries[1].entry_point, "library");

        assert_eq!(service.entries(&LogFilter::recent(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_filtered_entries() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());
        service.log(completed("ngo", "csv")).unwrap();
        service.log(completed("ngo", "json")).unwrap();
        service.log(failed("government", "json")).unwrap();

        let errors = service.entries(&LogFilter::errors(10)).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].error_details.as_deref(),
            Some("stage=received kind=permission_denied")
        );

        let ngo_csv = service
            .entries(&LogFilter::recent(10).user_type("ngo").format("csv"))
            .unwrap();
        assert_eq!(ngo_csv.len(), 1);

        let json_completed = service
            .entries(&LogFilter::recent(10).event("export_completed").format("json"))
            .unwrap();
        assert_eq!(json_completed.len(), 1);
        assert_eq!(json_completed[0].user_type.as_deref(), Some("ngo"));

        let future = service.entries(&LogFilter::recent(10).since(now_ms() + 60_000)).unwrap();
        assert!(future.is_empty());
    }

    #[test]
    fn test_export_tallies() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());
        service.log(completed("ngo", "json")).unwrap();
        service.log(completed("ngo", "json")).unwrap();
        service.log(failed("ngo", "json")).unwrap();
        service.log(failed("government", "csv")).unwrap();
        service.log(LogEvent::new("batch_completed")).unwrap();

        let tallies = service.export_tallies().unwrap();
        assert_eq!(
            tallies,
            vec![
                ExportTally {
                    user_type: "government".to_string(),
                    format: "csv".to_string(),
                    completed: 0,
                    failed: 1,
                },
                ExportTally {
                    user_type: "ngo".to_string(),
                    format: "json".to_string(),
                    completed: 2,
                    failed: 1,
                },
            ]
        );
    }

    #[test]
    fn test_count_and_delete() {
        let dir = tempdir().unwrap();
        let service = service(dir.path());
        for _ in 0..3 {
            service.log(completed("developer", "html")).unwrap();
        }
        assert_eq!(service.count().unwrap(), 3);

        assert_eq!(service.delete_before(now_ms() - 60_000).unwrap(), 0);
        assert_eq!(service.delete_before(now_ms() + 1000).unwrap(), 3);
        assert_eq!(service.count().unwrap(), 0);
    }
}
