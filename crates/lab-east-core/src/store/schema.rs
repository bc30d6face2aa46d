//! SQLite schema definition.

/// Schema of the SQLite-backed local store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Local storage (one JSON document per key)
-- ============================================================================

CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                          -- JSON document
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
