/// Current schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Full SQL schema for Strata's per-app/run `SQLite` database.
///
/// The parsed summary fields are denormalized into their own columns next to
/// the full JSON record so downstream consumers can read them without
/// decoding JSON.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS strata_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per application+run this database serves
CREATE TABLE IF NOT EXISTS applications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    run TEXT NOT NULL,
    root_path TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(name, run)
);

-- Summarized nodes (methods, files, folders)
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    node_key TEXT NOT NULL,
    element_type TEXT NOT NULL,
    name TEXT NOT NULL,
    granularity TEXT NOT NULL,
    file_type TEXT NOT NULL,
    record TEXT NOT NULL,
    summary_markdown TEXT NOT NULL DEFAULT '',
    executive_summary TEXT NOT NULL DEFAULT '',
    technical_breakdown TEXT NOT NULL DEFAULT '',
    dataflow TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE(application_id, node_key, element_type)
);
CREATE INDEX IF NOT EXISTS idx_nodes_app_key ON nodes(application_id, node_key);
CREATE INDEX IF NOT EXISTS idx_nodes_app_type ON nodes(application_id, element_type);

-- Run-level state: counters, timestamps, analysis payloads
CREATE TABLE IF NOT EXISTS run_state (
    application_id INTEGER NOT NULL REFERENCES applications(id) ON DELETE CASCADE,
    state_key TEXT NOT NULL,
    state_value TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (application_id, state_key)
);
";
