//! SQL schema for the fincast SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version` so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per unified-schema record. `seq` preserves load order.
-- `record_id` is optional, but unique when present: re-loading a record with
-- a known id replaces the stored payload in place.
CREATE TABLE IF NOT EXISTS records (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id        TEXT UNIQUE,
    record_type      TEXT NOT NULL,   -- discriminant of the Record variant
    indicator_code   TEXT,            -- related_indicator for impact links
    observation_date TEXT,            -- YYYY-MM-DD or NULL
    payload_json     TEXT NOT NULL,   -- JSON payload (inner data only)
    loaded_at        TEXT NOT NULL    -- RFC 3339 UTC
);

CREATE INDEX IF NOT EXISTS records_type_idx      ON records(record_type);
CREATE INDEX IF NOT EXISTS records_indicator_idx ON records(indicator_code);
CREATE INDEX IF NOT EXISTS records_date_idx      ON records(observation_date);

PRAGMA user_version = 1;
";
