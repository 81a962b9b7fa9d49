//! SQL schema for the Pawlog SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS pets (
    id          TEXT PRIMARY KEY,
    record_ref  TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    species     TEXT NOT NULL,
    breed       TEXT NOT NULL DEFAULT '',
    gender      TEXT NOT NULL DEFAULT 'unknown',
    born_on     TEXT NOT NULL,   -- YYYY-MM-DD
    fur_color   TEXT NOT NULL DEFAULT '',
    microchip   TEXT,
    owner_id    TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Pets are a foreign key only by convention: care records may be written
-- for pets managed elsewhere.
CREATE TABLE IF NOT EXISTS care_records (
    id              TEXT PRIMARY KEY,
    record_ref      TEXT NOT NULL UNIQUE,
    pet_id          TEXT NOT NULL,
    kind            TEXT NOT NULL,   -- 'vaccination' | 'deworming' | 'flea'
    details_json    TEXT NOT NULL,   -- CareDetails payload without the tag
    administered_at TEXT NOT NULL,
    next_due_at     TEXT,            -- NULL when no follow-up is planned
    notes           TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    created_by      TEXT NOT NULL
);

-- Append-only.
CREATE TABLE IF NOT EXISTS feedings (
    id       TEXT PRIMARY KEY,
    pet_id   TEXT NOT NULL,
    food     TEXT NOT NULL,
    portion  TEXT NOT NULL,
    fed_at   TEXT NOT NULL,
    notes    TEXT,
    fed_by   TEXT NOT NULL
);

-- Outbox of reminder notifications waiting to fire, keyed by the
-- deterministic '{kind}-{record id}' identifier.
CREATE TABLE IF NOT EXISTS pending_notifications (
    id         TEXT PRIMARY KEY,
    kind       TEXT NOT NULL,
    record_id  TEXT NOT NULL,
    pet_id     TEXT NOT NULL,
    title      TEXT NOT NULL,
    body       TEXT NOT NULL,
    fire_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS care_pet_kind_idx ON care_records(pet_id, kind);
CREATE INDEX IF NOT EXISTS care_due_idx      ON care_records(next_due_at);
CREATE INDEX IF NOT EXISTS feedings_pet_idx  ON feedings(pet_id, fed_at);

PRAGMA user_version = 1;
";
