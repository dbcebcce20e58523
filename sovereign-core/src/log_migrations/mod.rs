//! Event log migrations - embedded SQL files
//!
//! Each migration is a (name, sql) pair compiled in with include_str! and
//! applied once, in name order. The first entry creates the bookkeeping table
//! itself, runs on every open and must stay idempotent.

/// New migrations go in as NNN_description.sql and are appended here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    (
        "001_initial_schema.sql",
        include_str!("001_initial_schema.sql"),
    ),
];
