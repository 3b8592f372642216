//! SQL DDL for the identity tables the bootstrapper owns.

/// SQLite schema with:
/// - `role.name` UNIQUE, so the administrator role can only exist once
/// - `user.username` UNIQUE
/// - `user.role_id` referencing `role(id)`
/// - `user.confirmed` BOOLEAN (stored as INTEGER 0/1)
/// - `user.otp_secret` NULL when two-factor login is disabled
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS role (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NULL
);

CREATE TABLE IF NOT EXISTS "user" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    firstname TEXT NOT NULL DEFAULT '',
    lastname TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    otp_secret TEXT NULL,
    role_id INTEGER NOT NULL REFERENCES role(id),
    confirmed INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_user_role_id ON "user"(role_id);
"#;
