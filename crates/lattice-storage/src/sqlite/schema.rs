//! DDL statements and migrations for the SQLite schema (§6).
//!
//! Timestamps are stored as TEXT in ISO 8601 (RFC 3339) form since SQLite
//! has no native datetime type. Booleans are stored as INTEGER (0/1).
//! Per-path `idx_*` value tables are created dynamically at runtime
//! (§4.8 step 6) and are not part of this fixed DDL set.

/// Current schema version. Bumped whenever DDL or migrations change.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS collections (
        id                      TEXT PRIMARY KEY,
        name                    TEXT NOT NULL,
        description             TEXT,
        documents_directory     TEXT NOT NULL,
        created_at              TEXT NOT NULL,
        updated_at              TEXT NOT NULL,
        schema_enforcement_mode TEXT NOT NULL DEFAULT 'none',
        indexing_mode           TEXT NOT NULL DEFAULT 'all'
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_collections_name ON collections(name)",
    r#"
    CREATE TABLE IF NOT EXISTS schemas (
        id         TEXT PRIMARY KEY,
        hash       TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS schema_elements (
        id        TEXT PRIMARY KEY,
        schema_id TEXT NOT NULL REFERENCES schemas(id) ON DELETE CASCADE,
        position  INTEGER NOT NULL,
        key       TEXT NOT NULL,
        datatype  TEXT NOT NULL,
        nullable  INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_schema_elements_schema ON schema_elements(schema_id)",
    r#"
    CREATE TABLE IF NOT EXISTS index_table_mappings (
        id         TEXT PRIMARY KEY,
        path       TEXT NOT NULL UNIQUE,
        table_name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id                TEXT PRIMARY KEY,
        collection_id     TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        schema_id         TEXT NOT NULL REFERENCES schemas(id),
        name              TEXT,
        created_at        TEXT NOT NULL,
        updated_at        TEXT NOT NULL,
        content_length    INTEGER NOT NULL,
        sha256            TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection_id)",
    "CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS labels (
        document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
        label       TEXT NOT NULL,
        PRIMARY KEY (document_id, label)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_labels_label ON labels(label)",
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        collection_id TEXT REFERENCES collections(id) ON DELETE CASCADE,
        document_id   TEXT REFERENCES documents(id) ON DELETE CASCADE,
        key           TEXT NOT NULL,
        value         TEXT NOT NULL,
        CHECK ((collection_id IS NULL) <> (document_id IS NULL))
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_collection_key ON tags(collection_id, key) WHERE collection_id IS NOT NULL",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_document_key ON tags(document_id, key) WHERE document_id IS NOT NULL",
    r#"
    CREATE TABLE IF NOT EXISTS field_constraints (
        id                 TEXT PRIMARY KEY,
        collection_id      TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        field_path         TEXT NOT NULL,
        data_type          TEXT NOT NULL,
        required           INTEGER NOT NULL DEFAULT 0,
        nullable           INTEGER NOT NULL DEFAULT 1,
        regex_pattern      TEXT,
        min_value          REAL,
        max_value          REAL,
        min_length         INTEGER,
        max_length         INTEGER,
        allowed_values     TEXT,
        array_element_type TEXT,
        created_at         TEXT NOT NULL,
        updated_at         TEXT NOT NULL,
        UNIQUE (collection_id, field_path)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS indexed_fields (
        id            TEXT PRIMARY KEY,
        collection_id TEXT NOT NULL REFERENCES collections(id) ON DELETE CASCADE,
        field_path    TEXT NOT NULL,
        UNIQUE (collection_id, field_path)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS config (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
];

/// Schema migrations applied after initial DDL.
///
/// Each migration is a `(name, sql)` pair, tracked in the `metadata` table
/// under the key `migration:<name>` so it runs at most once.
pub const MIGRATIONS: &[(&str, &str)] = &[];

/// `CREATE TABLE` template for a per-path index table. `%s` is replaced with
/// the table name (`idx_<md5(path)>`).
pub fn create_index_table_sql(table_name: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS "{table_name}" (
            id          TEXT PRIMARY KEY,
            document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
            position    INTEGER,
            value       TEXT
        )
        "#
    )
}

/// Index-creation statements for a per-path index table, run right after
/// [`create_index_table_sql`].
pub fn create_index_table_indexes_sql(table_name: &str) -> Vec<String> {
    vec![
        format!(
            r#"CREATE INDEX IF NOT EXISTS "{table_name}_document" ON "{table_name}"(document_id)"#
        ),
        format!(r#"CREATE INDEX IF NOT EXISTS "{table_name}_value" ON "{table_name}"(value)"#),
    ]
}
