//! Clap CLI definitions for the `lattice` command.
//!
//! Mirrors the command tree described for the Lattice document store: a
//! handful of verbs over collections and documents, each dispatched to a
//! handler under [`crate::commands`].

use clap::{Args, Parser, Subcommand};

/// lattice -- a JSON document store with schema auto-detection and
/// per-field inverted indexes.
#[derive(Parser, Debug)]
#[command(
    name = "lattice",
    about = "JSON document store with schema auto-detection and inverted-index search",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database path (default: $LATTICE_DB).
    #[arg(long, global = true, env = "LATTICE_DB")]
    pub db: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open or create the SQLite store at the given path.
    Init(InitArgs),

    /// Manage collections.
    Collection(CollectionArgs),

    /// Ingest a JSON document into a collection.
    Ingest(IngestArgs),

    /// Fetch a single document's metadata by id.
    Get(GetArgs),

    /// Run a SQL-dialect query against a collection.
    Query(QueryArgs),

    /// Rebuild a collection's indexes under its current policy.
    Rebuild(RebuildArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to the SQLite database file to open or create.
    pub db_path: String,
}

#[derive(Args, Debug)]
pub struct CollectionArgs {
    #[command(subcommand)]
    pub command: CollectionCommands,
}

#[derive(Subcommand, Debug)]
pub enum CollectionCommands {
    /// Create a new collection.
    Create(CollectionCreateArgs),

    /// Delete a collection.
    Delete(CollectionDeleteArgs),
}

#[derive(Args, Debug)]
pub struct CollectionCreateArgs {
    /// Collection name.
    #[arg(long)]
    pub name: String,

    /// Schema validation mode: none, strict, flexible, partial.
    #[arg(long, default_value = "none")]
    pub enforcement: String,

    /// Indexing policy: all, selective, none.
    #[arg(long, default_value = "all")]
    pub indexing: String,
}

#[derive(Args, Debug)]
pub struct CollectionDeleteArgs {
    /// Collection id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Collection id to ingest into.
    pub collection_id: String,

    /// Path to a JSON file to ingest.
    pub file: String,

    /// Optional display name for the document.
    #[arg(long)]
    pub name: Option<String>,

    /// Label to attach (repeatable).
    #[arg(long = "label")]
    pub labels: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Document id.
    pub document_id: String,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Collection id to query.
    pub collection_id: String,

    /// SQL-dialect query text.
    pub sql: String,
}

#[derive(Args, Debug)]
pub struct RebuildArgs {
    /// Collection id to rebuild.
    pub collection_id: String,

    /// Drop index tables for paths no longer selected (selective mode only).
    #[arg(long)]
    pub drop_unused: bool,
}
