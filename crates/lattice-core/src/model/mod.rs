//! Entity model (§3).
//!
//! Each entity gets its own submodule, the way `beads_core::issue` and
//! `beads_core::dependency` each own one struct. All entities derive
//! `Serialize`/`Deserialize` so they can cross the storage/query/CLI
//! boundary as plain data.

pub mod collection;
pub mod constraint;
pub mod datatype;
pub mod document;
pub mod index;
pub mod schema;

pub use collection::{Collection, EnforcementMode, IndexingMode};
pub use constraint::FieldConstraint;
pub use datatype::DataType;
pub use document::Document;
pub use index::{IndexTableMapping, IndexedValue};
pub use schema::{Schema, SchemaElement};
