//! UUIDv7-backed identifier generation.
//!
//! Identifiers are `<prefix>_<uuidv7-hex>`: k-sortable in approximate
//! creation order (UUIDv7 carries a millisecond timestamp in its top bits)
//! and globally unique with extremely high probability, satisfying the
//! §4.1 contract without per-collection coordination.

use uuid::Uuid;

/// Prefixes for every identifier kind in the entity model (§3).
pub mod prefix {
    pub const COLLECTION: &str = "col";
    pub const DOCUMENT: &str = "doc";
    pub const SCHEMA: &str = "sch";
    pub const SCHEMA_ELEMENT: &str = "sel";
    pub const INDEX_TABLE_MAPPING: &str = "itm";
    pub const INDEXED_FIELD: &str = "ixf";
    pub const FIELD_CONSTRAINT: &str = "fco";
    pub const INDEXED_VALUE: &str = "val";
    pub const LABEL: &str = "lbl";
    pub const TAG: &str = "tag";
}

/// Generates a new identifier of the form `<prefix>_<token>`.
pub fn generate_id(prefix: &str) -> String {
    let uuid = Uuid::now_v7();
    format!("{prefix}_{}", uuid.simple())
}

/// Returns `true` if `id` starts with `<prefix>_`.
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_prefixed_id() {
        let id = generate_id(prefix::DOCUMENT);
        assert!(id.starts_with("doc_"));
        assert!(has_prefix(&id, prefix::DOCUMENT));
    }

    #[test]
    fn ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            let id = generate_id(prefix::COLLECTION);
            assert!(seen.insert(id), "duplicate id generated");
        }
    }

    #[test]
    fn ids_are_roughly_ordered() {
        // UUIDv7's timestamp prefix means ids minted in sequence compare
        // non-decreasing the vast majority of the time.
        let a = generate_id(prefix::DOCUMENT);
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = generate_id(prefix::DOCUMENT);
        assert!(a < b);
    }

    #[test]
    fn wrong_prefix_rejected() {
        let id = generate_id(prefix::SCHEMA);
        assert!(!has_prefix(&id, prefix::DOCUMENT));
    }
}
