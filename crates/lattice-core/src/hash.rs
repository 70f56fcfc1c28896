//! Deterministic hashing used for schema fingerprinting and index-table
//! naming (§4.2).

use md5::{Digest as Md5Digest, Md5};
use sha2::{Digest as Sha2Digest, Sha256};

/// Computes the canonical fingerprint of a schema's element set.
///
/// Elements are sorted by `(key asc, datatype asc)` before hashing so that
/// the same element set always produces the same fingerprint regardless of
/// the order in which the document's fields were traversed. Each element
/// contributes `"<key>:<datatype>;"` to the digest input.
pub fn schema_fingerprint<'a, I>(elements: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = elements.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(b.1)));

    let mut h = Sha256::new();
    for (key, datatype) in pairs {
        h.update(key.as_bytes());
        h.update(b":");
        h.update(datatype.as_bytes());
        h.update(b";");
    }
    format!("{:x}", h.finalize())
}

/// Derives the physical index-table name for a field path: `idx_<md5(path)>`.
pub fn index_table_name(path: &str) -> String {
    let mut h = Md5::new();
    h.update(path.as_bytes());
    format!("idx_{:x}", h.finalize())
}
