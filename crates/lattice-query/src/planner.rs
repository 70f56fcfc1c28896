//! Resolves a [`SearchQuery`] against a [`Repository`] (§4.7).
//!
//! One field maps to one physical index table (§3's `IndexTableMapping`),
//! so there is no single SQL statement to build the way
//! `beads_storage::sqlite::queries::get_ready_work_impl` assembles one
//! dynamic `WHERE` clause. Instead each filter is resolved to its own
//! document-id set and the sets are intersected in memory, mirroring that
//! same function's habit of combining independently-sourced predicate
//! fragments into one result -- just expressed as `HashSet` algebra instead
//! of additional SQL fragments.

use std::collections::HashSet;

use tracing::debug;

use lattice_core::model::Document;
use lattice_core::query::{Condition, OrderDirection, OrderKey, QueryResult, SearchQuery};
use lattice_storage::Repository;

use crate::error::Result;

/// Runs `query` against `repo`, implementing the seven steps of §4.7.
pub fn run(repo: &dyn Repository, query: &SearchQuery) -> Result<QueryResult> {
    debug!(
        collection_id = %query.collection_id,
        filters = query.filters.len(),
        "planning query"
    );
    let mut sets: Vec<HashSet<String>> = Vec::new();

    // Step 1 & 2: resolve each filter to its index table and scan it.
    for filter in &query.filters {
        match repo.find_index_mapping(&filter.field)? {
            Some(mapping) => {
                let ids = repo.scan_index_table(
                    &mapping.table_name,
                    filter.condition,
                    filter.value.as_deref(),
                )?;
                sets.push(ids);
            }
            None if filter.condition == Condition::IsNull => {
                // No mapping means no document anywhere has ever produced a
                // value at this path, so every document in the collection
                // vacuously satisfies IS NULL.
                let ids = repo
                    .list_documents_by_collection(&query.collection_id)?
                    .into_iter()
                    .map(|d| d.id)
                    .collect();
                sets.push(ids);
            }
            None => {
                // No mapping, and the filter isn't IS NULL: it matches the
                // empty set, and AND composition collapses the whole query.
                return Ok(QueryResult::new(Vec::new(), 0, query.skip));
            }
        }
    }

    // Step 4: label/tag filters.
    if !query.labels.is_empty() {
        sets.push(repo.documents_with_labels(&query.collection_id, &query.labels)?);
    }
    if !query.tags.is_empty() {
        sets.push(repo.documents_with_tags(&query.collection_id, &query.tags)?);
    }

    // Step 3: intersect every per-filter/label/tag set.
    let mut candidate: Option<HashSet<String>> = None;
    for set in sets {
        candidate = Some(match candidate {
            None => set,
            Some(acc) => acc.intersection(&set).cloned().collect(),
        });
    }

    let ids: Vec<String> = match candidate {
        Some(set) => set.into_iter().collect(),
        None => repo
            .list_documents_by_collection(&query.collection_id)?
            .into_iter()
            .map(|d| d.id)
            .collect(),
    };

    // Step 5: restrict to this collection. Index tables are shared across
    // collections, so a scanned id may belong to a different one.
    let mut documents: Vec<Document> = repo
        .get_documents_by_ids(&ids)?
        .into_iter()
        .filter(|d| d.collection_id == query.collection_id)
        .collect();

    if query.include_labels || query.include_tags {
        for doc in &mut documents {
            if query.include_labels {
                doc.labels = repo.get_labels(&doc.id)?;
            }
            if query.include_tags {
                doc.tags = repo.get_tags(lattice_storage::TagOwner::Document(doc.id.clone()))?;
            }
        }
    }

    let total_records = documents.len() as i64;

    // Step 6: order, then paginate.
    sort_documents(&mut documents, query.order_by, query.order_dir);
    let skip = query.skip.max(0) as usize;
    let paginated: Vec<Document> = documents.into_iter().skip(skip).take(query.max_results.max(0) as usize).collect();

    Ok(QueryResult::new(paginated, total_records, query.skip))
}

/// Parses `sql` and runs it against `collection_id`.
pub fn run_sql(repo: &dyn Repository, collection_id: &str, sql: &str) -> Result<QueryResult> {
    let mut query = lattice_core::sql::parse(sql)?;
    query.collection_id = collection_id.to_string();
    run(repo, &query)
}

fn sort_documents(documents: &mut [Document], key: OrderKey, dir: OrderDirection) {
    documents.sort_by(|a, b| {
        let ord = match key {
            OrderKey::CreatedUtc => a.created_at.cmp(&b.created_at),
            OrderKey::LastUpdateUtc => a.updated_at.cmp(&b.updated_at),
            OrderKey::Name => a.name.cmp(&b.name),
        };
        match dir {
            OrderDirection::Asc => ord,
            OrderDirection::Desc => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::idgen;
    use lattice_core::model::{Collection, IndexTableMapping, IndexedValue, Schema};
    use lattice_core::query::Filter;
    use lattice_storage::SqliteRepository;
    use std::path::PathBuf;

    fn setup_with_field(path: &str) -> (SqliteRepository, String, String) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let collection = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        repo.create_collection(&collection).unwrap();
        let schema = Schema::new("h".into());
        repo.create_schema(&schema, &[]).unwrap();

        let mapping = IndexTableMapping::new(path);
        repo.create_index_mapping(&mapping).unwrap();
        repo.ensure_index_table(&mapping.table_name).unwrap();

        (repo, collection.id, schema.id)
    }

    fn insert_doc(repo: &SqliteRepository, collection_id: &str, schema_id: &str, table: &str, value: &str) -> String {
        let doc = lattice_core::model::Document::new(collection_id, schema_id, 1, "h".into());
        repo.create_document(&doc).unwrap();
        repo.insert_index_values(
            table,
            &[IndexedValue::new(doc.id.clone(), None, Some(value.to_string()))],
        )
        .unwrap();
        doc.id
    }

    #[test]
    fn eq_filter_matches_expected_documents() {
        let (repo, collection_id, schema_id) = setup_with_field("category");
        let mapping = repo.find_index_mapping("category").unwrap().unwrap();
        let a = insert_doc(&repo, &collection_id, &schema_id, &mapping.table_name, "a");
        let _b = insert_doc(&repo, &collection_id, &schema_id, &mapping.table_name, "b");

        let mut query = SearchQuery::for_collection(collection_id);
        query.filters.push(Filter {
            field: "category".into(),
            condition: Condition::Eq,
            value: Some("a".into()),
        });

        let result = run(&repo, &query).unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].id, a);
        assert_eq!(result.total_records, 1);
    }

    #[test]
    fn unmapped_field_with_non_null_condition_is_empty() {
        let (repo, collection_id, _schema_id) = setup_with_field("category");
        let mut query = SearchQuery::for_collection(collection_id);
        query.filters.push(Filter {
            field: "nonexistent".into(),
            condition: Condition::Eq,
            value: Some("x".into()),
        });
        let result = run(&repo, &query).unwrap();
        assert!(result.documents.is_empty());
        assert_eq!(result.total_records, 0);
    }

    #[test]
    fn unmapped_field_is_null_matches_everything() {
        let (repo, collection_id, schema_id) = setup_with_field("category");
        let mapping = repo.find_index_mapping("category").unwrap().unwrap();
        insert_doc(&repo, &collection_id, &schema_id, &mapping.table_name, "a");

        let mut query = SearchQuery::for_collection(collection_id);
        query.filters.push(Filter {
            field: "never_indexed".into(),
            condition: Condition::IsNull,
            value: None,
        });
        let result = run(&repo, &query).unwrap();
        assert_eq!(result.documents.len(), 1);
    }

    #[test]
    fn and_composition_intersects() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let collection = Collection::new("widgets", PathBuf::from("/tmp/widgets"));
        repo.create_collection(&collection).unwrap();
        let schema = Schema::new("h".into());
        repo.create_schema(&schema, &[]).unwrap();

        let cat_mapping = IndexTableMapping::new("category");
        repo.create_index_mapping(&cat_mapping).unwrap();
        repo.ensure_index_table(&cat_mapping.table_name).unwrap();
        let active_mapping = IndexTableMapping::new("active");
        repo.create_index_mapping(&active_mapping).unwrap();
        repo.ensure_index_table(&active_mapping.table_name).unwrap();

        let doc = lattice_core::model::Document::new(&collection.id, &schema.id, 1, "h".into());
        repo.create_document(&doc).unwrap();
        repo.insert_index_values(
            &cat_mapping.table_name,
            &[IndexedValue::new(doc.id.clone(), None, Some("a".into()))],
        )
        .unwrap();
        repo.insert_index_values(
            &active_mapping.table_name,
            &[IndexedValue::new(doc.id.clone(), None, Some("true".into()))],
        )
        .unwrap();

        let other = lattice_core::model::Document::new(&collection.id, &schema.id, 1, "h".into());
        repo.create_document(&other).unwrap();
        repo.insert_index_values(
            &cat_mapping.table_name,
            &[IndexedValue::new(other.id.clone(), None, Some("a".into()))],
        )
        .unwrap();
        repo.insert_index_values(
            &active_mapping.table_name,
            &[IndexedValue::new(other.id.clone(), None, Some("false".into()))],
        )
        .unwrap();

        let mut query = SearchQuery::for_collection(collection.id.clone());
        query.filters.push(Filter {
            field: "category".into(),
            condition: Condition::Eq,
            value: Some("a".into()),
        });
        query.filters.push(Filter {
            field: "active".into(),
            condition: Condition::Eq,
            value: Some("true".into()),
        });

        let result = run(&repo, &query).unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].id, doc.id);
    }

    #[test]
    fn pagination_applies_skip_and_limit() {
        let (repo, collection_id, schema_id) = setup_with_field("category");
        let mapping = repo.find_index_mapping("category").unwrap().unwrap();
        for _ in 0..5 {
            insert_doc(&repo, &collection_id, &schema_id, &mapping.table_name, "a");
        }
        let mut query = SearchQuery::for_collection(collection_id);
        query.filters.push(Filter {
            field: "category".into(),
            condition: Condition::Eq,
            value: Some("a".into()),
        });
        query.max_results = 2;
        query.skip = 1;

        let result = run(&repo, &query).unwrap();
        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.total_records, 5);
        assert!(!result.end_of_results);
    }

    #[test]
    fn run_sql_parses_and_executes() {
        let (repo, collection_id, schema_id) = setup_with_field("category");
        let mapping = repo.find_index_mapping("category").unwrap().unwrap();
        insert_doc(&repo, &collection_id, &schema_id, &mapping.table_name, "a");

        let result = run_sql(&repo, &collection_id, "WHERE category = 'a'").unwrap();
        assert_eq!(result.documents.len(), 1);
    }

    #[test]
    fn unique_generated_ids_do_not_collide_in_test_fixtures() {
        let a = idgen::generate_id(idgen::prefix::DOCUMENT);
        let b = idgen::generate_id(idgen::prefix::DOCUMENT);
        assert_ne!(a, b);
    }
}
