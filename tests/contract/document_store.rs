//! Behavior specific to the document-store backend: stale indexes, paged
//! sweeps and conflict causes.

use std::error::Error;

use viewmodels::document::{
    self, DocumentStoreConfig, DocumentViewModelWriter, EmbeddedDocumentStore, IndexingMode,
    SweepOptions, SWEEP_PAGE_SIZE,
};
use viewmodels::{Query, StoreError, ViewModelReader, ViewModelWriter};

use crate::entities::TestEntity1;

fn deferred_store() -> EmbeddedDocumentStore {
    EmbeddedDocumentStore::with_config(
        DocumentStoreConfig::default().with_indexing(IndexingMode::Deferred),
    )
}

#[test]
fn loads_are_current_while_queries_are_stale() {
    let store = deferred_store();
    let repo = document::repository(store.clone());
    repo.add("woftam", TestEntity1::new("woftam", "hello")).unwrap();

    assert!(repo.get_by_key::<TestEntity1>("woftam").unwrap().is_some());
    assert!(repo.query(&Query::<TestEntity1>::new()).unwrap().is_empty());

    let fresh = repo
        .query(&Query::<TestEntity1>::new().wait_for_non_stale_results())
        .unwrap();
    assert_eq!(fresh, vec![TestEntity1::new("woftam", "hello")]);
    assert_eq!(store.pending_index_updates().unwrap(), 0);
}

#[test]
fn sweeps_wait_for_the_index() {
    let repo = document::repository(deferred_store());
    for i in 0..10 {
        let key = format!("id{}", i);
        repo.add(&key, TestEntity1::new(&key, "match")).unwrap();
    }

    let updated = repo
        .update_where(
            |e: &TestEntity1| e.field1 == "match",
            |e: &mut TestEntity1| e.field1 = "new".into(),
        )
        .unwrap();

    assert_eq!(updated, 10);
    assert_eq!(
        repo.get_by_key::<TestEntity1>("id7").unwrap(),
        Some(TestEntity1::new("id7", "new"))
    );
}

#[test]
fn sweep_crosses_page_boundaries() {
    let store = EmbeddedDocumentStore::new();
    let repo = document::repository(store.clone());
    let total = SWEEP_PAGE_SIZE * 2 + 7;
    for i in 0..total {
        let key = format!("id{:05}", i);
        repo.add(&key, TestEntity1::new(&key, "match")).unwrap();
    }

    assert_eq!(repo.delete_where(|_: &TestEntity1| true).unwrap(), total);
    assert_eq!(store.document_count().unwrap(), 0);
}

#[test]
fn small_sweep_pages_visit_every_row_once() {
    let store = EmbeddedDocumentStore::new();
    let repo = document::repository(store.clone());
    for i in 0..23 {
        let key = format!("id{:02}", i);
        repo.add(&key, TestEntity1::new(&key, "0")).unwrap();
    }

    let writer = DocumentViewModelWriter::with_options(
        store,
        SweepOptions::default().with_page_size(5),
    );
    let updated = writer
        .update_where(
            |_: &TestEntity1| true,
            |e: &mut TestEntity1| {
                let n: u32 = e.field1.parse().unwrap();
                e.field1 = (n + 1).to_string();
            },
        )
        .unwrap();

    assert_eq!(updated, 23);
    let all = repo
        .query(&Query::<TestEntity1>::new().wait_for_non_stale_results())
        .unwrap();
    assert_eq!(all.len(), 23);
    assert!(all.iter().all(|e| e.field1 == "1"));
}

#[test]
fn query_results_are_capped_by_the_store() {
    let store = EmbeddedDocumentStore::with_config(
        DocumentStoreConfig::default().with_default_page_size(4),
    );
    let repo = document::repository(store);
    for i in 0..10 {
        let key = format!("id{}", i);
        repo.add(&key, TestEntity1::new(&key, "x")).unwrap();
    }

    assert_eq!(repo.query(&Query::<TestEntity1>::new()).unwrap().len(), 4);
    assert_eq!(
        repo.query(&Query::<TestEntity1>::new().take(8)).unwrap().len(),
        8
    );
}

#[test]
fn duplicate_key_carries_the_store_conflict() {
    let repo = document::repository(EmbeddedDocumentStore::new());
    repo.add("woftam", TestEntity1::new("woftam", "hello")).unwrap();

    let err = repo
        .add("woftam", TestEntity1::new("woftam", "hello2"))
        .unwrap_err();
    assert!(err.is_duplicate_key());

    let cause = err
        .source()
        .and_then(|source| source.downcast_ref::<StoreError>())
        .unwrap();
    assert!(matches!(cause, StoreError::Conflict { .. }));
}

#[test]
fn document_ids_follow_the_identity_scheme() {
    let store = EmbeddedDocumentStore::new();
    let repo = document::repository(store.clone());
    repo.add("woftam", TestEntity1::new("woftam", "hello")).unwrap();

    let id = viewmodels::make_identifier::<TestEntity1>("woftam");
    assert_eq!(id, "contract::entities::TestEntity1/woftam");

    let parsed = viewmodels::Identifier::parse(&id).unwrap();
    assert_eq!(parsed.key(), "woftam");
    assert_eq!(store.document_count().unwrap(), 1);
}
