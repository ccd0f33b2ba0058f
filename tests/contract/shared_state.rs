//! Behavior specific to the shared-state backend.

use std::sync::Arc;

use viewmodels::state::{self, ApplicationState, StateContainer, StateViewModelReader};
use viewmodels::{Query, RepositoryError, ViewModel, ViewModelReader, ViewModelWriter};

use crate::entities::{TestEntity1, TestEntity2};

#[test]
fn partitions_live_in_the_host_container() {
    let host = Arc::new(ApplicationState::new());
    let repo = state::repository(Arc::clone(&host));

    repo.add("woftam", TestEntity1::new("woftam", "hello")).unwrap();
    repo.add("woftam", TestEntity2::new("woftam", 1)).unwrap();

    assert_eq!(host.len(), 2);
    assert!(host.get(TestEntity1::NAMESPACE).is_some());
    assert!(host.get(TestEntity2::NAMESPACE).is_some());
}

#[test]
fn separate_repositories_over_one_container_share_data() {
    let host = Arc::new(ApplicationState::new());
    let writer_side = state::repository(Arc::clone(&host));
    let reader = StateViewModelReader::new(host);

    writer_side
        .add("woftam", TestEntity1::new("woftam", "hello"))
        .unwrap();
    assert_eq!(
        reader.get_by_key::<TestEntity1>("woftam").unwrap(),
        Some(TestEntity1::new("woftam", "hello"))
    );
}

#[test]
fn parallel_update_where_touches_every_match() {
    let repo = state::repository(Arc::new(ApplicationState::new()));
    for i in 0..1000 {
        repo.add(&i.to_string(), TestEntity2::new(&i.to_string(), i)).unwrap();
    }

    let updated = repo
        .update_where(|e: &TestEntity2| e.field2 >= 500, |e: &mut TestEntity2| e.field2 = -1)
        .unwrap();

    assert_eq!(updated, 500);
    let reset = repo
        .query(&Query::new().filter(|e: &TestEntity2| e.field2 == -1))
        .unwrap();
    assert_eq!(reset.len(), 500);
}

#[test]
fn foreign_value_in_the_container_is_a_namespace_conflict() {
    let host = Arc::new(ApplicationState::new());
    host.set(TestEntity1::NAMESPACE, Arc::new(42_u32));
    let repo = state::repository(host);

    let err = repo.get_by_key::<TestEntity1>("woftam").unwrap_err();
    assert_eq!(
        err,
        RepositoryError::NamespaceConflict {
            namespace: TestEntity1::NAMESPACE
        }
    );
}
