//! Contract tests: every backend must behave the same through
//! `ViewModelReader` and `ViewModelWriter`.

mod entities;

mod document_store;
mod shared_state;

mod in_memory {
    repository_contract!(viewmodels::InMemoryViewModelRepository::new());
}

mod application_state {
    repository_contract!(viewmodels::state::repository(std::sync::Arc::new(
        viewmodels::state::ApplicationState::new()
    )));
}

mod embedded_document_store {
    repository_contract!(viewmodels::document::repository(
        viewmodels::document::EmbeddedDocumentStore::new()
    ));
}
