//! Integration tests for form submission through the application state.

use campus_records::app::{submit, AppState, Section, Submitted};
use campus_records::{MemoryMedium, RecordStore, StoreError};
use serde_json::json;

async fn store() -> RecordStore<MemoryMedium> {
    RecordStore::open(MemoryMedium::new()).await.unwrap()
}

#[tokio::test]
async fn adding_inserts_into_current_section() {
    let store = store().await;
    let mut state = AppState::new();
    state.switch_section(Section::Student);
    state.begin_add();

    let outcome = submit(
        &store,
        &mut state,
        json!({ "id": "S1", "name": "Budi", "program": "Law" }),
    )
    .await
    .unwrap();

    assert_eq!(outcome, Submitted::Inserted("S1".into()));
    assert_eq!(store.get_by_key("Student", "S1").await.unwrap()["name"], "Budi");
    assert!(store.get_all("Employee").await.unwrap().is_empty());
}

#[tokio::test]
async fn adding_without_key_is_rejected() {
    let store = store().await;
    let mut state = AppState::new();

    let err = submit(&store, &mut state, json!({ "id": "", "name": "Ani" }))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidRecord { .. }));
    assert!(store.get_all("Employee").await.unwrap().is_empty());
}

#[tokio::test]
async fn editing_keeps_the_original_key() {
    let store = store().await;
    let mut state = AppState::new();
    state.switch_section(Section::Room);
    submit(
        &store,
        &mut state,
        json!({ "id": "R1", "facilities": "AC", "capacity": 20, "building": "A" }),
    )
    .await
    .unwrap();

    state.begin_edit("R1");
    let outcome = submit(
        &store,
        &mut state,
        json!({ "id": "R2", "facilities": "AC", "capacity": 35, "building": "A" }),
    )
    .await
    .unwrap();

    assert_eq!(outcome, Submitted::Updated("R1".into()));
    assert_eq!(state.editing(), None);
    assert_eq!(store.get_by_key("Room", "R1").await.unwrap()["capacity"], 35);
    assert!(store.get_by_key("Room", "R2").await.is_err());
}

#[tokio::test]
async fn failed_edit_keeps_the_session() {
    let store = store().await;
    let mut state = AppState::new();
    state.begin_edit("E404");

    let err = submit(&store, &mut state, json!({ "name": "Ghost" }))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert_eq!(state.editing(), Some("E404"));
}
