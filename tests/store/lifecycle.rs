//! Reset and reopen behaviour.

use std::time::Duration;

use campus_records::{Collection, Employee, MemoryMedium, RecordStore, Room, Student, StoreError};

use crate::fixtures::{employee, room, student};
use crate::held::HeldMedium;

#[tokio::test]
async fn reset_empties_every_collection() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();
    store.records::<Employee>().insert(&employee("E1", "Ani")).await.unwrap();
    store.records::<Student>().insert(&student("S1", "Budi", "Law")).await.unwrap();
    store.records::<Room>().insert(&room("R1", 30, "A")).await.unwrap();

    let store = store.reset().await.unwrap();

    for collection in Collection::ALL {
        assert!(store.get_all(collection).await.unwrap().is_empty());
    }
    assert_eq!(store.version(), 1);
    assert_eq!(store.schema().collections.len(), 3);
}

#[tokio::test]
async fn reset_store_accepts_new_records() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();
    store.records::<Room>().insert(&room("R1", 30, "A")).await.unwrap();

    let store = store.reset().await.unwrap();
    store.records::<Room>().insert(&room("R1", 45, "B")).await.unwrap();
    assert_eq!(store.records::<Room>().get("R1").await.unwrap().capacity, 45);
}

#[tokio::test]
async fn stale_handles_fail_after_reset() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();
    let stale = store.clone();

    let fresh = store.reset().await.unwrap();

    assert!(!stale.is_open());
    assert!(fresh.is_open());
    let err = stale.get_all("Employee").await.unwrap_err();
    assert!(matches!(err, StoreError::StoreUnavailable(_)));
    assert!(stale.reset().await.is_err());
}

#[tokio::test]
async fn reopening_the_medium_sees_committed_writes() {
    let medium = MemoryMedium::new();
    {
        let store = RecordStore::open(medium.clone()).await.unwrap();
        store.records::<Employee>().insert(&employee("E1", "Ani")).await.unwrap();
    }

    let store = RecordStore::open(medium).await.unwrap();
    assert_eq!(store.records::<Employee>().get("E1").await.unwrap().name, "Ani");
}

#[tokio::test]
async fn reset_only_discards_its_own_database() {
    let medium = MemoryMedium::new();
    let main = RecordStore::open(medium.clone()).await.unwrap();
    let other = RecordStore::open_with(medium.clone(), "ARCHIVE", 1).await.unwrap();
    other.records::<Room>().insert(&room("OLD", 5, "Z")).await.unwrap();

    main.reset().await.unwrap();

    let archive = RecordStore::open_with(medium, "ARCHIVE", 1).await.unwrap();
    assert_eq!(archive.records::<Room>().count().await.unwrap(), 1);
}

#[tokio::test]
async fn handles_opened_separately_share_writes() {
    let medium = MemoryMedium::new();
    let first = RecordStore::open(medium.clone()).await.unwrap();
    let second = RecordStore::open(medium.clone()).await.unwrap();

    first.records::<Room>().insert(&room("R1", 30, "A")).await.unwrap();
    second.records::<Room>().insert(&room("R2", 20, "B")).await.unwrap();
    assert_eq!(second.records::<Room>().get("R1").await.unwrap().capacity, 30);
    drop((first, second));

    let reopened = RecordStore::open(medium).await.unwrap();
    let keys: Vec<_> = reopened
        .records::<Room>()
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|room| room.id)
        .collect();
    assert_eq!(keys, vec!["R1", "R2"]);
}

#[tokio::test]
async fn open_store_pins_its_version() {
    let medium = MemoryMedium::new();
    let _current = RecordStore::open_with(medium.clone(), "USTI", 2).await.unwrap();

    let older = RecordStore::open_with(medium.clone(), "USTI", 1).await.err().unwrap();
    assert_eq!(older, StoreError::VersionTooNew { stored: 2, requested: 1 });

    let newer = RecordStore::open_with(medium, "USTI", 3).await.err().unwrap();
    assert!(matches!(newer, StoreError::StoreUnavailable(_)));
}

#[tokio::test]
async fn open_after_reset_reaches_the_fresh_store() {
    let medium = MemoryMedium::new();
    let store = RecordStore::open(medium.clone()).await.unwrap();
    store.records::<Room>().insert(&room("R1", 30, "A")).await.unwrap();

    let fresh = store.reset().await.unwrap();
    let reopened = RecordStore::open(medium).await.unwrap();
    reopened.records::<Room>().insert(&room("R2", 10, "B")).await.unwrap();

    assert!(reopened.is_open());
    assert_eq!(fresh.records::<Room>().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reset_waits_for_writes_in_flight() {
    let (medium, mut holder) = HeldMedium::new("Room");
    let store = RecordStore::open(medium.clone()).await.unwrap();
    medium.arm(true);

    let writer = {
        let store = store.clone();
        tokio::spawn(async move { store.records::<Room>().insert(&room("R1", 30, "A")).await })
    };
    holder.entered().await;

    let resetting = {
        let store = store.clone();
        tokio::spawn(async move { store.reset().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!resetting.is_finished(), "reset must wait for the held write");

    let late = {
        let store = store.clone();
        tokio::spawn(async move { store.records::<Room>().insert(&room("R2", 10, "B")).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    medium.arm(false);
    holder.release();

    assert_eq!(writer.await.unwrap().unwrap(), "R1");
    let fresh = resetting.await.unwrap().unwrap();
    let err = late.await.unwrap().unwrap_err();
    assert!(matches!(err, StoreError::StoreUnavailable(_)), "{err}");

    assert_eq!(fresh.records::<Room>().count().await.unwrap(), 0);
    assert!(matches!(
        fresh.get_by_key("Room", "R1").await.unwrap_err(),
        StoreError::NotFound { .. }
    ));
}

#[tokio::test]
async fn failed_recreate_leaves_the_database_reopenable() {
    let medium = MemoryMedium::new();
    let store = RecordStore::open(medium.clone()).await.unwrap();
    store.records::<Room>().insert(&room("R1", 30, "A")).await.unwrap();

    medium.set_failing_writes(true);
    let err = store.reset().await.err().unwrap();
    assert!(err.is_unavailable());
    assert!(!store.is_open());

    medium.set_failing_writes(false);
    let reopened = RecordStore::open(medium).await.unwrap();
    assert!(reopened.is_open());
    assert_eq!(reopened.records::<Room>().count().await.unwrap(), 0);
}
