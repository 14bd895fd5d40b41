//! Concurrent operations against one store.

use std::collections::BTreeSet;
use std::time::Duration;

use campus_records::{Employee, MemoryMedium, RecordStore, Room, StoreError};

use crate::fixtures::{employee, room};
use crate::held::HeldMedium;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_with_distinct_keys_all_land() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .records::<Employee>()
                .insert(&employee(&format!("E{:02}", i), "Worker"))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.records::<Employee>().count().await.unwrap(), 32);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_inserts_on_one_key_admit_exactly_one() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();

    let mut handles = Vec::new();
    for capacity in 1..=16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .records::<Room>()
                .insert(&room("HALL", capacity, "Main"))
                .await
        }));
    }

    let mut inserted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => inserted += 1,
            Err(StoreError::DuplicateKey { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(store.records::<Room>().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writes_to_different_collections_proceed_independently() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();

    let employees = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                store
                    .records::<Employee>()
                    .insert(&employee(&format!("E{}", i), "Ani"))
                    .await
                    .unwrap();
            }
        })
    };
    let rooms = {
        let store = store.clone();
        tokio::spawn(async move {
            for i in 0..10 {
                store
                    .records::<Room>()
                    .insert(&room(&format!("R{}", i), 20, "B"))
                    .await
                    .unwrap();
            }
        })
    };
    employees.await.unwrap();
    rooms.await.unwrap();

    let keys: BTreeSet<String> = store
        .records::<Room>()
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(keys.len(), 10);
    assert_eq!(store.records::<Employee>().count().await.unwrap(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_partial_updates() {
    let store = RecordStore::open(MemoryMedium::new()).await.unwrap();
    store
        .records::<Room>()
        .insert(&room("LAB", 1, "C"))
        .await
        .unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for capacity in 2..50 {
                let next = room("LAB", capacity, &format!("C{}", capacity));
                store.records::<Room>().update("LAB", &next).await.unwrap();
            }
        })
    };

    for _ in 0..50 {
        let seen = store.records::<Room>().get("LAB").await.unwrap();
        if seen.capacity > 1 {
            assert_eq!(seen.building, format!("C{}", seen.capacity));
        }
    }
    writer.await.unwrap();
}

#[tokio::test]
async fn held_write_does_not_stall_the_runtime() {
    let (medium, mut holder) = HeldMedium::new("Room");
    let store = RecordStore::open(medium.clone()).await.unwrap();
    store.records::<Employee>().insert(&employee("E1", "Ani")).await.unwrap();
    medium.arm(true);

    let writer = {
        let store = store.clone();
        tokio::spawn(async move { store.records::<Room>().insert(&room("R1", 30, "A")).await })
    };
    holder.entered().await;

    let employees = tokio::time::timeout(Duration::from_secs(2), store.records::<Employee>().all())
        .await
        .expect("reading another collection must not wait for the held write")
        .unwrap();
    assert_eq!(employees.len(), 1);

    medium.arm(false);
    holder.release();
    writer.await.unwrap().unwrap();
    assert_eq!(store.records::<Room>().count().await.unwrap(), 1);
}
