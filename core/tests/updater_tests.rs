use scour_core::index::Document;
use scour_core::manager::IndexManager;
use scour_core::updater::{RealtimeUpdater, UpdateTask};
use std::sync::Arc;
use tempfile::tempdir;

fn doc(url: &str, tokens: &[&str]) -> Document {
    Document {
        id: 0,
        url: url.to_string(),
        title: url.to_string(),
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_producers_lose_no_updates() {
    let dir = tempdir().unwrap();
    let manager = Arc::new(IndexManager::new(dir.path()));
    let updater = RealtimeUpdater::start(Arc::clone(&manager), 64);

    let mut producers = Vec::new();
    for p in 0..8 {
        let sender = updater.sender();
        producers.push(tokio::spawn(async move {
            for i in 0..125 {
                let url = format!("http://p{p}.test/doc{i}");
                sender
                    .enqueue(UpdateTask::Add(doc(&url, &["alpha", "beta", "beta"])))
                    .await
                    .unwrap();
            }
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }
    updater.stop().await;

    assert_eq!(manager.document_count(), 1000);
    for p in 0..8 {
        let d = manager
            .document_by_url(&format!("http://p{p}.test/doc42"))
            .unwrap();
        assert_eq!(d.tokens, vec!["alpha", "beta", "beta"]);
    }
    // Every document matches, none was dropped or duplicated.
    assert_eq!(manager.search("alpha").unwrap().len(), 1000);
}

#[tokio::test]
async fn tasks_apply_in_enqueue_order() {
    let dir = tempdir().unwrap();
    let manager = Arc::new(IndexManager::new(dir.path()));
    let updater = RealtimeUpdater::start(Arc::clone(&manager), 16);

    updater
        .enqueue(UpdateTask::Add(doc("http://a.test/", &["one"])))
        .await
        .unwrap();
    updater
        .enqueue(UpdateTask::Add(doc("http://b.test/", &["stays"])))
        .await
        .unwrap();
    updater
        .enqueue(UpdateTask::Update(doc("http://a.test/", &["two"])))
        .await
        .unwrap();
    updater
        .enqueue(UpdateTask::Delete {
            url: "http://b.test/".to_string(),
        })
        .await
        .unwrap();
    updater.stop().await;

    assert_eq!(manager.document_count(), 1);
    let a = manager.document_by_url("http://a.test/").unwrap();
    assert_eq!(a.tokens, vec!["two"]);
    assert!(manager.document_by_url("http://b.test/").is_err());
}

#[tokio::test]
async fn poison_task_does_not_stall_the_consumer() {
    let dir = tempdir().unwrap();
    let manager = Arc::new(IndexManager::new(dir.path()));
    let updater = RealtimeUpdater::start(Arc::clone(&manager), 16);

    updater
        .enqueue(UpdateTask::Delete {
            url: "http://never-indexed.test/".to_string(),
        })
        .await
        .unwrap();
    updater
        .enqueue(UpdateTask::Add(doc("http://a.test/", &["alpha"])))
        .await
        .unwrap();
    updater.stop().await;

    assert_eq!(manager.document_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_drains_every_queued_task() {
    let dir = tempdir().unwrap();
    let manager = Arc::new(IndexManager::new(dir.path()));
    // Deliberately tiny queue so producers hit backpressure.
    let updater = RealtimeUpdater::start(Arc::clone(&manager), 4);

    for i in 0..50 {
        updater
            .enqueue(UpdateTask::Add(doc(
                &format!("http://drain.test/{i}"),
                &["alpha"],
            )))
            .await
            .unwrap();
    }
    updater.stop().await;

    assert_eq!(manager.document_count(), 50);
}

#[tokio::test]
async fn enqueue_after_stop_fails_cleanly() {
    let dir = tempdir().unwrap();
    let manager = Arc::new(IndexManager::new(dir.path()));
    let updater = RealtimeUpdater::start(Arc::clone(&manager), 4);
    let sender = updater.sender();
    updater.stop().await;

    let result = sender
        .enqueue(UpdateTask::Add(doc("http://late.test/", &["alpha"])))
        .await;
    assert!(result.is_err());
}
