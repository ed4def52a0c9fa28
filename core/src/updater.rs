use crate::error::{EngineError, Result};
use crate::index::Document;
use crate::manager::IndexManager;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// A queued index mutation. Tasks are applied strictly in enqueue order.
#[derive(Debug)]
pub enum UpdateTask {
    Add(Document),
    Update(Document),
    Delete { url: String },
}

/// Cloneable producer handle onto the update queue.
#[derive(Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<UpdateTask>,
}

impl UpdateSender {
    /// Append a task. Waits when the queue is at capacity; fails only once
    /// the updater has been stopped.
    pub async fn enqueue(&self, task: UpdateTask) -> Result<()> {
        self.tx
            .send(task)
            .await
            .map_err(|_| EngineError::QueueClosed)
    }
}

/// Serializes all index mutations through one consumer task, so the manager
/// never faces concurrent writers. Producers (crawler workers, API handlers)
/// only ever hold an [`UpdateSender`].
pub struct RealtimeUpdater {
    tx: mpsc::Sender<UpdateTask>,
    shutdown: oneshot::Sender<()>,
    consumer: JoinHandle<()>,
}

impl RealtimeUpdater {
    /// Spawn the consumer loop over a bounded queue.
    pub fn start(manager: Arc<IndexManager>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<UpdateTask>(capacity);
        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();

        let consumer = tokio::spawn(async move {
            let apply = |task: UpdateTask| {
                if let Err(err) = manager.apply(task) {
                    // A poison task must not stall indexing; log and move on.
                    tracing::warn!(%err, "update task failed, skipping");
                }
            };

            loop {
                tokio::select! {
                    maybe = rx.recv() => match maybe {
                        Some(task) => apply(task),
                        None => return,
                    },
                    _ = &mut shutdown_rx => break,
                }
            }

            // Stop requested: refuse new tasks, then drain what is queued.
            rx.close();
            while let Some(task) = rx.recv().await {
                apply(task);
            }
            tracing::debug!("update queue drained, consumer exiting");
        });

        Self {
            tx,
            shutdown,
            consumer,
        }
    }

    pub fn sender(&self) -> UpdateSender {
        UpdateSender {
            tx: self.tx.clone(),
        }
    }

    pub async fn enqueue(&self, task: UpdateTask) -> Result<()> {
        self.tx
            .send(task)
            .await
            .map_err(|_| EngineError::QueueClosed)
    }

    /// Ask the consumer to stop and wait for it. Every task already enqueued
    /// is applied before the consumer exits; enqueues arriving after the stop
    /// request fail with `QueueClosed`.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        drop(self.tx);
        if let Err(err) = self.consumer.await {
            tracing::warn!(%err, "update consumer terminated abnormally");
        }
    }
}
