//! Background job queue.
//!
//! A single worker task consumes thumbnail requests from an unbounded
//! channel. Enqueuing is fire-and-forget: the request that triggered the
//! job never waits on it and never sees its outcome. Failed jobs are logged
//! and dropped; re-running a job is safe because thumbnail generation is
//! idempotent.

pub mod thumbnail;

use std::path::PathBuf;
use tokio::sync::mpsc;

/// Thumbnail generation request
#[derive(Debug)]
pub struct ThumbnailJob {
    pub source_path: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
}

/// Handle for submitting jobs to the worker
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<ThumbnailJob>,
}

impl JobQueue {
    /// Spawn the worker task and return a handle to it
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx));
        Self { tx }
    }

    /// Hand a job to the worker without waiting for it
    pub fn enqueue(&self, job: ThumbnailJob) {
        if let Err(e) = self.tx.send(job) {
            tracing::error!("Job queue is gone, dropping thumbnail job: {}", e);
        }
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<ThumbnailJob>) {
    tracing::info!("Thumbnail worker started");

    while let Some(job) = rx.recv().await {
        let source = job.source_path.clone();
        let result = tokio::task::spawn_blocking(move || {
            thumbnail::ensure_thumbnail(&job.source_path, job.max_width, job.max_height)
        })
        .await;

        match result {
            Ok(Ok(path)) => {
                tracing::debug!("Thumbnail ready at {:?}", path);
            }
            Ok(Err(e)) => {
                tracing::warn!("Thumbnail generation failed for {:?}: {}", source, e);
            }
            Err(e) => {
                tracing::error!("Thumbnail task panicked for {:?}: {}", source, e);
            }
        }
    }

    tracing::info!("Thumbnail worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::time::Duration;

    #[tokio::test]
    async fn enqueued_job_eventually_produces_a_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        RgbImage::new(300, 200).save(&source).unwrap();

        let queue = JobQueue::start();
        queue.enqueue(ThumbnailJob {
            source_path: source.clone(),
            max_width: 100,
            max_height: 100,
        });

        let expected = thumbnail::thumbnail_path(&source);
        for _ in 0..100 {
            if expected.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("thumbnail was never generated at {:?}", expected);
    }

    #[tokio::test]
    async fn failed_job_does_not_kill_the_worker() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let source = dir.path().join("ok.png");
        RgbImage::new(300, 200).save(&source).unwrap();

        let queue = JobQueue::start();
        queue.enqueue(ThumbnailJob {
            source_path: missing,
            max_width: 100,
            max_height: 100,
        });
        queue.enqueue(ThumbnailJob {
            source_path: source.clone(),
            max_width: 100,
            max_height: 100,
        });

        let expected = thumbnail::thumbnail_path(&source);
        for _ in 0..100 {
            if expected.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("worker stopped processing after a failed job");
    }
}
