use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{ScrapeError, StoreError};

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    pub progress: bool,
}

/// Outcome counts for one pool run. Every dequeued item is counted as completed,
/// whether its work succeeded or not.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PoolStats {
    pub submitted: usize,
    pub completed: usize,
    pub ok: usize,
    pub failed: usize,
    /// Items still queued when the run was cancelled.
    pub cancelled: usize,
    pub failures: Vec<(String, String)>,
}

struct Completion<T> {
    label: String,
    result: Result<T, ScrapeError>,
}

fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Run `op` over `items` on a fixed number of long-lived workers sharing one FIFO queue.
///
/// Workers only stage results: each `Ok` value is handed to `sink` on the calling
/// task, so a single writer owns the store. A failed or panicking item is recorded
/// and still counted as completed. Cancellation is checked around each dequeue; an
/// item taken after cancellation is dropped and reported as cancelled. A `sink` error
/// stops the workers and is returned.
pub async fn run<I, T, F, Fut, S>(
    config: &PoolConfig,
    items: Vec<I>,
    cancel: &CancellationToken,
    op: F,
    mut sink: S,
) -> Result<PoolStats, StoreError>
where
    I: Display + Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ScrapeError>> + Send + 'static,
    S: FnMut(T) -> Result<(), StoreError>,
{
    let submitted = items.len();
    let mut stats = PoolStats { submitted, ..PoolStats::default() };
    if submitted == 0 {
        return Ok(stats);
    }

    let (queue_tx, queue_rx) = mpsc::unbounded_channel::<I>();
    for item in items {
        // receiver is alive until the workers are spawned
        let _ = queue_tx.send(item);
    }
    drop(queue_tx);
    let queue = Arc::new(Mutex::new(queue_rx));

    let workers = config.workers.max(1).min(submitted);
    let (done_tx, mut done_rx) = mpsc::channel::<Completion<T>>(workers * 2);
    let op = Arc::new(op);
    let stop = cancel.child_token();

    let mut handles = JoinSet::new();
    for _ in 0..workers {
        let queue = Arc::clone(&queue);
        let done_tx = done_tx.clone();
        let op = Arc::clone(&op);
        let stop = stop.clone();

        handles.spawn(async move {
            loop {
                if stop.is_cancelled() {
                    break;
                }
                let next = queue.lock().await.recv().await;
                let Some(item) = next else {
                    break;
                };
                // stopped while waiting for the queue: leave the item uncounted
                if stop.is_cancelled() {
                    break;
                }
                let label = item.to_string();
                let task = {
                    let op = Arc::clone(&op);
                    tokio::spawn(async move { op(item).await })
                };
                let result = match task.await {
                    Ok(result) => result,
                    Err(e) => Err(ScrapeError::Task(e.to_string())),
                };
                if done_tx.send(Completion { label, result }).await.is_err() {
                    break;
                }
            }
        });
    }
    // Drop our copy so done_rx closes once every worker has exited
    drop(done_tx);

    let pb = progress_bar(submitted, config.progress);
    let mut fatal = None;

    while let Some(done) = done_rx.recv().await {
        stats.completed += 1;
        pb.inc(1);
        match done.result {
            Ok(value) => {
                if let Err(e) = sink(value) {
                    error!("Failed to stage {}: {}", done.label, e);
                    fatal = Some(e);
                    stop.cancel();
                    break;
                }
                stats.ok += 1;
            }
            Err(e) => {
                warn!("{} failed: {}", done.label, e);
                stats.failed += 1;
                stats.failures.push((done.label, e.to_string()));
            }
        }
    }
    drop(done_rx);

    while let Some(joined) = handles.join_next().await {
        if let Err(e) = joined {
            error!("Worker exited abnormally: {}", e);
        }
    }
    pb.finish_and_clear();

    if let Some(e) = fatal {
        return Err(e);
    }

    stats.cancelled = submitted - stats.completed;
    info!(
        "Pool finished: {} submitted, {} ok, {} failed, {} cancelled",
        stats.submitted, stats.ok, stats.failed, stats.cancelled
    );
    Ok(stats)
}
