//! Non-blocking hand-off of verification emails to the notifier
//!
//! Jobs go through a bounded queue drained by a single worker task. For every
//! attempt the worker re-reads the code store and drops the job when the record
//! it announces is no longer the active one, so an email is never sent for a
//! code that a later issue has already replaced.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use pv_shared::email::mask_email;

use crate::errors::DeliveryError;
use crate::repositories::CodeStore;

use super::config::DispatcherConfig;
use super::traits::Notifier;
use super::types::{DispatchJob, DispatchStats};

#[derive(Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
    superseded: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            superseded: self.superseded.load(Ordering::SeqCst),
        }
    }
}

/// Handle to the dispatch queue and its worker task
pub struct NotificationDispatcher {
    sender: mpsc::Sender<DispatchJob>,
    worker: JoinHandle<()>,
    counters: Arc<Counters>,
}

impl NotificationDispatcher {
    /// Spawn the worker task on the current tokio runtime
    ///
    /// # Arguments
    ///
    /// * `store` - Store consulted to skip superseded jobs
    /// * `notifier` - Email collaborator
    /// * `config` - Retry and queueing policy
    pub fn spawn<S, N>(store: Arc<S>, notifier: Arc<N>, config: DispatcherConfig) -> Self
    where
        S: CodeStore + ?Sized + 'static,
        N: Notifier + ?Sized + 'static,
    {
        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let counters = Arc::new(Counters::default());

        let worker = tokio::spawn(run_worker(
            receiver,
            store,
            notifier,
            config,
            counters.clone(),
        ));

        Self {
            sender,
            worker,
            counters,
        }
    }

    /// Queue a job without waiting
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The job is queued
    /// * `Err(DeliveryError::QueueFull)` - The queue is at capacity
    /// * `Err(DeliveryError::DispatcherClosed)` - The worker has stopped
    pub fn enqueue(&self, job: DispatchJob) -> Result<(), DeliveryError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::DispatcherClosed,
        })
    }

    /// Snapshot of the worker counters
    pub fn stats(&self) -> DispatchStats {
        self.counters.snapshot()
    }

    /// Stop accepting jobs and wait until every queued job is finished
    pub async fn shutdown(self) -> DispatchStats {
        let Self {
            sender,
            worker,
            counters,
        } = self;
        drop(sender);
        if let Err(e) = worker.await {
            error!(error = %e, "Notification worker terminated abnormally");
        }
        counters.snapshot()
    }
}

async fn run_worker<S, N>(
    mut receiver: mpsc::Receiver<DispatchJob>,
    store: Arc<S>,
    notifier: Arc<N>,
    config: DispatcherConfig,
    counters: Arc<Counters>,
) where
    S: CodeStore + ?Sized,
    N: Notifier + ?Sized,
{
    info!(
        provider = notifier.provider_name(),
        max_attempts = config.max_attempts,
        "Notification dispatcher started"
    );

    while let Some(job) = receiver.recv().await {
        deliver(&job, store.as_ref(), notifier.as_ref(), &config, &counters).await;
    }

    debug!("Notification dispatcher queue closed");
}

async fn deliver<S, N>(
    job: &DispatchJob,
    store: &S,
    notifier: &N,
    config: &DispatcherConfig,
    counters: &Counters,
) where
    S: CodeStore + ?Sized,
    N: Notifier + ?Sized,
{
    let recipient = mask_email(&job.recipient);
    let template = job.purpose.template_name();
    let mut last_error = DeliveryError::Timeout;

    for attempt in 1..=config.max_attempts {
        if !is_current(job, store).await {
            debug!(
                recipient = %recipient,
                purpose = %job.purpose,
                record_id = %job.record_id,
                event = "notification_superseded",
                "Skipping email for a code that is no longer active"
            );
            counters.superseded.fetch_add(1, Ordering::SeqCst);
            return;
        }

        let result = tokio::time::timeout(
            config.send_timeout,
            notifier.send(&job.recipient, template, &job.variables),
        )
        .await
        .unwrap_or(Err(DeliveryError::Timeout));

        match result {
            Ok(()) => {
                info!(
                    recipient = %recipient,
                    purpose = %job.purpose,
                    attempt = attempt,
                    event = "notification_delivered",
                    "Verification email handed to {}",
                    notifier.provider_name()
                );
                counters.delivered.fetch_add(1, Ordering::SeqCst);
                return;
            }
            Err(e) => {
                let retry = e.is_retryable() && attempt < config.max_attempts;
                warn!(
                    recipient = %recipient,
                    purpose = %job.purpose,
                    attempt = attempt,
                    error = %e,
                    will_retry = retry,
                    "Verification email attempt failed"
                );
                last_error = e;
                if !retry {
                    break;
                }
                tokio::time::sleep(config.backoff_for(attempt)).await;
            }
        }
    }

    error!(
        recipient = %recipient,
        purpose = %job.purpose,
        record_id = %job.record_id,
        error = %last_error,
        event = "notification_delivery_failed",
        "Giving up on verification email; the issued code stays valid"
    );
    counters.failed.fetch_add(1, Ordering::SeqCst);
}

/// Whether the job still announces the active record for its key
async fn is_current<S>(job: &DispatchJob, store: &S) -> bool
where
    S: CodeStore + ?Sized,
{
    match store.get(&job.recipient, job.purpose).await {
        Ok(Some(record)) => record.id == job.record_id && record.is_active_at(Utc::now()),
        Ok(None) => false,
        Err(e) => {
            // Unknown state: send anyway
            warn!(error = %e, "Code store unavailable while checking dispatch job");
            true
        }
    }
}
