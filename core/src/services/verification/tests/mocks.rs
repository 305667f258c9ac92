//! Test doubles for the verification service

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::domain::entities::verification_record::{Purpose, VerificationRecord};
use crate::errors::{DeliveryError, DomainError, DomainResult};
use crate::repositories::CodeStore;
use crate::services::verification::{
    DispatcherConfig, NotificationDispatcher, Notifier, TemplateVariables, VerificationService,
    VerificationServiceConfig,
};
use crate::repositories::InMemoryCodeStore;

/// An email the notifier accepted
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub template_name: String,
    pub variables: TemplateVariables,
}

impl SentEmail {
    pub fn code(&self) -> String {
        self.variables["code"].as_str().unwrap_or_default().to_string()
    }
}

/// How the mock notifier misbehaves
#[derive(Debug, Clone)]
pub enum Failure {
    None,
    /// Fail this many calls with a transport error, then succeed
    Transient(u32),
    /// Every call fails with a transport error
    Always,
    /// Every call is rejected permanently
    Reject,
    /// Every call hangs for this long
    Hang(StdDuration),
}

// Mock notifier recording every email it accepts
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentEmail>>,
    pub attempts: AtomicU32,
    failure: Failure,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::with_failure(Failure::None)
    }

    pub fn with_failure(failure: Failure) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicU32::new(0),
            failure,
            gate: None,
        }
    }

    /// Every send waits for a permit on `gate` first
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        variables: &TemplateVariables,
    ) -> Result<(), DeliveryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        match &self.failure {
            Failure::None => {}
            Failure::Transient(n) if attempt <= *n => {
                return Err(DeliveryError::Transport {
                    message: "connection reset".to_string(),
                })
            }
            Failure::Transient(_) => {}
            Failure::Always => {
                return Err(DeliveryError::Transport {
                    message: "relay unreachable".to_string(),
                })
            }
            Failure::Reject => {
                return Err(DeliveryError::Rejected {
                    message: "mailbox unavailable".to_string(),
                })
            }
            Failure::Hang(duration) => {
                tokio::time::sleep(*duration).await;
            }
        }

        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            template_name: template_name.to_string(),
            variables: variables.clone(),
        });
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "recording"
    }
}

// Store whose backend is always down
pub struct UnavailableCodeStore;

#[async_trait]
impl CodeStore for UnavailableCodeStore {
    async fn put(&self, _: &str, _: Purpose, _: VerificationRecord) -> DomainResult<()> {
        Err(DomainError::storage("connection refused"))
    }

    async fn get(&self, _: &str, _: Purpose) -> DomainResult<Option<VerificationRecord>> {
        Err(DomainError::storage("connection refused"))
    }

    async fn delete(&self, _: &str, _: Purpose) -> DomainResult<()> {
        Err(DomainError::storage("connection refused"))
    }

    async fn mark_consumed(&self, _: &str, _: Purpose, _: Uuid) -> DomainResult<bool> {
        Err(DomainError::storage("connection refused"))
    }

    async fn purge_expired(&self, _: DateTime<Utc>) -> DomainResult<usize> {
        Err(DomainError::storage("connection refused"))
    }
}

pub fn fast_dispatch_config() -> DispatcherConfig {
    DispatcherConfig {
        max_attempts: 3,
        base_backoff: StdDuration::from_millis(1),
        max_backoff: StdDuration::from_millis(5),
        send_timeout: StdDuration::from_secs(1),
        queue_capacity: 64,
    }
}

pub struct Harness {
    pub service: VerificationService<InMemoryCodeStore>,
    pub store: Arc<InMemoryCodeStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(notifier: RecordingNotifier) -> Harness {
    let store = Arc::new(InMemoryCodeStore::new());
    let notifier = Arc::new(notifier);
    let dispatcher =
        NotificationDispatcher::spawn(store.clone(), notifier.clone(), fast_dispatch_config());
    let service =
        VerificationService::new(store.clone(), dispatcher, VerificationServiceConfig::default());
    Harness {
        service,
        store,
        notifier,
    }
}

/// Poll `condition` until it holds, panicking after two seconds
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// A code guaranteed to differ from `code`
pub fn wrong_code(code: &str) -> String {
    if code == "000000" {
        "000001".to_string()
    } else {
        "000000".to_string()
    }
}
