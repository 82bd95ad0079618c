use crate::domain::value_objects::ContactAddress;
use crate::ports::notifier::{Notifier as NotifierTrait, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 送信された通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: ContactAddress,
    pub subject: String,
    pub body: String,
}

/// Mock implementation of Notifier
///
/// Records every message instead of delivering it.
/// Can be switched to fail or to stall, to exercise the warning and timeout paths.
pub struct Notifier {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
    failing_recipients: Mutex<HashSet<ContactAddress>>,
    delay: Mutex<Option<Duration>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            failing_recipients: Mutex::new(HashSet::new()),
            delay: Mutex::new(None),
        }
    }

    /// Make every send fail (unreachable transport)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make sends to one recipient fail
    pub fn fail_for(&self, recipient: ContactAddress) {
        self.failing_recipients.lock().unwrap().insert(recipient);
    }

    /// Delay every send by the given duration
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Messages recorded so far
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifierTrait for Notifier {
    async fn send(&self, recipient: &ContactAddress, subject: &str, body: &str) -> Result<()> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst)
            || self.failing_recipients.lock().unwrap().contains(recipient)
        {
            return Err(format!("notifier unreachable for {}", recipient).into());
        }

        self.sent.lock().unwrap().push(SentMessage {
            recipient: recipient.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
