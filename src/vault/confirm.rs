// Confirmer - the user-facing confirmation gate
// The vault awaits it before revealing seeds or using protected keys

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Prompt shown before a seed phrase is revealed
pub const SHOW_SEED_PROMPT: &str = "Do you want to reveal seed phrase?";

/// Prompt shown before a protected key signs
pub const SIGN_PROMPT: &str = "Do you want to sign with this identity?";

/// Prompt shown before a seed is stored at a prompting protection level
pub const STORE_PROMPT: &str = "Do you want to store this identity?";

/// Asks a human to approve an operation
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Returns true if the user approved
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Approves everything. For headless use and `Simple` deployments.
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

// ============================================================================
// MOCK CONFIRMER
// ============================================================================

/// Scriptable confirmer for testing
pub struct MockConfirmer {
    approve: bool,
    delay_ms: u64,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockConfirmer {
    /// Create a mock that approves every prompt
    pub fn approving() -> Self {
        Self {
            approve: true,
            delay_ms: 0,
            call_count: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that declines every prompt
    pub fn declining() -> Self {
        Self {
            approve: false,
            ..Self::approving()
        }
    }

    /// Wait before answering
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Number of prompts shown so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompt texts in the order they were shown
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Confirmer for MockConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        self.approve
    }
}
