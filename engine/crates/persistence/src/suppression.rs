//! Re-entrant persistence suppression.
//!
//! While any [`SuppressionScope`] is alive, persistence collaborators report
//! writes as successful without touching durable storage. Scopes nest; the
//! count drops when each scope is dropped, so release happens on every exit
//! path including `?` returns and unwinding.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct SuppressionGuard {
    depth: Arc<Mutex<u32>>,
}

impl SuppressionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a suppressed region. Hold the returned scope for its duration.
    #[must_use = "suppression ends as soon as the scope is dropped"]
    pub fn acquire(&self) -> SuppressionScope {
        let mut depth = lock(&self.depth);
        *depth += 1;
        tracing::trace!(depth = *depth, "persistence suppressed");
        SuppressionScope {
            depth: Arc::clone(&self.depth),
        }
    }

    pub fn is_suppressed(&self) -> bool {
        *lock(&self.depth) > 0
    }

    pub fn depth(&self) -> u32 {
        *lock(&self.depth)
    }
}

/// Held suppression. Dropping it releases one level.
#[derive(Debug)]
pub struct SuppressionScope {
    depth: Arc<Mutex<u32>>,
}

impl Drop for SuppressionScope {
    fn drop(&mut self) {
        let mut depth = lock(&self.depth);
        *depth = depth.saturating_sub(1);
        tracing::trace!(depth = *depth, "persistence suppression released");
    }
}

// The counter is valid even if a holder panicked mid-update.
fn lock(m: &Mutex<u32>) -> MutexGuard<'_, u32> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
