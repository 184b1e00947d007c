use tracing_subscriber::{fmt, EnvFilter};

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Returns false when a subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Enter,
    Exit,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionKind::Enter => "enter",
            TransitionKind::Exit => "exit",
        }
    }
}

/// One record per session transition.
#[derive(Debug, Clone)]
pub struct TransitionMetrics {
    pub kind: TransitionKind,
    pub player: u64,
    pub duration_us: u128,
    /// Attributes or steps that failed softly and were skipped.
    pub degraded_fields: usize,
}

impl TransitionMetrics {
    pub fn is_degraded(&self) -> bool {
        self.degraded_fields > 0
    }

    pub fn log(&self) {
        if self.is_degraded() {
            tracing::warn!(
                transition = self.kind.as_str(),
                player = self.player,
                duration_us = self.duration_us,
                degraded = self.degraded_fields,
                "transition completed with {} degraded field(s)",
                self.degraded_fields
            );
        } else {
            tracing::info!(
                transition = self.kind.as_str(),
                player = self.player,
                duration_us = self.duration_us,
                "transition completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_only_when_fields_skipped() {
        let mut m = TransitionMetrics {
            kind: TransitionKind::Exit,
            player: 7,
            duration_us: 120,
            degraded_fields: 0,
        };
        assert!(!m.is_degraded());
        m.degraded_fields = 2;
        assert!(m.is_degraded());
        assert_eq!(m.kind.as_str(), "exit");
    }
}
