//! Pipeline session state management

use std::time::Instant;

/// Session state machine
///
/// A session moves from `Idle` to `Streaming` when the capture device is
/// started, to `Stopping` when a stop is requested (or the device fails),
/// and back to `Idle` once the stream is confirmed halted and the handoff
/// queue has been drained. Transitions are validated so every shutdown
/// path goes through the drain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No stream is active; a new session may be started.
    Idle,

    /// The capture device is delivering access units.
    Streaming {
        /// When streaming started
        started_at: Instant,
    },

    /// A stop was requested; the capture device is halting and the
    /// handoff queue is being drained.
    Stopping,
}

impl PipelineState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        match (self, target) {
            (Idle, Streaming { .. }) => true,
            (Streaming { .. }, Stopping) => true,
            (Stopping, Idle) => true,

            // Self-transitions
            (a, b) if a == b => true,

            _ => false,
        }
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            PipelineState::Idle => "Idle",
            PipelineState::Streaming { .. } => "Streaming",
            PipelineState::Stopping => "Stopping",
        }
    }

    /// Check if the session is actively streaming
    pub fn is_streaming(&self) -> bool {
        matches!(self, PipelineState::Streaming { .. })
    }

    /// Check if the session is idle
    pub fn is_idle(&self) -> bool {
        matches!(self, PipelineState::Idle)
    }

    /// Get the duration since streaming started (if streaming)
    pub fn streaming_duration(&self) -> Option<std::time::Duration> {
        if let PipelineState::Streaming { started_at } = self {
            Some(started_at.elapsed())
        } else {
            None
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let idle = PipelineState::Idle;
        let streaming = PipelineState::Streaming {
            started_at: Instant::now(),
        };
        let stopping = PipelineState::Stopping;

        assert!(idle.can_transition_to(&streaming));
        assert!(streaming.can_transition_to(&stopping));
        assert!(stopping.can_transition_to(&idle));

        // Self-transitions
        assert!(idle.can_transition_to(&idle));
        assert!(streaming.can_transition_to(&streaming));
    }

    #[test]
    fn test_invalid_transitions() {
        let idle = PipelineState::Idle;
        let streaming = PipelineState::Streaming {
            started_at: Instant::now(),
        };
        let stopping = PipelineState::Stopping;

        // Must stop before going idle, and drain before restarting
        assert!(!streaming.can_transition_to(&idle));
        assert!(!idle.can_transition_to(&stopping));
        assert!(!stopping.can_transition_to(&streaming));
    }

    #[test]
    fn test_state_checks() {
        let streaming = PipelineState::Streaming {
            started_at: Instant::now(),
        };

        assert!(streaming.is_streaming());
        assert!(!streaming.is_idle());
        assert!(streaming.streaming_duration().is_some());

        assert!(PipelineState::Idle.is_idle());
        assert!(PipelineState::Stopping.streaming_duration().is_none());
    }
}
