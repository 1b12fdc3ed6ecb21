//! Inactivity tracking

use serde::{Deserialize, Serialize};

use super::frame::DialogueFrame;
use crate::config::DialogueConfig;

/// Where a frame sits in its inactivity window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TimeoutStatus {
    Active,
    /// Past the reminder point, not yet expired
    Reminder { remaining_secs: u64 },
    Expired,
}

#[derive(Debug, Clone, Copy)]
pub struct TimeoutManager {
    timeout_ms: i64,
    reminder_ratio: f64,
}

impl TimeoutManager {
    pub fn new(timeout_ms: i64, reminder_ratio: f64) -> Self {
        Self {
            timeout_ms,
            reminder_ratio: reminder_ratio.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        Self::new(config.timeout_ms, config.reminder_ratio)
    }

    pub fn timeout_ms(&self) -> i64 {
        self.timeout_ms
    }

    /// Strictly more than the window has passed since the last activity
    pub fn is_context_expired(&self, frame: &DialogueFrame, now_ms: i64) -> bool {
        now_ms - frame.context.timestamp > self.timeout_ms
    }

    pub fn status(&self, frame: &DialogueFrame, now_ms: i64) -> TimeoutStatus {
        let elapsed = now_ms - frame.context.timestamp;
        if elapsed > self.timeout_ms {
            return TimeoutStatus::Expired;
        }

        let reminder_at = (self.timeout_ms as f64 * self.reminder_ratio) as i64;
        if elapsed >= reminder_at {
            let remaining_ms = (self.timeout_ms - elapsed).max(0) as u64;
            TimeoutStatus::Reminder {
                remaining_secs: remaining_ms.div_ceil(1000),
            }
        } else {
            TimeoutStatus::Active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_at(ts: i64) -> DialogueFrame {
        DialogueFrame::new(ts)
    }

    #[test]
    fn test_expiry_boundary() {
        let manager = TimeoutManager::new(90_000, 0.8);
        let frame = frame_at(0);
        assert!(!manager.is_context_expired(&frame, 90_000));
        assert!(manager.is_context_expired(&frame, 90_001));
    }

    #[test]
    fn test_status_progression() {
        let manager = TimeoutManager::new(90_000, 0.8);
        let frame = frame_at(0);

        assert_eq!(manager.status(&frame, 10_000), TimeoutStatus::Active);
        assert_eq!(manager.status(&frame, 71_999), TimeoutStatus::Active);
        assert_eq!(
            manager.status(&frame, 72_000),
            TimeoutStatus::Reminder { remaining_secs: 18 }
        );
        assert_eq!(
            manager.status(&frame, 89_500),
            TimeoutStatus::Reminder { remaining_secs: 1 }
        );
        assert_eq!(manager.status(&frame, 90_001), TimeoutStatus::Expired);
    }

    #[test]
    fn test_ratio_is_clamped() {
        let manager = TimeoutManager::new(1_000, 3.0);
        assert_eq!(
            manager.status(&frame_at(0), 1_000),
            TimeoutStatus::Reminder { remaining_secs: 0 }
        );
    }
}
