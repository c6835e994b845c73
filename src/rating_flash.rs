use std::time::{Duration, Instant};

use crate::rating::RatingLabel;

pub const FLASH_DURATION: Duration = Duration::from_millis(1000);

/// Shows each new rating for a fixed window.
///
/// Restarts are keyed on the rating event id, so two identical ratings in a
/// row flash twice.
#[derive(Debug, Clone, Default)]
pub struct RatingFlash {
    last_event: u64,
    shown: Option<(RatingLabel, Instant)>,
}

impl RatingFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest rating and its event id. Returns true if this started
    /// a new window.
    pub fn observe(&mut self, rating: Option<RatingLabel>, event_id: u64, now: Instant) -> bool {
        if event_id == self.last_event {
            return false;
        }
        self.last_event = event_id;
        match rating {
            Some(label) => {
                self.shown = Some((label, now));
                true
            }
            None => {
                self.shown = None;
                false
            }
        }
    }

    /// Rating to show at `now`, if its window is still open
    pub fn visible(&self, now: Instant) -> Option<RatingLabel> {
        let (label, since) = self.shown?;
        if now.saturating_duration_since(since) < FLASH_DURATION {
            Some(label)
        } else {
            None
        }
    }
}
