//! Transient save feedback: per-field status classes and banners.
//!
//! Everything here is cosmetic. Nothing reads or writes the document.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::client::Outcome;
use crate::config::FeedbackTiming;
use crate::document::FieldKey;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save changes. Please try again.";

/// Visual class applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Saving,
    Success,
    Error,
}

impl StatusClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusClass::Saving => "saving",
            StatusClass::Success => "success",
            StatusClass::Error => "error",
        }
    }
}

/// An error banner, shown until `expires`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    expires: Instant,
}

/// A class shown from `start` until `end` (open-ended when `None`).
#[derive(Debug, Clone, Copy)]
struct Phase {
    class: StatusClass,
    start: Instant,
    end: Option<Instant>,
}

impl Phase {
    fn covers(&self, now: Instant) -> bool {
        self.start <= now && self.end.map_or(true, |end| now < end)
    }

    fn expired(&self, now: Instant) -> bool {
        self.end.is_some_and(|end| now >= end)
    }
}

pub struct Feedback {
    timing: FeedbackTiming,
    fields: HashMap<FieldKey, Vec<Phase>>,
    notifications: Vec<Notification>,
}

impl Feedback {
    pub fn new(timing: FeedbackTiming) -> Self {
        Self {
            timing,
            fields: HashMap::new(),
            notifications: Vec::new(),
        }
    }

    /// Mark a field as saving until its outcome is recorded.
    pub fn saving(&mut self, field: &FieldKey, now: Instant) {
        self.fields.insert(
            field.clone(),
            vec![Phase {
                class: StatusClass::Saving,
                start: now,
                end: None,
            }],
        );
    }

    pub fn record(&mut self, field: &FieldKey, outcome: Outcome, now: Instant) {
        let t = self.timing;
        let phases = match outcome {
            Outcome::Ok | Outcome::Degraded => {
                let shown = now + t.success_delay;
                vec![
                    Phase {
                        class: StatusClass::Saving,
                        start: now,
                        end: Some(shown),
                    },
                    Phase {
                        class: StatusClass::Success,
                        start: shown,
                        end: Some(shown + t.success_hold),
                    },
                ]
            }
            Outcome::Failed => {
                self.notify(SAVE_FAILED_MESSAGE, now);
                vec![Phase {
                    class: StatusClass::Error,
                    start: now,
                    end: Some(now + t.error_hold),
                }]
            }
        };
        self.fields.insert(field.clone(), phases);
    }

    pub fn notify(&mut self, message: &str, now: Instant) {
        self.notifications.push(Notification {
            message: message.to_string(),
            expires: now + self.timing.notification_hold,
        });
    }

    pub fn status(&self, field: &FieldKey, now: Instant) -> Option<StatusClass> {
        self.fields
            .get(field)?
            .iter()
            .find(|phase| phase.covers(now))
            .map(|phase| phase.class)
    }

    pub fn notifications(&self, now: Instant) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| now < n.expires)
            .collect()
    }

    /// Fields and banners held, including dismissed ones not yet pruned.
    pub fn retained(&self) -> (usize, usize) {
        (self.fields.len(), self.notifications.len())
    }

    /// Forget everything that has already been dismissed.
    pub fn prune(&mut self, now: Instant) {
        self.notifications.retain(|n| now < n.expires);
        self.fields.retain(|_, phases| {
            phases.retain(|phase| !phase.expired(now));
            !phases.is_empty()
        });
    }
}
