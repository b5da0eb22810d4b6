use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{EditEvent, TimerKind};
use crate::document::FieldKey;

/// Cancellable timers, at most one per field and kind.
///
/// An expired timer sends [`EditEvent::TimerFired`] on the channel given at
/// construction. Scheduling a timer that already exists replaces it.
pub struct Timers {
    tasks: HashMap<(FieldKey, TimerKind), Scheduled>,
    events: UnboundedSender<EditEvent>,
}

struct Scheduled {
    task: JoinHandle<()>,
    deadline: Instant,
    generation: u64,
}

impl Timers {
    pub fn new(events: UnboundedSender<EditEvent>) -> Self {
        Self {
            tasks: HashMap::new(),
            events,
        }
    }

    pub fn schedule(&mut self, field: FieldKey, timer: TimerKind, generation: u64, after: Duration) {
        self.cancel(&field, timer);

        let deadline = Instant::now() + after;
        let events = self.events.clone();
        let event = EditEvent::TimerFired {
            field: field.clone(),
            timer,
            generation,
        };
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = events.send(event);
        });
        self.tasks.insert(
            (field, timer),
            Scheduled {
                task,
                deadline,
                generation,
            },
        );
    }

    pub fn cancel(&mut self, field: &FieldKey, timer: TimerKind) {
        if let Some(scheduled) = self.tasks.remove(&(field.clone(), timer)) {
            scheduled.task.abort();
        }
    }

    /// Remove every timer whose deadline is at or before `now` and return
    /// its expiry event, earliest first.
    ///
    /// The task may already have sent the same event on the channel; the
    /// generation tag makes the second delivery a no-op.
    pub fn take_expired(&mut self, now: Instant) -> Vec<EditEvent> {
        let due: Vec<_> = self
            .tasks
            .iter()
            .filter(|(_, scheduled)| scheduled.deadline <= now)
            .map(|(key, scheduled)| (key.clone(), scheduled.deadline))
            .collect();

        let mut expired: Vec<_> = due
            .into_iter()
            .filter_map(|((field, timer), deadline)| {
                let scheduled = self.tasks.remove(&(field.clone(), timer))?;
                scheduled.task.abort();
                let event = EditEvent::TimerFired {
                    field,
                    timer,
                    generation: scheduled.generation,
                };
                Some((deadline, event))
            })
            .collect();
        expired.sort_by_key(|(deadline, _)| *deadline);
        expired.into_iter().map(|(_, event)| event).collect()
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.tasks
            .values()
            .filter(|scheduled| !scheduled.task.is_finished())
            .count()
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        for scheduled in self.tasks.values() {
            scheduled.task.abort();
        }
    }
}
