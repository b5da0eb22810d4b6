//! Per-field inline edit state machine.
//!
//! Each field is in one of three states:
//!
//! ```text
//! Display --click--> Armed --click (within window)--> Editing
//!            Armed --window elapses--> Display
//! Editing --blur / Enter / Escape / debounce--> Display (commit)
//! ```
//!
//! The controller is pure: it consumes [`EditEvent`]s and returns the
//! [`EditEffect`]s the caller must carry out. Timers are requested through
//! effects and come back as [`EditEvent::TimerFired`] tagged with the
//! generation they were scheduled with, so a replaced timer can never fire
//! into a newer state.

mod timers;

pub use timers::Timers;

use std::collections::HashMap;
use std::time::Duration;

use crate::config::EditTiming;
use crate::document::FieldKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    DoubleClick,
    Debounce,
}

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Text,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Click {
        field: FieldKey,
        target: ClickTarget,
    },
    /// Shift+Enter on a multi-line field appends a line break to the end
    /// of the buffer. A front end with a caret should let its native line
    /// break through and report the result as [`EditEvent::Input`].
    KeyDown {
        field: FieldKey,
        key: KeyCode,
        shift: bool,
    },
    /// The field's full text after a change.
    Input {
        field: FieldKey,
        text: String,
    },
    Blur {
        field: FieldKey,
    },
    TimerFired {
        field: FieldKey,
        timer: TimerKind,
        generation: u64,
    },
}

impl EditEvent {
    pub fn field(&self) -> &FieldKey {
        match self {
            EditEvent::Click { field, .. }
            | EditEvent::KeyDown { field, .. }
            | EditEvent::Input { field, .. }
            | EditEvent::Blur { field }
            | EditEvent::TimerFired { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEffect {
    /// Let a link click navigate.
    AllowNavigation,
    /// Suppress the click's default action.
    PreventDefault,
    Schedule {
        field: FieldKey,
        timer: TimerKind,
        generation: u64,
        after: Duration,
    },
    Cancel {
        field: FieldKey,
        timer: TimerKind,
    },
    /// Show `text` as editable source with everything selected.
    BeginEdit { field: FieldKey, text: String },
    /// The edit buffer changed.
    SetText { field: FieldKey, text: String },
    /// Leave edit mode and persist `value`.
    Commit { field: FieldKey, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
    Display,
    Armed {
        generation: u64,
    },
    Editing {
        buffer: String,
        debounce: Option<u64>,
    },
}

pub struct EditController {
    fields: HashMap<FieldKey, FieldState>,
    timing: EditTiming,
    next_generation: u64,
}

impl EditController {
    pub fn new(timing: EditTiming) -> Self {
        Self {
            fields: HashMap::new(),
            timing,
            next_generation: 0,
        }
    }

    pub fn timing(&self) -> EditTiming {
        self.timing
    }

    pub fn state(&self, field: &FieldKey) -> &FieldState {
        self.fields.get(field).unwrap_or(&FieldState::Display)
    }

    pub fn is_editing(&self, field: &FieldKey) -> bool {
        matches!(self.state(field), FieldState::Editing { .. })
    }

    /// Feed one event. `source` gives a field's current source text and is
    /// only consulted when the field enters edit mode.
    pub fn handle(
        &mut self,
        event: EditEvent,
        source: impl FnOnce(&FieldKey) -> String,
    ) -> Vec<EditEffect> {
        match event {
            EditEvent::Click { field, target } => self.click(field, target, source),
            EditEvent::KeyDown { field, key, shift } => self.key_down(field, key, shift),
            EditEvent::Input { field, text } => self.input(field, text),
            EditEvent::Blur { field } => {
                if self.is_editing(&field) {
                    self.commit(field)
                } else {
                    Vec::new()
                }
            }
            EditEvent::TimerFired {
                field,
                timer,
                generation,
            } => self.timer_fired(field, timer, generation),
        }
    }

    fn click(
        &mut self,
        field: FieldKey,
        target: ClickTarget,
        source: impl FnOnce(&FieldKey) -> String,
    ) -> Vec<EditEffect> {
        match self.state(&field) {
            FieldState::Display => {
                let generation = self.generation();
                let first = match target {
                    ClickTarget::Link => EditEffect::AllowNavigation,
                    ClickTarget::Text => EditEffect::PreventDefault,
                };
                self.fields
                    .insert(field.clone(), FieldState::Armed { generation });
                vec![
                    first,
                    EditEffect::Schedule {
                        field,
                        timer: TimerKind::DoubleClick,
                        generation,
                        after: self.timing.double_click,
                    },
                ]
            }
            FieldState::Armed { .. } => {
                let text = source(&field);
                self.fields.insert(
                    field.clone(),
                    FieldState::Editing {
                        buffer: text.clone(),
                        debounce: None,
                    },
                );
                vec![
                    EditEffect::PreventDefault,
                    EditEffect::Cancel {
                        field: field.clone(),
                        timer: TimerKind::DoubleClick,
                    },
                    EditEffect::BeginEdit { field, text },
                ]
            }
            // Clicks inside an open editor only move the caret.
            FieldState::Editing { .. } => Vec::new(),
        }
    }

    fn key_down(&mut self, field: FieldKey, key: KeyCode, shift: bool) -> Vec<EditEffect> {
        if !self.is_editing(&field) {
            return Vec::new();
        }
        match key {
            KeyCode::Enter if shift && field.is_multiline() => {
                let mut text = match self.state(&field) {
                    FieldState::Editing { buffer, .. } => buffer.clone(),
                    _ => String::new(),
                };
                text.push('\n');
                self.input(field, text)
            }
            KeyCode::Enter | KeyCode::Escape => {
                let mut effects = vec![EditEffect::PreventDefault];
                effects.extend(self.commit(field));
                effects
            }
            KeyCode::Other => Vec::new(),
        }
    }

    fn input(&mut self, field: FieldKey, text: String) -> Vec<EditEffect> {
        if !self.is_editing(&field) {
            return Vec::new();
        }

        let mut effects = vec![EditEffect::SetText {
            field: field.clone(),
            text: text.clone(),
        }];
        let debounce = if field.is_multiline() {
            let generation = self.generation();
            effects.push(EditEffect::Schedule {
                field: field.clone(),
                timer: TimerKind::Debounce,
                generation,
                after: self.timing.debounce,
            });
            Some(generation)
        } else {
            None
        };

        self.fields.insert(
            field,
            FieldState::Editing {
                buffer: text,
                debounce,
            },
        );
        effects
    }

    fn timer_fired(&mut self, field: FieldKey, timer: TimerKind, generation: u64) -> Vec<EditEffect> {
        let pending = match self.state(&field) {
            FieldState::Armed { generation } => Some((TimerKind::DoubleClick, *generation)),
            FieldState::Editing {
                debounce: Some(generation),
                ..
            } => Some((TimerKind::Debounce, *generation)),
            _ => None,
        };
        if pending != Some((timer, generation)) {
            return Vec::new();
        }

        match timer {
            TimerKind::DoubleClick => {
                self.fields.remove(&field);
                Vec::new()
            }
            TimerKind::Debounce => self.commit(field),
        }
    }

    fn commit(&mut self, field: FieldKey) -> Vec<EditEffect> {
        let Some(FieldState::Editing { buffer, debounce }) = self.fields.remove(&field) else {
            return Vec::new();
        };

        let mut effects = Vec::new();
        if debounce.is_some() {
            effects.push(EditEffect::Cancel {
                field: field.clone(),
                timer: TimerKind::Debounce,
            });
        }
        effects.push(EditEffect::Commit {
            field,
            value: buffer.trim().to_string(),
        });
        effects
    }

    fn generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}
