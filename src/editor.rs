//! The top-level editing session.
//!
//! [`Session`] is the single in-memory copy of the plan plus what each bound
//! field currently shows. [`Editor`] owns the session and its collaborators
//! and runs UI events through them.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::{LocalStorage, Outcome, PersistenceClient, RemoteStore, Tier};
use crate::config::{EditTiming, FeedbackTiming};
use crate::document::{Document, FieldKey};
use crate::edit::{ClickTarget, EditController, EditEffect, EditEvent, KeyCode, Timers};
use crate::error::{MealPlanError, Result};
use crate::feedback::Feedback;
use crate::markdown::{self, Markup};

/// What a field shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldView {
    Display(Markup),
    /// Editable source text, fully selected when edit mode starts.
    Editing { text: String, selected: bool },
}

impl FieldView {
    fn render(value: &str) -> Self {
        FieldView::Display(markdown::to_display(value))
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, FieldView::Editing { .. })
    }

    pub fn html(&self) -> String {
        match self {
            FieldView::Display(markup) => markup.to_html(),
            FieldView::Editing { text, .. } => text.clone(),
        }
    }
}

pub struct Session {
    document: Document,
    bindings: Vec<FieldKey>,
    views: HashMap<FieldKey, FieldView>,
}

impl Session {
    /// Bind `bindings` to `document` and render every field.
    pub fn new(document: Document, bindings: Vec<FieldKey>) -> Self {
        let views = bindings
            .iter()
            .map(|key| (key.clone(), FieldView::render(document.get(key.as_str()))))
            .collect();
        Self {
            document,
            bindings,
            views,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Bound fields in page order.
    pub fn bindings(&self) -> &[FieldKey] {
        &self.bindings
    }

    pub fn is_bound(&self, field: &FieldKey) -> bool {
        self.views.contains_key(field)
    }

    pub fn view(&self, field: &FieldKey) -> Option<&FieldView> {
        self.views.get(field)
    }

    /// The field's content in source form.
    pub fn source_text(&self, field: &FieldKey) -> String {
        match self.views.get(field) {
            Some(FieldView::Display(markup)) => markdown::to_source(markup),
            Some(FieldView::Editing { text, .. }) => text.clone(),
            None => self.document.get(field.as_str()).to_string(),
        }
    }

    fn begin_edit(&mut self, field: &FieldKey, text: String) {
        self.views.insert(
            field.clone(),
            FieldView::Editing {
                text,
                selected: true,
            },
        );
    }

    fn set_text(&mut self, field: &FieldKey, text: String) {
        self.views.insert(
            field.clone(),
            FieldView::Editing {
                text,
                selected: false,
            },
        );
    }

    fn apply_commit(&mut self, field: &FieldKey, value: &str) {
        self.document.set(field.as_str(), value);
        self.views.insert(field.clone(), FieldView::render(value));
    }
}

pub struct Editor<R, L> {
    session: Session,
    controller: EditController,
    client: PersistenceClient<R, L>,
    feedback: Feedback,
    timers: Timers,
    events: UnboundedReceiver<EditEvent>,
    loaded_from: Tier,
    last_outcome: Option<Outcome>,
}

impl<R: RemoteStore, L: LocalStorage> Editor<R, L> {
    /// Load the plan through the client's fallback chain and bind it.
    ///
    /// Must be called inside a tokio runtime; timers run as tasks on it.
    pub async fn open(
        client: PersistenceClient<R, L>,
        bindings: Vec<FieldKey>,
        timing: EditTiming,
        feedback: FeedbackTiming,
    ) -> Self {
        let (document, loaded_from) = client.load_with_source().await;
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(document, bindings),
            controller: EditController::new(timing),
            client,
            feedback: Feedback::new(feedback),
            timers: Timers::new(tx),
            events: rx,
            loaded_from,
            last_outcome: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn controller(&self) -> &EditController {
        &self.controller
    }

    pub fn client(&self) -> &PersistenceClient<R, L> {
        &self.client
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn loaded_from(&self) -> Tier {
        self.loaded_from
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Run one UI event through the controller and carry out its effects.
    ///
    /// Timers that expired before the event arrived are handled first, so
    /// the event always sees the state the clock says the field is in.
    /// Returns the effects so the caller can honour navigation decisions.
    pub async fn dispatch(&mut self, event: EditEvent) -> Vec<EditEffect> {
        self.pump().await;
        self.handle(event).await
    }

    /// Handle every timer that has expired by now.
    pub async fn pump(&mut self) -> usize {
        let mut fired = self.timers.take_expired(Instant::now());
        while let Ok(event) = self.events.try_recv() {
            if !fired.contains(&event) {
                fired.push(event);
            }
        }

        let handled = fired.len();
        for event in fired {
            self.handle(event).await;
        }
        handled
    }

    async fn handle(&mut self, event: EditEvent) -> Vec<EditEffect> {
        if !self.session.is_bound(event.field()) {
            warn!(field = %event.field(), "Ignoring event for unbound field");
            return Vec::new();
        }

        let session = &self.session;
        let effects = self
            .controller
            .handle(event, |field| session.source_text(field));

        for effect in &effects {
            self.apply(effect).await;
        }
        effects
    }

    /// Replace a field's value with the same gesture a person would use:
    /// double click, type, press Enter.
    pub async fn edit_field(&mut self, field: &FieldKey, value: &str) -> Result<Outcome> {
        if !self.session.is_bound(field) {
            return Err(MealPlanError::UnknownField(field.to_string()));
        }

        self.last_outcome = None;
        for _ in 0..2 {
            self.dispatch(EditEvent::Click {
                field: field.clone(),
                target: ClickTarget::Text,
            })
            .await;
        }
        self.dispatch(EditEvent::Input {
            field: field.clone(),
            text: value.to_string(),
        })
        .await;
        self.dispatch(EditEvent::KeyDown {
            field: field.clone(),
            key: KeyCode::Enter,
            shift: false,
        })
        .await;

        Ok(self.last_outcome.unwrap_or(Outcome::Failed))
    }

    async fn apply(&mut self, effect: &EditEffect) {
        match effect {
            EditEffect::AllowNavigation | EditEffect::PreventDefault => {}
            EditEffect::Schedule {
                field,
                timer,
                generation,
                after,
            } => self
                .timers
                .schedule(field.clone(), *timer, *generation, *after),
            EditEffect::Cancel { field, timer } => self.timers.cancel(field, *timer),
            EditEffect::BeginEdit { field, text } => {
                debug!(field = %field, "Entering edit mode");
                self.session.begin_edit(field, text.clone());
            }
            EditEffect::SetText { field, text } => self.session.set_text(field, text.clone()),
            EditEffect::Commit { field, value } => {
                // The visible edit stands whatever persistence reports.
                self.session.apply_commit(field, value);
                self.feedback.prune(Instant::now());
                self.feedback.saving(field, Instant::now());

                let outcome = self.client.commit(self.session.document()).await;
                debug!(field = %field, outcome = %outcome, "Committed field");

                self.feedback.record(field, outcome, Instant::now());
                self.last_outcome = Some(outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MemoryRemote, MemoryStorage, CACHE_KEY};
    use crate::feedback::{StatusClass, SAVE_FAILED_MESSAGE};
    use crate::page::default_bindings;
    use std::time::Duration;

    type TestEditor = Editor<MemoryRemote, MemoryStorage>;

    async fn open_editor(remote: MemoryRemote, local: MemoryStorage) -> TestEditor {
        Editor::open(
            PersistenceClient::new(remote, local),
            default_bindings(),
            EditTiming::default(),
            FeedbackTiming::default(),
        )
        .await
    }

    async fn online_editor() -> TestEditor {
        open_editor(
            MemoryRemote::new(Document::builtin_default()),
            MemoryStorage::new(),
        )
        .await
    }

    fn click(field: &str) -> EditEvent {
        EditEvent::Click {
            field: field.into(),
            target: ClickTarget::Text,
        }
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_click_within_window_edits() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day3-meal1-title");

        editor.dispatch(click("day3-meal1-title")).await;
        sleep_ms(300).await;
        editor.pump().await;
        editor.dispatch(click("day3-meal1-title")).await;

        assert!(editor.controller().is_editing(&field));
        assert_eq!(
            editor.session().view(&field),
            Some(&FieldView::Editing {
                text: "Pizza".to_string(),
                selected: true,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_clicks_do_not_edit() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day3-meal1-title");

        editor.dispatch(click("day3-meal1-title")).await;
        sleep_ms(500).await;
        assert_eq!(editor.pump().await, 1);
        editor.dispatch(click("day3-meal1-title")).await;

        assert!(!editor.controller().is_editing(&field));
        assert!(!editor.session().view(&field).unwrap().is_editing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clicks_500ms_apart_do_not_edit_without_pumping() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day3-meal1-title");

        editor.dispatch(click("day3-meal1-title")).await;
        sleep_ms(500).await;
        editor.dispatch(click("day3-meal1-title")).await;

        assert!(!editor.controller().is_editing(&field));
        assert_eq!(
            editor.controller().state(&field),
            &crate::edit::FieldState::Armed { generation: 2 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_expiry_lands_before_next_keystroke() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day5-meal1-ingredients");

        editor.dispatch(click("day5-meal1-ingredients")).await;
        editor.dispatch(click("day5-meal1-ingredients")).await;
        editor
            .dispatch(EditEvent::Input {
                field: field.clone(),
                text: "eggs".to_string(),
            })
            .await;
        sleep_ms(1500).await;
        editor
            .dispatch(EditEvent::Input {
                field: field.clone(),
                text: "eggs, toast".to_string(),
            })
            .await;

        assert!(!editor.controller().is_editing(&field));
        assert_eq!(editor.session().document().get("day5-meal1-ingredients"), "eggs");
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_field_edits_in_source_form() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day6-where");
        let link = |f: &str| EditEvent::Click {
            field: f.into(),
            target: ClickTarget::Link,
        };

        let first = editor.dispatch(link("day6-where")).await;
        assert!(first.contains(&EditEffect::AllowNavigation));
        let second = editor.dispatch(link("day6-where")).await;
        assert!(second.contains(&EditEffect::PreventDefault));

        assert_eq!(
            editor.session().source_text(&field),
            "[Eem on N. Williams](https://www.eempdx.com/)"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingredients_auto_commit_after_idle() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day5-meal1-ingredients");

        editor.dispatch(click("day5-meal1-ingredients")).await;
        editor.dispatch(click("day5-meal1-ingredients")).await;
        editor
            .dispatch(EditEvent::Input {
                field: field.clone(),
                text: "eggs, veg sausage, toast".to_string(),
            })
            .await;

        sleep_ms(900).await;
        editor.pump().await;
        assert!(editor.controller().is_editing(&field));

        sleep_ms(200).await;
        editor.pump().await;

        assert!(!editor.controller().is_editing(&field));
        assert_eq!(editor.last_outcome(), Some(Outcome::Ok));
        let saved = editor.client().remote().snapshot().unwrap();
        assert_eq!(saved.get("day5-meal1-ingredients"), "eggs, veg sausage, toast");
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_line_field_waits_for_blur() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day1-where");

        editor.dispatch(click("day1-where")).await;
        editor.dispatch(click("day1-where")).await;
        editor
            .dispatch(EditEvent::Input {
                field: field.clone(),
                text: "Paul's house".to_string(),
            })
            .await;

        sleep_ms(2000).await;
        editor.pump().await;

        assert!(editor.controller().is_editing(&field));
        assert_eq!(editor.last_outcome(), None);

        editor.dispatch(EditEvent::Blur { field }).await;
        assert_eq!(editor.last_outcome(), Some(Outcome::Ok));
    }

    #[tokio::test(start_paused = true)]
    async fn test_append_to_ingredients_persists_exact_value() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day3-meal1-ingredients");
        let updated = format!("{}, olives", editor.session().source_text(&field));

        let outcome = editor.edit_field(&field, &updated).await.unwrap();

        assert_eq!(outcome, Outcome::Ok);
        let saved = editor.client().remote().snapshot().unwrap();
        assert_eq!(
            saved.get("day3-meal1-ingredients"),
            "Black olives, mushrooms, onions, green bell peppers, chicken, pineapple, olives"
        );
        let mut expected = Document::builtin_default();
        expected.set("day3-meal1-ingredients", updated.as_str());
        assert_eq!(saved, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_committed_link_is_rendered() {
        let mut editor = online_editor().await;
        let field = FieldKey::from("day8-where");

        editor
            .edit_field(&field, "  [Salt](https://salt.example)  ")
            .await
            .unwrap();

        assert_eq!(
            editor.session().document().get("day8-where"),
            "[Salt](https://salt.example)"
        );
        assert_eq!(
            editor.session().view(&field).unwrap().html(),
            r#"<a href="https://salt.example" target="_blank" rel="noopener noreferrer">Salt</a>"#
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_commit_is_degraded_and_reloads_from_cache() {
        let mut editor = open_editor(MemoryRemote::offline(), MemoryStorage::new()).await;
        assert_eq!(editor.loaded_from(), Tier::BuiltinDefault);

        let outcome = editor
            .edit_field(&"day8-where".into(), "Pho Oregon")
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Degraded);

        let cached = editor.client().local().get_item(CACHE_KEY).unwrap().unwrap();
        let reopened = open_editor(MemoryRemote::offline(), {
            let local = MemoryStorage::new();
            local.set_item(CACHE_KEY, &cached).unwrap();
            local
        })
        .await;
        assert_eq!(reopened.loaded_from(), Tier::LocalCache);
        assert_eq!(
            reopened.session().document().get("day8-where"),
            "Pho Oregon"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_commit_keeps_edit_and_notifies() {
        let mut editor = open_editor(MemoryRemote::offline(), MemoryStorage::disabled()).await;
        let field = FieldKey::from("day1-where");

        let outcome = editor.edit_field(&field, "Paul's house").await.unwrap();

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(editor.session().document().get("day1-where"), "Paul's house");
        let now = Instant::now();
        assert_eq!(editor.feedback().status(&field, now), Some(StatusClass::Error));
        assert_eq!(
            editor.feedback().notifications(now)[0].message,
            SAVE_FAILED_MESSAGE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_feedback_is_dropped_on_next_commit() {
        let mut editor = open_editor(MemoryRemote::offline(), MemoryStorage::disabled()).await;

        editor.edit_field(&"day1-where".into(), "Paul's house").await.unwrap();
        editor.edit_field(&"day2-where".into(), "Paul's house").await.unwrap();
        assert_eq!(editor.feedback().retained(), (2, 2));

        sleep_ms(5000).await;
        editor.edit_field(&"day3-where".into(), "Fazio house").await.unwrap();

        assert_eq!(editor.feedback().retained(), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbound_field_is_rejected() {
        let mut editor = online_editor().await;

        let result = editor.edit_field(&"day10-where".into(), "Nowhere").await;

        assert!(matches!(result, Err(MealPlanError::UnknownField(_))));
        assert!(editor.dispatch(click("day10-where")).await.is_empty());
    }

    #[test]
    fn test_session_renders_absent_keys_empty() {
        let session = Session::new(Document::new(), vec!["day4-where".into()]);
        assert_eq!(session.view(&"day4-where".into()).unwrap().html(), "");
        assert_eq!(session.source_text(&"day4-where".into()), "");
    }
}
