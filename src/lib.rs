pub mod cli;
pub mod client;
pub mod config;
pub mod document;
pub mod edit;
pub mod editor;
pub mod error;
pub mod feedback;
pub mod markdown;
pub mod page;
pub mod server;
pub mod store;

pub use client::{Outcome, PersistenceClient, Tier};
pub use document::{Document, FieldKey};
pub use editor::Editor;
pub use error::{MealPlanError, Result};
pub use store::JsonFileStore;
