//! Client-side persistence with an ordered fallback chain.
//!
//! Loading tries the remote store, then the local cache, then the built-in
//! plan. The first tier that yields a document wins; tiers are never merged.
//! Committing tries the remote store and falls back to the local cache.

mod local;
mod remote;

pub use local::{FileStorage, LocalStorage, MemoryStorage};
pub use remote::{HttpRemote, MemoryRemote, RemoteStore};

use std::fmt;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::document::Document;
use crate::error::{MealPlanError, Result};

/// Local storage key holding the serialized plan.
pub const CACHE_KEY: &str = "mealPlanData";

/// One source of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Remote,
    LocalCache,
    BuiltinDefault,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Remote => write!(f, "server"),
            Tier::LocalCache => write!(f, "local cache"),
            Tier::BuiltinDefault => write!(f, "built-in default"),
        }
    }
}

/// Order in which load tiers are tried.
pub const LOAD_ORDER: [Tier; 3] = [Tier::Remote, Tier::LocalCache, Tier::BuiltinDefault];

/// Result of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Saved to the remote store.
    Ok,
    /// Remote store unreachable; saved to the local cache only.
    Degraded,
    /// Neither tier accepted the document.
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ok => write!(f, "ok"),
            Outcome::Degraded => write!(f, "degraded"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

pub struct PersistenceClient<R, L> {
    remote: R,
    local: L,
}

impl<R: RemoteStore, L: LocalStorage> PersistenceClient<R, L> {
    pub fn new(remote: R, local: L) -> Self {
        Self { remote, local }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Load from a single tier.
    pub async fn load_from(&self, tier: Tier) -> Result<Document> {
        match tier {
            Tier::Remote => self.remote.fetch().await,
            Tier::LocalCache => {
                let json = self.local.get_item(CACHE_KEY)?.ok_or_else(|| {
                    MealPlanError::LocalStorage("no cached meal plan".to_string())
                })?;
                Document::from_json(&json)
            }
            Tier::BuiltinDefault => Ok(Document::builtin_default()),
        }
    }

    /// Try each tier in order and return the first document obtained.
    ///
    /// Fails with the last tier's error when every tier fails.
    pub async fn first_success(&self, order: &[Tier]) -> Result<(Document, Tier)> {
        let mut last_err = None;
        for &tier in order {
            match self.load_from(tier).await {
                Ok(doc) => {
                    info!(source = %tier, "Loaded meal plan");
                    return Ok((doc, tier));
                }
                Err(e) => {
                    warn!(source = %tier, error = %e, "Could not load meal plan, trying next source");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| MealPlanError::LocalStorage("no sources to load from".to_string())))
    }

    /// Load the plan, reporting which tier supplied it. Never fails.
    pub async fn load_with_source(&self) -> (Document, Tier) {
        match self.first_success(&LOAD_ORDER).await {
            Ok(loaded) => loaded,
            Err(_) => (Document::builtin_default(), Tier::BuiltinDefault),
        }
    }

    pub async fn load(&self) -> Document {
        self.load_with_source().await.0
    }

    /// Persist the whole document.
    pub async fn commit(&self, doc: &Document) -> Outcome {
        let remote_err = match self.remote.replace(doc).await {
            Ok(()) => {
                info!("Saved meal plan to server");
                return Outcome::Ok;
            }
            Err(e) => e,
        };
        warn!(error = %remote_err, "Server save failed, using local cache");

        match doc
            .to_json()
            .and_then(|json| self.local.set_item(CACHE_KEY, &json))
        {
            Ok(()) => {
                info!("Saved meal plan to local cache");
                Outcome::Degraded
            }
            Err(e) => {
                error!(error = %e, "Local cache save failed");
                Outcome::Failed
            }
        }
    }
}
