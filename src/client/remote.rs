use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::config::ClientConfig;
use crate::document::Document;
use crate::error::{MealPlanError, Result};

/// The shared store the client talks to first.
pub trait RemoteStore: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Document>> + Send;

    fn replace(&self, doc: &Document) -> impl Future<Output = Result<()>> + Send;
}

/// Remote store reached over the `/api/data` HTTP API.
pub struct HttpRemote {
    client: reqwest::Client,
    url: String,
}

impl HttpRemote {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.data_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RemoteStore for HttpRemote {
    async fn fetch(&self) -> Result<Document> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(MealPlanError::Network(format!(
                "GET {} returned {}",
                self.url,
                response.status()
            )));
        }
        let body = response.text().await?;
        Document::from_json(&body)
    }

    async fn replace(&self, doc: &Document) -> Result<()> {
        let response = self.client.post(&self.url).json(doc).send().await?;
        if !response.status().is_success() {
            return Err(MealPlanError::Network(format!(
                "POST {} returned {}",
                self.url,
                response.status()
            )));
        }
        Ok(())
    }
}

/// In-process remote store that can be switched offline.
#[derive(Default)]
pub struct MemoryRemote {
    doc: Mutex<Option<Document>>,
    offline: AtomicBool,
}

impl MemoryRemote {
    pub fn new(doc: Document) -> Self {
        Self {
            doc: Mutex::new(Some(doc)),
            offline: AtomicBool::new(false),
        }
    }

    /// A remote that refuses every request.
    pub fn offline() -> Self {
        let remote = Self::default();
        remote.set_offline(true);
        remote
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// What the remote currently holds.
    pub fn snapshot(&self) -> Option<Document> {
        self.doc.lock().ok().and_then(|doc| doc.clone())
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(MealPlanError::Network("remote store is offline".to_string()));
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch(&self) -> Result<Document> {
        self.check_online()?;
        let doc = self
            .doc
            .lock()
            .map_err(|_| MealPlanError::Network("remote store lock poisoned".to_string()))?;
        doc.clone()
            .ok_or_else(|| MealPlanError::Network("remote store has no data".to_string()))
    }

    async fn replace(&self, doc: &Document) -> Result<()> {
        self.check_online()?;
        let mut stored = self
            .doc
            .lock()
            .map_err(|_| MealPlanError::Network("remote store lock poisoned".to_string()))?;
        *stored = Some(doc.clone());
        Ok(())
    }
}
