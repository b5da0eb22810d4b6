use thiserror::Error;

#[derive(Error, Debug)]
pub enum MealPlanError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Local storage error: {0}")]
    LocalStorage(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Failed to save changes. Please try again.")]
    SaveFailed,

    #[error("Unknown field: {0}. Run 'mealplan fields' to list editable fields.")]
    UnknownField(String),
}

impl From<reqwest::Error> for MealPlanError {
    fn from(err: reqwest::Error) -> Self {
        MealPlanError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MealPlanError>;
