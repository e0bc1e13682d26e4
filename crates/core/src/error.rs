use thiserror::Error;

pub type DeliveryResult<T> = Result<T, DeliveryError>;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Campaign read error: {0}")]
    CampaignRead(String),

    #[error("Event recording error: {0}")]
    Recording(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
