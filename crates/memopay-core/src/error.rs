/// Core domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid memo: {0}")]
    InvalidMemo(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
