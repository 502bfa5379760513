use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no access token configured for provider {0}")]
    NotConfigured(String),

    #[error(transparent)]
    Broker(#[from] gw_broker::Error),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Message(String),
}

impl gw_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

gw_common::impl_context!();
