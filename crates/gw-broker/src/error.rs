use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// No `TokenRecord` exists for `(user_id, provider)` — the user never
    /// completed the authorization flow for this provider.
    #[error("no_credentials")]
    NoCredentials,

    /// The refresh attempt itself failed; the upstream message is carried
    /// verbatim so handlers can surface it (spec.md §7 "auth failure").
    #[error("refresh_failed: {0}")]
    RefreshFailed(String),

    #[error("unknown or unconfigured provider: {0}")]
    UnknownProvider(String),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Oauth(#[from] gw_oauth::Error),

    #[error(transparent)]
    Store(#[from] gw_store::Error),
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// The machine-readable error kind named in spec.md §4.5's operation
    /// contract table (`no_credentials` / `refresh_failed`).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoCredentials => "no_credentials",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::UnknownProvider(_) => "unknown_provider",
            Self::Message(_) | Self::Oauth(_) | Self::Store(_) => "internal",
        }
    }
}

impl gw_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

gw_common::impl_context!();
