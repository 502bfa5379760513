use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate tool name {0:?} registered by both {1:?} and {2:?}")]
    DuplicateTool(String, String, String),

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
