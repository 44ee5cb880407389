use thiserror::Error;

/// Error taxonomy shared by the mail manager and the sorter.
///
/// Connection and Auth are fatal for the command or sort run that hit them.
/// NotFound fails a single operation. Imap covers every other protocol-level
/// refusal; during a sort those are caught per message and recorded in the
/// outcome instead of being propagated.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("authentication rejected for {0}")]
    Auth(String),

    #[error("message {id} not found in {folder}")]
    NotFound { id: u32, folder: String },

    #[error("sending failed: {0}")]
    Send(String),

    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<async_imap::error::Error> for Error {
    fn from(err: async_imap::error::Error) -> Self {
        Error::Imap(err.to_string())
    }
}

impl From<mailparse::MailParseError> for Error {
    fn from(err: mailparse::MailParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
