use std::time::Duration;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the router can
/// handle every collaborator's failure the same way (log it, answer the chat
/// with a plain sentence).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Music catalog (Spotify) failures.
    #[error("error interacting with Spotify API: {0}")]
    Upstream(String),

    /// HTTP download failures.
    #[error("error downloading file: {0}")]
    Transfer(String),

    /// Chat transport send failures.
    #[error("error sending to chat: {0}")]
    Delivery(String),

    #[error("startup failed: {0}")]
    Startup(String),

    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failed_collaborator() {
        assert_eq!(
            Error::Upstream("401".into()).to_string(),
            "error interacting with Spotify API: 401"
        );
        assert_eq!(
            Error::Timeout {
                op: "file fetch",
                after: Duration::from_secs(3)
            }
            .to_string(),
            "file fetch timed out after 3s"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
