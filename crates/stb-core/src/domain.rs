use std::path::PathBuf;

/// Chat id of the messaging transport (numeric for Telegram).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// One inbound chat message. Built per update and dropped once handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub chat_id: ChatId,
    pub text: String,
}

impl ChatMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// A catalog track as returned by the music catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub external_url: Option<String>,
}

impl Track {
    /// `"{title} by {artist} from {album}"`
    pub fn describe(&self) -> String {
        format!("{} by {} from {}", self.title, self.artist, self.album)
    }
}

/// A file fetched to local disk, ready to be attached to a chat message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub local_path: PathBuf,
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_substitutes_literal_fields() {
        let t = Track {
            id: "abc".into(),
            title: "Test Song".into(),
            artist: "Test Artist".into(),
            album: "Test Album".into(),
            external_url: None,
        };
        assert_eq!(t.describe(), "Test Song by Test Artist from Test Album");
    }
}
