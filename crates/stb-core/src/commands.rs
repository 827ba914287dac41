//! Parsing of inbound chat text into bot commands.

/// A parsed bot command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Trimmed query; may be empty.
    Search(String),
    /// Trimmed argument; `None` when the user gave none.
    Download(Option<String>),
    Help,
    Unknown,
}

impl Command {
    /// Match the leading token case-sensitively. Telegram may append
    /// `@botname` to the command (`/search@MyBot q`); that suffix is ignored
    /// here, so drop commands meant for other bots with
    /// [`addressed_to_other_bot`] first.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (first, rest) = match text.split_once(char::is_whitespace) {
            Some((first, rest)) => (first, rest.trim()),
            None => (text, ""),
        };
        let name = first.split('@').next().unwrap_or("");

        match name {
            "/start" => Command::Start,
            "/search" => Command::Search(rest.to_string()),
            "/download" if rest.is_empty() => Command::Download(None),
            "/download" => Command::Download(Some(rest.to_string())),
            "/help" => Command::Help,
            _ => Command::Unknown,
        }
    }
}

/// True for a command whose `@botname` suffix names a bot other than
/// `own_username`. Usernames compare case-insensitively, like Telegram does.
pub fn addressed_to_other_bot(text: &str, own_username: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or("");
    match first.strip_prefix('/').and_then(|cmd| cmd.split_once('@')) {
        Some((_, target)) => !target.eq_ignore_ascii_case(own_username),
        None => false,
    }
}

/// What a `/download` argument points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackRef {
    /// A catalog track id (from a link, a URI or given bare).
    Id(String),
    /// Free text, resolved through search.
    Query(String),
}

const SPOTIFY_ID_LEN: usize = 22;

impl TrackRef {
    pub fn parse(arg: &str) -> Self {
        let arg = arg.trim();

        let from_link = arg
            .split_once("open.spotify.com/")
            .map(|(_, path)| path)
            .and_then(|path| {
                // Localized links look like `open.spotify.com/intl-de/track/<id>`.
                let mut segments = path.split('/');
                segments.find(|s| *s == "track")?;
                segments.next()
            })
            .map(|id| id.split(['?', '#']).next().unwrap_or(""));
        let from_uri = arg.strip_prefix("spotify:track:");

        if let Some(id) = from_link.or(from_uri) {
            return TrackRef::Id(id.to_string());
        }
        if arg.len() == SPOTIFY_ID_LEN && is_track_id(arg) {
            return TrackRef::Id(arg.to_string());
        }
        TrackRef::Query(arg.to_string())
    }
}

/// Track ids are used as local file names, so only ASCII alphanumerics pass.
pub fn is_track_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// File name shown in the chat for a downloaded track.
pub fn display_file_name(title: &str) -> String {
    let title = title.trim();
    let base: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    if base.is_empty() {
        "track.flac".to_string()
    } else {
        format!("{base}.flac")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_each_command() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(
            Command::parse("/search Test Song"),
            Command::Search("Test Song".into())
        );
        assert_eq!(Command::parse("/download"), Command::Download(None));
        assert_eq!(
            Command::parse("/download   abc  "),
            Command::Download(Some("abc".into()))
        );
        assert_eq!(Command::parse("/help"), Command::Help);
    }

    #[test]
    fn matching_is_case_sensitive_and_exact() {
        assert_eq!(Command::parse("/HELP"), Command::Unknown);
        assert_eq!(Command::parse("/helpme"), Command::Unknown);
        assert_eq!(Command::parse("help"), Command::Unknown);
        assert_eq!(Command::parse("/unknown"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
        assert_eq!(Command::parse("hello /help"), Command::Unknown);
    }

    #[test]
    fn trailing_text_is_ignored_for_help_and_start() {
        assert_eq!(Command::parse("/help me please"), Command::Help);
        assert_eq!(Command::parse("  /start now"), Command::Start);
    }

    #[test]
    fn bot_name_suffix_is_stripped() {
        assert_eq!(
            Command::parse("/search@SpotifyFlacBot queen"),
            Command::Search("queen".into())
        );
        assert_eq!(Command::parse("/help@SpotifyFlacBot"), Command::Help);
    }

    #[test]
    fn commands_for_other_bots_are_recognized() {
        assert!(addressed_to_other_bot("/help@SomeOtherBot", "SpotifyFlacBot"));
        assert!(addressed_to_other_bot(
            "/search@OtherBot queen",
            "SpotifyFlacBot"
        ));
        assert!(!addressed_to_other_bot("/help@spotifyflacbot", "SpotifyFlacBot"));
        assert!(!addressed_to_other_bot("/help", "SpotifyFlacBot"));
        assert!(!addressed_to_other_bot("mail me@example.com", "SpotifyFlacBot"));
        assert!(!addressed_to_other_bot("", "SpotifyFlacBot"));
    }

    #[test]
    fn search_keeps_inner_whitespace() {
        assert_eq!(
            Command::parse("/search\tBohemian  Rhapsody "),
            Command::Search("Bohemian  Rhapsody".into())
        );
        assert_eq!(Command::parse("/search   "), Command::Search(String::new()));
    }

    #[test]
    fn track_ref_from_links_uris_and_ids() {
        let id = "4uLU6hMCjMI75M1A2tKUQC";
        assert_eq!(
            TrackRef::parse(&format!("https://open.spotify.com/track/{id}?si=xyz")),
            TrackRef::Id(id.into())
        );
        assert_eq!(
            TrackRef::parse(&format!("https://open.spotify.com/intl-de/track/{id}")),
            TrackRef::Id(id.into())
        );
        assert_eq!(
            TrackRef::parse(&format!("spotify:track:{id}")),
            TrackRef::Id(id.into())
        );
        assert_eq!(TrackRef::parse(id), TrackRef::Id(id.into()));
    }

    #[test]
    fn anything_else_is_a_query() {
        assert_eq!(
            TrackRef::parse("testDownloadURL"),
            TrackRef::Query("testDownloadURL".into())
        );
        assert_eq!(
            TrackRef::parse("never gonna give you up"),
            TrackRef::Query("never gonna give you up".into())
        );
        assert_eq!(
            TrackRef::parse("https://open.spotify.com/album/xyz"),
            TrackRef::Query("https://open.spotify.com/album/xyz".into())
        );
    }

    #[test]
    fn track_ids_reject_path_characters() {
        assert!(is_track_id("testSongId"));
        assert!(!is_track_id("../etc/passwd"));
        assert!(!is_track_id("a b"));
        assert!(!is_track_id(""));
    }

    #[test]
    fn display_name_comes_from_title() {
        assert_eq!(display_file_name("Test Song"), "Test Song.flac");
        assert_eq!(display_file_name("AC/DC Live"), "AC_DC Live.flac");
        assert_eq!(display_file_name("  "), "track.flac");
    }
}
