//! Command router: one inbound chat message in, exactly one outbound effect out.
//!
//! Every collaborator call is bounded by a deadline and its failure goes
//! through the collaborator's [`FailurePolicy`]. Nothing a handler does can
//! fail the router itself; errors end up in the log and the chat gets a plain
//! sentence.

use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    commands::{display_file_name, is_track_id, Command, TrackRef},
    config::Config,
    domain::{ChatId, ChatMessage, DownloadArtifact, Track},
    errors::Error,
    logging::Logger,
    policy::{settle, FailurePolicy, Settled},
    ports::{AudioEncoder, ChatGateway, FileFetcher, MusicCatalog},
    session::SessionStore,
    Result,
};

pub const WELCOME: &str =
    "Welcome to the Spotify FLAC Downloader Bot! Use /help to see available commands.";
pub const HELP: &str = "Available commands:\n\
/start - Start the bot\n\
/search - Search for a song\n\
/download - Download a song\n\
/help - Show this help message";
pub const SEARCH_ERROR: &str = "Error searching for the song. Please try again later.";
pub const DOWNLOAD_ERROR: &str = "Error downloading the song. Please try again later.";
pub const UNKNOWN: &str = "Unknown command. Please use /help to see available commands.";
pub const SEARCH_USAGE: &str =
    "Please tell me what to search for, e.g. /search Bohemian Rhapsody";
pub const DOWNLOAD_USAGE: &str = "Please tell me what to download, \
e.g. /download <song or Spotify link>, or /search for a song first.";

/// Outbound effect of handling one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    File(DownloadArtifact),
}

impl Reply {
    fn text(s: &str) -> Self {
        Reply::Text(s.to_string())
    }
}

/// Everything the router talks to, constructed once at startup.
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn MusicCatalog>,
    pub fetcher: Arc<dyn FileFetcher>,
    pub encoder: Arc<dyn AudioEncoder>,
    pub gateway: Arc<dyn ChatGateway>,
    pub logger: Arc<dyn Logger>,
}

#[derive(Clone, Debug)]
pub struct RouterSettings {
    pub download_dir: PathBuf,
    /// Deadline for catalog lookups and text sends.
    pub request_timeout: Duration,
    /// Deadline for the file fetch and the file upload.
    pub download_timeout: Duration,
    pub session_ttl: Duration,
}

impl RouterSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            download_dir: cfg.download_dir.clone(),
            request_timeout: cfg.request_timeout,
            download_timeout: cfg.download_timeout,
            session_ttl: cfg.session_ttl,
        }
    }
}

/// Why a download stopped early.
enum Abort {
    /// The user gave nothing usable; answer with usage, log nothing.
    Usage,
    /// A swallowed failure, already logged.
    Logged,
    Failed(Error),
}

impl From<Error> for Abort {
    fn from(e: Error) -> Self {
        Abort::Failed(e)
    }
}

pub struct CommandRouter {
    deps: Collaborators,
    settings: RouterSettings,
    sessions: SessionStore,
}

impl CommandRouter {
    pub fn new(deps: Collaborators, settings: RouterSettings) -> Self {
        let sessions = SessionStore::new(settings.session_ttl);
        Self {
            deps,
            settings,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound message end to end.
    pub async fn handle(&self, message: ChatMessage) {
        let reply = self.respond(&message).await;
        self.deliver(message.chat_id, reply).await;
    }

    /// Compute the reply for a message without sending it.
    pub async fn respond(&self, message: &ChatMessage) -> Reply {
        let command = Command::parse(&message.text);
        self.deps
            .logger
            .debug(&format!("chat {}: {command:?}", message.chat_id.0));

        match command {
            Command::Start => Reply::text(WELCOME),
            Command::Search(query) => self.search(message.chat_id, &query).await,
            Command::Download(arg) => self.download(message.chat_id, arg.as_deref()).await,
            Command::Help => Reply::text(HELP),
            Command::Unknown => Reply::text(UNKNOWN),
        }
    }

    async fn search(&self, chat_id: ChatId, query: &str) -> Reply {
        if query.is_empty() {
            return Reply::text(SEARCH_USAGE);
        }

        let found = self
            .catalog_call("track search", self.deps.catalog.search_track(query))
            .await;
        match found {
            Ok(Settled::Value(Some(track))) => {
                let reply = format!("Song found: {}", track.describe());
                self.sessions.remember(chat_id, track).await;
                Reply::Text(reply)
            }
            Ok(Settled::Value(None)) => {
                self.deps
                    .logger
                    .error(&Error::NotFound(format!("no track matches {query:?}")));
                Reply::text(SEARCH_ERROR)
            }
            Ok(Settled::Swallowed) => Reply::text(SEARCH_ERROR),
            Err(e) => {
                self.deps.logger.error(&e);
                Reply::text(SEARCH_ERROR)
            }
        }
    }

    async fn download(&self, chat_id: ChatId, arg: Option<&str>) -> Reply {
        match self.fetch_track(chat_id, arg).await {
            Ok(artifact) => {
                self.deps.logger.info(&format!(
                    "sending {} to chat {}",
                    artifact.display_name, chat_id.0
                ));
                Reply::File(artifact)
            }
            Err(Abort::Usage) => Reply::text(DOWNLOAD_USAGE),
            Err(Abort::Logged) => Reply::text(DOWNLOAD_ERROR),
            Err(Abort::Failed(e)) => {
                self.deps.logger.error(&e);
                Reply::text(DOWNLOAD_ERROR)
            }
        }
    }

    /// Resolve the track, fetch it to `<download_dir>/<chat>/<id>.flac` and encode it.
    ///
    /// Chats are handled concurrently but each chat's messages in order, so a
    /// per-chat directory gives every in-flight download its own file.
    async fn fetch_track(
        &self,
        chat_id: ChatId,
        arg: Option<&str>,
    ) -> std::result::Result<DownloadArtifact, Abort> {
        let track = match arg {
            None => self
                .sessions
                .last_track(chat_id)
                .await
                .ok_or(Abort::Usage)?,
            Some(arg) => self.resolve_track(arg).await?,
        };
        if !is_track_id(&track.id) {
            return Err(Error::InvalidInput(format!("unusable track id {:?}", track.id)).into());
        }

        let url = found(
            self.catalog_call(
                "download URL lookup",
                self.deps.catalog.download_url(&track.id),
            )
            .await?,
            || format!("no download URL for track {}", track.id),
        )?;

        let path = self
            .settings
            .download_dir
            .join(chat_id.0.to_string())
            .join(format!("{}.flac", track.id));

        let fetched = bounded(
            "file fetch",
            self.settings.download_timeout,
            self.deps.fetcher.fetch(&url, &path),
        )
        .await;
        if matches!(fetched, Err(Error::Timeout { .. })) {
            // The fetch was dropped mid-write; its own cleanup never ran.
            let _ = tokio::fs::remove_file(&path).await;
        }
        self.step(fetched, self.deps.fetcher.failure_policy())?;

        let encoded = self.deps.encoder.encode_flac(&path).await;
        self.step(encoded, self.deps.encoder.failure_policy())?;

        Ok(DownloadArtifact {
            local_path: path,
            display_name: display_file_name(&track.title),
        })
    }

    async fn resolve_track(&self, arg: &str) -> std::result::Result<Track, Abort> {
        let lookup = match TrackRef::parse(arg) {
            TrackRef::Id(id) if is_track_id(&id) => {
                self.catalog_call("track lookup", self.deps.catalog.get_track(&id))
                    .await?
            }
            TrackRef::Id(id) => {
                return Err(Error::InvalidInput(format!("not a track id: {id:?}")).into())
            }
            TrackRef::Query(q) => {
                self.catalog_call("track search", self.deps.catalog.search_track(&q))
                    .await?
            }
        };
        found(lookup, || format!("no track matches {arg:?}"))
    }

    async fn catalog_call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<Settled<T>> {
        let out = bounded(op, self.settings.request_timeout, fut).await;
        settle(
            out,
            self.deps.catalog.failure_policy(),
            self.deps.logger.as_ref(),
        )
    }

    fn step(&self, out: Result<()>, policy: FailurePolicy) -> std::result::Result<(), Abort> {
        match settle(out, policy, self.deps.logger.as_ref())? {
            Settled::Value(()) => Ok(()),
            Settled::Swallowed => Err(Abort::Logged),
        }
    }

    async fn deliver(&self, chat_id: ChatId, reply: Reply) {
        let gateway = &self.deps.gateway;
        let sent = match &reply {
            Reply::Text(text) => {
                bounded(
                    "send message",
                    self.settings.request_timeout,
                    gateway.send_text(chat_id, text),
                )
                .await
            }
            Reply::File(artifact) => {
                bounded(
                    "send file",
                    self.settings.download_timeout,
                    gateway.send_file(chat_id, &artifact.local_path, &artifact.display_name),
                )
                .await
            }
        };
        if let Err(e) = settle(sent, gateway.failure_policy(), self.deps.logger.as_ref()) {
            self.deps.logger.error(&e);
        }
    }
}

async fn bounded<T>(
    op: &'static str,
    after: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(after, fut)
        .await
        .unwrap_or_else(|_| Err(Error::Timeout { op, after }))
}

fn found<T>(
    settled: Settled<Option<T>>,
    what: impl FnOnce() -> String,
) -> std::result::Result<T, Abort> {
    match settled {
        Settled::Value(Some(v)) => Ok(v),
        Settled::Value(None) => Err(Error::NotFound(what()).into()),
        Settled::Swallowed => Err(Abort::Logged),
    }
}
