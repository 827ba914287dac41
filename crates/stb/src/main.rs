use std::sync::Arc;

use stb_core::{
    config::{self, Config, LogConfig},
    encode::NoopEncoder,
    fetch::HttpFileFetcher,
    logging::{Logger, TracingLogger},
    router::{Collaborators, CommandRouter, RouterSettings},
    Error,
};
use stb_spotify::SpotifyClient;
use stb_telegram::TelegramGateway;

#[tokio::main]
async fn main() -> Result<(), Error> {
    config::load_dotenv();
    stb_core::logging::init(&LogConfig::from_env())?;

    let logger = TracingLogger;
    if let Err(e) = run(Arc::new(logger)).await {
        logger.error(&e);
        return Err(e);
    }
    Ok(())
}

async fn run(logger: Arc<dyn Logger>) -> Result<(), Error> {
    let cfg = Config::load()?;

    let catalog = SpotifyClient::new(
        cfg.spotify_client_id.clone(),
        cfg.spotify_client_secret.clone(),
        cfg.request_timeout,
    )?;
    let fetcher = HttpFileFetcher::new(cfg.download_timeout)?;

    let gateway = TelegramGateway::from_token(cfg.telegram_bot_token.clone());
    let bot = gateway.bot();

    let router = Arc::new(CommandRouter::new(
        Collaborators {
            catalog: Arc::new(catalog),
            fetcher: Arc::new(fetcher),
            encoder: Arc::new(NoopEncoder),
            gateway: Arc::new(gateway),
            logger,
        },
        RouterSettings::from_config(&cfg),
    ));

    stb_telegram::router::run_polling(bot, router)
        .await
        .map_err(|e| Error::Startup(format!("telegram bot failed: {e}")))
}
