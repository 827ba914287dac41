use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use stb_core::router::CommandRouter;

use crate::handlers;

/// Commands advertised in the Telegram client's command menu.
fn command_menu() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Start the bot"),
        BotCommand::new("search", "Search for a song"),
        BotCommand::new("download", "Download a song"),
        BotCommand::new("help", "Show this help message"),
    ]
}

/// Verify the bot token, then poll for updates until SIGINT/SIGTERM.
///
/// Fails only if the bot cannot start; once polling runs, handler errors are
/// dealt with inside the command router.
pub async fn run_polling(bot: Bot, router: Arc<CommandRouter>) -> anyhow::Result<()> {
    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("telegram getMe failed: {e}"))?;
    tracing::info!(username = %me.username(), "Bot started successfully!");

    if let Err(e) = bot.set_my_commands(command_menu()).await {
        tracing::warn!("failed to publish command menu: {e}");
    }

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![router, me])
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received; stopping update polling");
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => tracing::warn!("dispatcher was not running: {e}"),
        }
    });

    dispatcher.dispatch().await;
    tracing::info!("update polling stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("cannot listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
