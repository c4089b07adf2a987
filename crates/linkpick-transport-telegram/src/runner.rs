use crate::bot::handlers::{self, Command};
use crate::config::BotSettings;
use anyhow::Result;
use linkpick_core::liveness::LivenessFilter;
use linkpick_core::probe::HttpProber;
use linkpick_core::provider::YtdlpProvider;
use linkpick_core::resolver::FormatResolver;
use linkpick_core::NavigationController;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};

/// Run the Telegram transport runtime.
///
/// # Errors
///
/// Returns an error if the HTTP prober cannot be built.
pub async fn run_bot(settings: Arc<BotSettings>, provider: Arc<YtdlpProvider>) -> Result<()> {
    let controller = Arc::new(init_controller(&settings, provider.clone())?);
    info!(
        "Navigation controller initialized (page probes: {}, session ttl: {}s).",
        settings.core.probe_concurrency, settings.core.session_ttl_secs
    );

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller, provider, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}

fn init_controller(
    settings: &BotSettings,
    provider: Arc<YtdlpProvider>,
) -> Result<NavigationController> {
    let core = settings.core.as_ref();
    let prober = HttpProber::new(core.probe_timeout())?;
    let resolver = FormatResolver::from_settings(provider, core);
    let liveness = LivenessFilter::from_settings(Arc::new(prober), core);
    Ok(NavigationController::from_settings(resolver, liveness, core))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_url),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    controller: Arc<NavigationController>,
    provider: Arc<YtdlpProvider>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::Help => handlers::help(bot, msg).await,
        Command::Clear => handlers::clear(bot, msg, controller).await,
        Command::Healthcheck => handlers::healthcheck(bot, msg, provider).await,
        Command::Stats => handlers::stats(bot, msg, controller).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_url(
    bot: Bot,
    msg: Message,
    controller: Arc<NavigationController>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_url(bot, msg, controller).await {
        error!("URL handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<NavigationController>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_callback(bot, q, controller).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
