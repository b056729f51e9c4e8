//! Lead intake Telegram bot

use lead_intake_bot::api;
use lead_intake_bot::core::assistant::GrokAssistant;
use lead_intake_bot::core::configuration::StaticConfigurationSource;
use lead_intake_bot::core::dispatcher::Dispatcher;
use lead_intake_bot::infrastructure::database::DatabaseConnection;
use lead_intake_bot::infrastructure::messenger::TelegramMessenger;
use lead_intake_bot::infrastructure::repositories::DbEventStore;
use lead_intake_bot::infrastructure::settings::Settings;
use lead_intake_bot::infrastructure::sheets::SheetsConfigurationSource;

use anyhow::{anyhow, bail};
use di::{Injectable, ServiceCollection, ServiceProvider};
use di_axum::RouterServiceProviderExtensions;
use log::{info, warn};
use teloxide::Bot;
use tokio::runtime::{Builder, Runtime};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(run())
}

fn build_provider(settings: &Settings) -> anyhow::Result<ServiceProvider> {
    let mut services = ServiceCollection::new();
    services
        .add(Settings::singleton())
        .add(DatabaseConnection::singleton())
        .add(DbEventStore::singleton())
        .add(GrokAssistant::singleton())
        .add(TelegramMessenger::singleton())
        .add(Dispatcher::singleton());

    if settings.sheets_enabled() {
        info!("AI configuration is read from the spreadsheet");
        services.add(SheetsConfigurationSource::singleton());
    } else {
        warn!("no spreadsheet configured, using default AI configuration");
        services.add(StaticConfigurationSource::singleton());
    }

    services
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e}"))
}

async fn run() -> anyhow::Result<()> {
    let settings = Settings::create();
    if settings.bot_token.is_empty() {
        bail!("BOT_TOKEN must be set");
    }

    let provider = build_provider(&settings)?;

    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await?;
    info!("database ready");

    match (&settings.operator_api_addr, &settings.operator_api_token) {
        (Some(addr), Some(_)) => {
            let app = api::operator::router().with_provider(provider.clone());
            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!("operator API listening on {}", listener.local_addr()?);
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, app).await {
                    log::error!("operator API stopped: {e}");
                }
            });
        }
        (Some(_), None) => warn!("OPERATOR_API_TOKEN is not set, operator API disabled"),
        _ => {}
    }

    api::telegram::run(
        Bot::new(&settings.bot_token),
        provider.get_required::<Dispatcher>(),
    )
    .await;

    info!("Shutting down...");
    Ok(())
}
