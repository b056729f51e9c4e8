//! Prints the usage statistics report to the console.

use lead_intake_bot::core::statistics::StatisticsReport;
use lead_intake_bot::core::templates;
use lead_intake_bot::infrastructure::database::DatabaseConnection;
use lead_intake_bot::infrastructure::repositories::DbEventStore;
use lead_intake_bot::infrastructure::settings::Settings;
use lead_intake_bot::infrastructure::traits::EventStore;

use chrono::Local;
use di::Ref;
use tokio::runtime::Builder;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let runtime = Builder::new_current_thread().enable_all().build()?;
    if let Err(e) = runtime.block_on(print_statistics()) {
        println!("❌ Ошибка при получении статистики: {e}");
        println!("Убедитесь, что бот был запущен хотя бы один раз для создания БД.");
    }

    Ok(())
}

async fn print_statistics() -> anyhow::Result<()> {
    let settings = Ref::new(Settings::create());
    let store = DbEventStore::new(Ref::new(DatabaseConnection::create(settings)));

    let report = StatisticsReport::from(store.statistics().await?);
    println!("{}", report.render_console(&templates::environment()?, Local::now())?);

    Ok(())
}
