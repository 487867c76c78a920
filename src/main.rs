//! Application entry point for clubhouse.
//!
//! Initializes all components and starts the Discord bot.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clubhouse::bot::Bot;
use clubhouse::config::Config;
use clubhouse::feed::jnovel_platform::JNovelPlatform;
use clubhouse::feed::mangadex_platform::MangaDexPlatform;
use clubhouse::feed::nyaa_platform::NyaaPlatform;
use clubhouse::logging::setup_logging;
use clubhouse::repository::Repository;
use clubhouse::service::Services;
use clubhouse::subscriber::Notifier;
use clubhouse::subscriber::discord_notifier::DiscordNotifier;
use clubhouse::task::FeedKind;
use clubhouse::task::TaskRegistry;
use clubhouse::task::daily_scheduler::DailyScheduler;
use clubhouse::task::jnovel_poller::JNovelPoller;
use clubhouse::task::mangadex_poller::MangaDexPoller;
use clubhouse::task::nyaa_poller::NyaaPoller;
use clubhouse::task::poll_task::PollTask;
use dotenv::dotenv;
use log::debug;
use log::info;
use serenity::all::Http;

/// Upstream clients shared by the pollers and the command services.
struct Platforms {
    nyaa: Arc<NyaaPlatform>,
    mangadex: Arc<MangaDexPlatform>,
    jnovel: Arc<JNovelPlatform>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config()?;

    let db = setup_database(&config, init_start).await?;
    let platforms = setup_platforms(&config)?;
    let notifier: Arc<dyn Notifier> =
        Arc::new(DiscordNotifier::new(Arc::new(Http::new(&config.discord_token))));

    let scheduler = setup_scheduler(&config, db.clone(), notifier.clone()).await?;
    let services = Arc::new(Services::new(
        db.clone(),
        scheduler.clone(),
        platforms.mangadex.clone(),
        platforms.jnovel.clone(),
        config.weekly_timezone,
    ));

    let tasks = setup_pollers(&config, db, &platforms, notifier, init_start)?;

    info!("Starting bot...");
    let mut bot = Bot::new(config.clone(), services);
    bot.start()?;

    run(init_start).await?;

    tasks.stop_all();
    scheduler.shutdown();
    bot.shutdown().await;
    info!("Shutdown complete.");
    Ok(())
}

fn load_config() -> Result<Arc<Config>> {
    let mut config = Config::new();
    config.load()?;
    let config = Arc::new(config);
    setup_logging(&config)?;
    info!("Starting clubhouse...");
    Ok(config)
}

async fn setup_database(config: &Config, init_start: Instant) -> Result<Arc<Repository>> {
    debug!("Setting up Repository...");
    let db = Arc::new(Repository::new(&config.db_url, &config.db_path).await?);

    info!("Running database migrations...");
    db.run_migrations().await?;
    info!(
        "Database setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    Ok(db)
}

fn setup_platforms(config: &Config) -> Result<Platforms> {
    debug!("Setting up Platforms...");
    Ok(Platforms {
        nyaa: Arc::new(NyaaPlatform::new(config.http_timeout)?),
        mangadex: Arc::new(MangaDexPlatform::new(config.http_timeout)?),
        jnovel: Arc::new(JNovelPlatform::new(config.http_timeout)?),
    })
}

async fn setup_scheduler(
    config: &Config,
    db: Arc<Repository>,
    notifier: Arc<dyn Notifier>,
) -> Result<Arc<DailyScheduler>> {
    let scheduler = DailyScheduler::new(db, notifier);
    if config.features.daily {
        debug!("Scheduling daily reminders...");
        scheduler.schedule().await?;
    }
    Ok(scheduler)
}

fn setup_pollers(
    config: &Config,
    db: Arc<Repository>,
    platforms: &Platforms,
    notifier: Arc<dyn Notifier>,
    init_start: Instant,
) -> Result<TaskRegistry> {
    let mut tasks = TaskRegistry::new();
    if !config.pollers_enabled() {
        info!("Feed pollers are disabled.");
        return Ok(tasks);
    }
    debug!("Setting up feed pollers...");

    tasks.register(
        FeedKind::Nyaa,
        PollTask::new(
            Arc::new(NyaaPoller::new(
                db.clone(),
                platforms.nyaa.clone(),
                notifier.clone(),
            )),
            config.nyaa_poll_interval,
        ),
    );
    tasks.register(
        FeedKind::MangaDex,
        PollTask::new(
            Arc::new(MangaDexPoller::new(
                db.clone(),
                platforms.mangadex.clone(),
                notifier.clone(),
            )),
            config.mangadex_poll_interval,
        ),
    );
    tasks.register(
        FeedKind::JNovel,
        PollTask::new(
            Arc::new(JNovelPoller::new(db, platforms.jnovel.clone(), notifier)),
            config.jnovel_poll_interval,
        ),
    );
    tasks.start_all()?;

    info!(
        "Feed pollers started ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
    Ok(tasks)
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "clubhouse is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
