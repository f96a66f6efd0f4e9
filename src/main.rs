//! Wiring & DI. Entry point: parse the subcommand, bootstrap adapters, inject into services.
//! No business logic here.

use anyhow::{Context, bail};
use assignbot::adapters::persistence::{DialogStateJson, SqliteRepo};
use assignbot::adapters::telegram::BotApiClient;
use assignbot::adapters::ui::{console, self_test, tui};
use assignbot::domain::DomainError;
use assignbot::ports::{BotGateway, DialogStatePort, InputPort, UpdateSource};
use assignbot::shared::config::{AppConfig, ensure_directories, write_env_template};
use assignbot::shared::logging;
use assignbot::usecases::{
    BotDispatcher, BotServices, DeliveryPolicy, NotificationStores, NotificationWorker,
    ServiceOptions, UpdateLoop, UserService,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "assignbot", version, about = "University assignments Telegram bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Run the bot (default)
    Run,
    /// Create the database schema and seed data
    InitDb,
    /// Create the owner account interactively
    SetupOwner,
    /// Create working directories and .env template, then validate configuration
    CheckConfig,
    /// Check database, join codes, dates, validators and formatting
    SelfTest,
}

fn load_config() -> anyhow::Result<AppConfig> {
    AppConfig::load().context("failed to read configuration")
}

fn tz_of(cfg: &AppConfig) -> anyhow::Result<chrono_tz::Tz> {
    cfg.tz().map_err(|e| anyhow::anyhow!(e))
}

async fn open_repo(cfg: &AppConfig) -> anyhow::Result<Arc<SqliteRepo>> {
    let repo = SqliteRepo::connect(cfg.db_path_or_default(), cfg.db_timeout_or_default())
        .await
        .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?;
    Ok(Arc::new(repo))
}

async fn run_bot(cfg: AppConfig) -> anyhow::Result<()> {
    if let Err(errors) = cfg.validate() {
        for e in &errors {
            console::failure(e);
        }
        bail!("invalid configuration ({} problems)", errors.len());
    }
    let log_file = PathBuf::from(cfg.log_file_or_default());
    logging::init(
        &cfg.log_level_or_default(),
        Some((
            &log_file,
            cfg.max_log_bytes_or_default(),
            cfg.log_backup_count_or_default(),
        )),
    )
    .context("logging init failed")?;

    let tz = tz_of(&cfg)?;
    let token = cfg.bot_token().unwrap_or_default().to_string();
    let owner_id = cfg.owner_telegram_id.unwrap_or_default();

    let repo = open_repo(&cfg).await?;
    repo.initialize()
        .await
        .map_err(|e| anyhow::anyhow!("schema init failed: {}", e))?;

    let services = BotServices::from_store(
        Arc::clone(&repo),
        ServiceOptions {
            bot_username: cfg.bot_username_or_default(),
            max_students: cfg.max_students_or_default(),
            tz,
            edit_window: cfg.edit_window_or_default(),
        },
    );
    if services
        .users
        .ensure_owner(owner_id, &cfg.owner_name_or_default())
        .await
        .map_err(|e| anyhow::anyhow!("owner setup failed: {}", e))?
    {
        info!(owner_id, "owner account created from configuration");
    }

    let dialogs = DialogStateJson::new(Path::new(&cfg.data_dir_or_default()).join("dialogs.json"));
    dialogs.load().await.map_err(|e| anyhow::anyhow!("{}", e))?;
    let dialogs: Arc<dyn DialogStatePort> = Arc::new(dialogs);

    let client = Arc::new(BotApiClient::new(cfg.telegram_api_url_or_default(), token));
    let bot: Arc<dyn BotGateway> = Arc::clone(&client) as Arc<dyn BotGateway>;
    let source: Arc<dyn UpdateSource> = client;

    // Bounded queue: handlers wait when the worker falls behind.
    let queue_size = cfg.notification_queue_size_or_default();
    let (notify_tx, notify_rx) = mpsc::channel(queue_size);
    let policy = DeliveryPolicy {
        batch_size: cfg.notification_batch_size_or_default(),
        send_delay: cfg.notification_delay_or_default(),
        batch_pause: Duration::from_secs(1),
        attempts: cfg.notification_retry_attempts_or_default(),
    };
    let worker = NotificationWorker::new(
        Arc::clone(&bot),
        NotificationStores::from_store(Arc::clone(&repo)),
        notify_rx,
        policy,
        tz,
    );
    let worker_handle = tokio::spawn(worker.run());

    let dispatcher: Arc<dyn InputPort> =
        Arc::new(BotDispatcher::new(bot, dialogs, services, notify_tx));
    info!(
        bot = %cfg.bot_username_or_default(),
        name = %cfg.bot_name_or_default(),
        queue_size,
        timezone = %tz,
        "bot started"
    );
    UpdateLoop::new(source, dispatcher, cfg.poll_timeout_secs_or_default())
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;

    // The loop owned the last sender; the worker drains queued jobs and exits.
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "notification worker panicked");
    }
    info!("bot stopped");
    Ok(())
}

async fn init_db(cfg: &AppConfig) -> anyhow::Result<()> {
    console::heading("🎓 إنشاء قاعدة بيانات بوت الواجبات");
    let repo = open_repo(cfg).await?;
    match repo.initialize().await {
        Ok(summary) => {
            console::success(&format!("قاعدة البيانات جاهزة: {}", repo.path().display()));
            console::info(&format!("   الجداول: {}", summary.tables));
            console::info(&format!("   المراحل الدراسية: {}", summary.levels));
            console::info(&format!("   المواد: {}", summary.subjects));
            console::info(&format!("   الإعدادات: {}", summary.settings));
            console::info(&format!("   الميزات: {}", summary.features));
            Ok(())
        }
        Err(e) => {
            console::failure(&format!("فشل إنشاء قاعدة البيانات: {}", e));
            bail!("init-db failed")
        }
    }
}

async fn setup_owner(cfg: &AppConfig) -> anyhow::Result<()> {
    console::heading("👑 إعداد المالك");
    if !Path::new(&cfg.db_path_or_default()).exists() {
        console::failure("قاعدة البيانات غير موجودة");
        console::info("   الرجاء تشغيل: assignbot init-db");
        bail!("database missing");
    }
    let repo = open_repo(cfg).await?;
    let users = UserService::new(
        repo.clone(),
        repo.clone(),
        repo.clone(),
        repo,
    );

    let Some(answers) = tui::prompt_owner().map_err(|e| anyhow::anyhow!("{}", e))? else {
        console::warning("تم الإلغاء");
        return Ok(());
    };
    match users
        .setup_owner(
            answers.telegram_id,
            &answers.full_name,
            answers.username.as_deref(),
        )
        .await
    {
        Ok(user_id) => {
            console::success(&format!("تم إنشاء حساب المالك (user_id = {})", user_id));
            console::info("\nالخطوة التالية: أضف OWNER_TELEGRAM_ID إلى ملف .env ثم شغّل: assignbot run");
            Ok(())
        }
        Err(DomainError::Conflict(_)) => {
            console::warning("هذا المستخدم موجود مسبقاً");
            bail!("user already exists")
        }
        Err(e) => {
            console::failure(&e.to_string());
            bail!("setup-owner failed")
        }
    }
}

fn check_config(cfg: &AppConfig) -> anyhow::Result<()> {
    console::heading("⚙️ فحص الإعدادات");
    ensure_directories(Path::new(".")).context("cannot create working directories")?;
    console::success("تم إنشاء المجلدات: logs, backups, temp");
    if write_env_template(Path::new(".env")).context("cannot write .env template")? {
        console::warning("تم إنشاء ملف .env من القالب. عدّل القيم ثم أعد التشغيل.");
    }
    match cfg.validate() {
        Ok(()) => {
            console::success("الإعدادات صحيحة");
            console::info(&format!("   البوت: @{}", cfg.bot_username_or_default()));
            console::info(&format!("   قاعدة البيانات: {}", cfg.db_path_or_default()));
            console::info(&format!("   المنطقة الزمنية: {}", cfg.timezone_name_or_default()));
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                console::failure(e);
            }
            bail!("invalid configuration ({} problems)", errors.len())
        }
    }
}

async fn self_test(cfg: &AppConfig) -> anyhow::Result<()> {
    let tz = tz_of(cfg)?;
    let results = self_test::run(
        Path::new(&cfg.db_path_or_default()),
        cfg.db_timeout_or_default(),
        tz,
    )
    .await;
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        bail!("{} checks failed", failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_bot(cfg).await,
        Command::InitDb => init_db(&cfg).await,
        Command::SetupOwner => setup_owner(&cfg).await,
        Command::CheckConfig => check_config(&cfg),
        Command::SelfTest => self_test(&cfg).await,
    }
}
