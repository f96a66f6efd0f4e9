//! Shared fixtures: a seeded temp database, a recording BotGateway and a wired dispatcher.
#![allow(dead_code)]

use assignbot::adapters::persistence::{DialogStateJson, SqliteRepo};
use assignbot::domain::time::now_in;
use assignbot::domain::{
    DomainError, Incoming, IncomingCallback, IncomingMessage, Keyboard, SectionCreated, Sender,
    User,
};
use assignbot::ports::{BotGateway, CatalogRepo, UserRepo};
use assignbot::usecases::{BotDispatcher, BotServices, NotificationJob, ServiceOptions};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

pub const OWNER_TG: i64 = 1_000;
pub const ADMIN_TG: i64 = 2_000;
pub const CALLBACK_MESSAGE_ID: i64 = 77;

pub fn baghdad() -> Tz {
    "Asia/Baghdad".parse().unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub id: String,
    pub text: Option<String>,
    pub alert: bool,
}

/// BotGateway that records every call. Chats in `blocked` fail with `Blocked`.
#[derive(Default)]
pub struct RecordingBot {
    pub sent: Mutex<Vec<Sent>>,
    pub edits: Mutex<Vec<Sent>>,
    pub answers: Mutex<Vec<Answer>>,
    pub blocked: Mutex<HashSet<i64>>,
    next_id: AtomicI64,
}

impl RecordingBot {
    pub fn block_chat(&self, chat_id: i64) {
        self.blocked.lock().unwrap().insert(chat_id);
    }

    pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.chat_id == chat_id)
            .map(|s| s.text.clone())
            .collect()
    }

    pub fn last_to(&self, chat_id: i64) -> Sent {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.chat_id == chat_id)
            .cloned()
            .unwrap_or_else(|| panic!("nothing sent to {}", chat_id))
    }

    pub fn last_answer(&self) -> Answer {
        self.answers.lock().unwrap().last().cloned().expect("no callback answer")
    }

    pub fn reset(&self) {
        self.sent.lock().unwrap().clear();
        self.edits.lock().unwrap().clear();
        self.answers.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl BotGateway for RecordingBot {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<i64, DomainError> {
        if self.blocked.lock().unwrap().contains(&chat_id) {
            return Err(DomainError::Blocked);
        }
        self.sent.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        _message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DomainError> {
        self.edits.lock().unwrap().push(Sent {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), DomainError> {
        self.answers.lock().unwrap().push(Answer {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
            alert: show_alert,
        });
        Ok(())
    }
}

pub fn sender(telegram_id: i64, username: Option<&str>) -> Sender {
    Sender {
        telegram_id,
        username: username.map(str::to_string),
        first_name: "Test".into(),
        last_name: None,
    }
}

pub fn message(from: i64, text: &str) -> Incoming {
    Incoming::Message(IncomingMessage {
        chat_id: from,
        message_id: 1,
        from: sender(from, None),
        text: text.to_string(),
    })
}

pub fn callback(from: i64, data: &str, message_text: &str) -> Incoming {
    Incoming::Callback(IncomingCallback {
        id: format!("cb-{}", data),
        from: sender(from, None),
        chat_id: Some(from),
        message_id: Some(CALLBACK_MESSAGE_ID),
        message_text: Some(message_text.to_string()),
        data: data.to_string(),
    })
}

pub fn options(edit_window: chrono::Duration) -> ServiceOptions {
    ServiceOptions {
        bot_username: "TestAssignmentsBot".into(),
        max_students: 50,
        tz: baghdad(),
        edit_window,
    }
}

pub fn options_with_capacity(max_students: i64) -> ServiceOptions {
    ServiceOptions {
        max_students,
        ..options(chrono::Duration::hours(24))
    }
}

/// Seeded database plus services wired on top of it.
pub struct Store {
    pub dir: TempDir,
    pub repo: Arc<SqliteRepo>,
    pub services: BotServices,
}

impl Store {
    pub async fn new() -> Self {
        Self::with_options(options(chrono::Duration::hours(24))).await
    }

    pub async fn with_options(opts: ServiceOptions) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepo::connect(dir.path().join("bot.db"), Duration::from_secs(5))
            .await
            .unwrap();
        repo.initialize().await.unwrap();
        let repo = Arc::new(repo);
        let services = BotServices::from_store(Arc::clone(&repo), opts);
        services
            .users
            .ensure_owner(OWNER_TG, "المالك الرئيسي")
            .await
            .unwrap();
        Self {
            dir,
            repo,
            services,
        }
    }

    pub async fn user(&self, telegram_id: i64) -> User {
        self.repo.get_user(telegram_id).await.unwrap().unwrap()
    }

    pub async fn owner(&self) -> User {
        self.user(OWNER_TG).await
    }

    pub async fn first_level_id(&self) -> i64 {
        self.repo.list_levels().await.unwrap()[0].level_id
    }

    pub async fn admin(&self, telegram_id: i64, name: &str) -> User {
        self.services
            .users
            .assign_admin(&self.owner().await, telegram_id, name)
            .await
            .unwrap()
    }

    /// "المرحلة الأولى - صباحي - شعبة A" administered by `admin_tg`.
    pub async fn section(&self, admin_tg: i64, division: &str) -> SectionCreated {
        let level_id = self.first_level_id().await;
        self.services
            .sections
            .create_section(&self.owner().await, level_id, "صباحي", division, admin_tg)
            .await
            .unwrap()
    }

    pub async fn approved_student(&self, telegram_id: i64, name: &str, section_id: i64) -> User {
        self.services
            .registrations
            .register_student(telegram_id, name, None, section_id)
            .await
            .unwrap();
        let section = self.services.sections.get_by_id(section_id).await.unwrap().unwrap();
        let admin = self
            .services
            .users
            .get_user_by_id(section.admin_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        self.services
            .registrations
            .approve(&admin, telegram_id, section_id)
            .await
            .unwrap();
        self.user(telegram_id).await
    }
}

/// A dispatcher over a fresh `Store`, with the recording gateway and the job receiver.
pub struct Harness {
    pub store: Store,
    pub bot: Arc<RecordingBot>,
    pub dispatcher: BotDispatcher,
    pub dialogs: Arc<DialogStateJson>,
    pub jobs: mpsc::Receiver<NotificationJob>,
}

impl Harness {
    pub async fn new() -> Self {
        let store = Store::new().await;
        let bot = Arc::new(RecordingBot::default());
        let dialogs = DialogStateJson::new(store.dir.path().join("dialogs.json"));
        dialogs.load().await.unwrap();
        let dialogs = Arc::new(dialogs);
        let (tx, jobs) = mpsc::channel(16);
        let dispatcher = BotDispatcher::new(
            bot.clone(),
            dialogs.clone(),
            BotServices::from_store(Arc::clone(&store.repo), options(chrono::Duration::hours(24))),
            tx,
        );
        Self {
            store,
            bot,
            dispatcher,
            dialogs,
            jobs,
        }
    }

    pub async fn is_idle(&self, chat_id: i64) -> bool {
        use assignbot::ports::DialogStatePort;
        self.dialogs.get_state(chat_id).await.unwrap().is_idle()
    }

    pub async fn say(&self, from: i64, text: &str) {
        use assignbot::ports::InputPort;
        self.dispatcher.handle(message(from, text)).await.unwrap();
    }

    pub async fn press(&self, from: i64, data: &str, message_text: &str) {
        use assignbot::ports::InputPort;
        self.dispatcher
            .handle(callback(from, data, message_text))
            .await
            .unwrap();
    }
}

/// `YYYY-MM-DD` a few days ahead in Baghdad time.
pub fn future_date(days: i64) -> String {
    (now_in(baghdad()) + chrono::Duration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}
