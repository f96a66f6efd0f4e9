mod common;

use assignbot::domain::time::parse_datetime;
use assignbot::domain::{DeliveryStats, DomainError, Keyboard, NotificationType};
use assignbot::ports::{ActivityRepo, BotGateway, NotificationLog};
use assignbot::usecases::assignment_service::PublishRequest;
use assignbot::usecases::{DeliveryPolicy, NotificationJob, NotificationStores, NotificationWorker};
use common::{baghdad, future_date, RecordingBot, Store, ADMIN_TG};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

fn fast_policy(attempts: u32) -> DeliveryPolicy {
    DeliveryPolicy {
        batch_size: 2,
        send_delay: Duration::ZERO,
        batch_pause: Duration::ZERO,
        attempts,
    }
}

/// Fails the first sends to a chat with the scripted errors, then delegates.
struct FlakyBot {
    inner: RecordingBot,
    script: Mutex<HashMap<i64, Vec<DomainError>>>,
    calls: Mutex<HashMap<i64, u32>>,
}

impl FlakyBot {
    fn new(script: HashMap<i64, Vec<DomainError>>) -> Self {
        Self {
            inner: RecordingBot::default(),
            script: Mutex::new(script),
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn calls_to(&self, chat_id: i64) -> u32 {
        self.calls.lock().unwrap().get(&chat_id).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl BotGateway for FlakyBot {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<i64, DomainError> {
        *self.calls.lock().unwrap().entry(chat_id).or_default() += 1;
        let scripted = {
            let mut script = self.script.lock().unwrap();
            script
                .get_mut(&chat_id)
                .filter(|errors| !errors.is_empty())
                .map(|errors| errors.remove(0))
        };
        match scripted {
            Some(err) => Err(err),
            None => self.inner.send_message(chat_id, text, keyboard).await,
        }
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DomainError> {
        self.inner
            .edit_message_text(chat_id, message_id, text, keyboard)
            .await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), DomainError> {
        self.inner
            .answer_callback(callback_id, text, show_alert)
            .await
    }
}

/// A section with three approved students and one published assignment.
async fn classroom() -> (Store, i64, i64) {
    let store = Store::new().await;
    let admin = store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = store.section(ADMIN_TG, "A").await;
    for (tg, name) in [(701, "طالب أول"), (702, "طالب ثاني"), (703, "طالب ثالث")] {
        store.approved_student(tg, name, section.section_id).await;
    }
    let assignment = store
        .services
        .assignments
        .create(
            &admin,
            PublishRequest {
                section_id: section.section_id,
                subject_name: "برمجة 1".into(),
                title: "مشروع الفصل".into(),
                description: Some("برنامج آلة حاسبة".into()),
                deadline: parse_datetime(&future_date(7), Some("23:59"), baghdad()).unwrap(),
            },
        )
        .await
        .unwrap();
    (store, section.section_id, assignment.assignment_id)
}

fn job(assignment_id: i64, section_id: i64, kind: NotificationType) -> NotificationJob {
    NotificationJob {
        assignment_id,
        section_id,
        kind,
        notify_chat: Some(ADMIN_TG),
    }
}

#[tokio::test]
async fn broadcast_counts_and_logs_every_recipient() {
    let (store, section_id, assignment_id) = classroom().await;
    let bot = Arc::new(RecordingBot::default());
    bot.block_chat(702);
    let (_tx, rx) = mpsc::channel(4);
    let worker = NotificationWorker::new(
        bot.clone(),
        NotificationStores::from_store(Arc::clone(&store.repo)),
        rx,
        fast_policy(3),
        baghdad(),
    );

    let stats = worker
        .process(&job(assignment_id, section_id, NotificationType::New))
        .await
        .unwrap();
    assert_eq!(
        stats,
        DeliveryStats {
            sent: 2,
            failed: 0,
            blocked: 1
        }
    );
    assert!(bot.texts_to(701)[0].contains("مشروع الفصل"));
    assert!(bot.texts_to(702).is_empty());

    let logged = store.repo.notification_stats(assignment_id).await.unwrap();
    assert_eq!((logged.total, logged.sent, logged.blocked), (3, 2, 1));
    assert!(store
        .repo
        .recent_activities(10)
        .await
        .unwrap()
        .iter()
        .any(|a| a.action_type == "notification_sent"));
}

#[tokio::test]
async fn transient_failures_are_retried_until_attempts_run_out() {
    let (store, section_id, assignment_id) = classroom().await;
    let bot = Arc::new(FlakyBot::new(HashMap::from([
        (701, vec![DomainError::FloodWait { seconds: 0 }]),
        (
            702,
            vec![DomainError::Gateway("timeout".into()); 5],
        ),
        (703, vec![DomainError::Blocked]),
    ])));
    let (_tx, rx) = mpsc::channel(4);
    let worker = NotificationWorker::new(
        bot.clone(),
        NotificationStores::from_store(Arc::clone(&store.repo)),
        rx,
        fast_policy(3),
        baghdad(),
    );

    let stats = worker
        .process(&job(assignment_id, section_id, NotificationType::Edit))
        .await
        .unwrap();
    assert_eq!(
        stats,
        DeliveryStats {
            sent: 1,
            failed: 1,
            blocked: 1
        }
    );
    assert_eq!(bot.calls_to(701), 2);
    assert_eq!(bot.calls_to(702), 3);
    assert_eq!(bot.calls_to(703), 1);
}

#[tokio::test]
async fn flood_wait_on_the_last_attempt_gives_up_without_sleeping() {
    let (store, section_id, assignment_id) = classroom().await;
    let bot = Arc::new(FlakyBot::new(HashMap::from([(
        701,
        vec![DomainError::FloodWait { seconds: 3_600 }],
    )])));
    let (_tx, rx) = mpsc::channel(4);
    let worker = NotificationWorker::new(
        bot.clone(),
        NotificationStores::from_store(Arc::clone(&store.repo)),
        rx,
        fast_policy(1),
        baghdad(),
    );

    let stats = tokio::time::timeout(
        Duration::from_secs(10),
        worker.process(&job(assignment_id, section_id, NotificationType::New)),
    )
    .await
    .expect("worker slept through a FloodWait it could not retry")
    .unwrap();
    assert_eq!(
        stats,
        DeliveryStats {
            sent: 2,
            failed: 1,
            blocked: 0
        }
    );
    assert_eq!(bot.calls_to(701), 1);
}

#[tokio::test]
async fn missing_assignment_sends_nothing() {
    let (store, section_id, _) = classroom().await;
    let bot = Arc::new(RecordingBot::default());
    let (_tx, rx) = mpsc::channel(4);
    let worker = NotificationWorker::new(
        bot.clone(),
        NotificationStores::from_store(Arc::clone(&store.repo)),
        rx,
        fast_policy(3),
        baghdad(),
    );

    let stats = worker
        .process(&job(9_999, section_id, NotificationType::New))
        .await
        .unwrap();
    assert_eq!(stats, DeliveryStats::default());
    assert!(bot.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn run_drains_the_queue_and_reports_to_the_publisher() {
    let (store, section_id, assignment_id) = classroom().await;
    let bot = Arc::new(RecordingBot::default());
    let (tx, rx) = mpsc::channel(4);
    let worker = NotificationWorker::new(
        bot.clone(),
        NotificationStores::from_store(Arc::clone(&store.repo)),
        rx,
        fast_policy(1),
        baghdad(),
    );
    let handle = tokio::spawn(worker.run());

    tx.send(job(assignment_id, section_id, NotificationType::Delete))
        .await
        .unwrap();
    drop(tx);
    tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(bot.texts_to(703)[0].starts_with("🗑️ تم إلغاء واجب مشروع الفصل"));
    let summary = bot.last_to(ADMIN_TG).text;
    assert!(summary.starts_with("📬 نتيجة إرسال الإشعارات"));
    assert!(summary.contains("✅ تم الإرسال: 3"));
}
