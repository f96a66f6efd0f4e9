mod common;

use assignbot::adapters::persistence::SqliteRepo;
use assignbot::domain::time::parse_datetime;
use assignbot::domain::{
    AssignmentChanges, Decision, DeliveryStatus, DomainError, NewAssignment, NewRegistration,
    NewUser, NotificationType, RegistrationStatus, UserType,
};
use assignbot::ports::{
    ActivityRepo, AssignmentRepo, CatalogRepo, NotificationLog, RegistrationRepo, SectionRepo,
    SettingsRepo, StatsRepo, UserRepo,
};
use common::{baghdad, future_date, Store, ADMIN_TG};
use std::time::Duration;

#[tokio::test]
async fn initialize_creates_and_seeds_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SqliteRepo::connect(dir.path().join("nested/bot.db"), Duration::from_secs(5))
        .await
        .unwrap();
    assert!(!repo.is_initialized().await.unwrap());

    let first = repo.initialize().await.unwrap();
    assert_eq!(first.tables, 12);
    assert_eq!(first.levels, 4);
    assert_eq!(first.subjects, 5);
    assert_eq!(first.settings, 5);
    assert_eq!(first.features, 5);

    let second = repo.initialize().await.unwrap();
    assert_eq!(first, second);
    assert!(repo.is_initialized().await.unwrap());

    let levels = repo.list_levels().await.unwrap();
    assert_eq!(levels[0].level_name, "المرحلة الأولى");
    assert_eq!(
        levels.iter().map(|l| l.level_number).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    let first_stage: Vec<String> = repo
        .subjects_for_stage(levels[0].level_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.subject_name)
        .collect();
    assert!(first_stage.contains(&"برمجة 1".to_string()));
    assert!(first_stage.contains(&"الرياضيات".to_string()));
    assert!(!first_stage.contains(&"الخوارزميات".to_string()));

    let enabled: Vec<String> = repo
        .list_features()
        .await
        .unwrap()
        .into_iter()
        .filter(|f| f.is_enabled)
        .map(|f| f.key)
        .collect();
    assert_eq!(enabled, vec!["student_blocking".to_string()]);
}

#[tokio::test]
async fn users_are_unique_by_telegram_id() {
    let store = Store::new().await;
    let repo = &store.repo;
    let new_user = NewUser {
        telegram_id: 42,
        full_name: "طالب تجريبي".into(),
        user_type: UserType::Student,
        username: Some("@student42".into()),
    };
    let id = repo.create_user(&new_user).await.unwrap();
    assert!(matches!(
        repo.create_user(&new_user).await,
        Err(DomainError::Conflict(_))
    ));

    let by_id = repo.get_user_by_id(id).await.unwrap().unwrap();
    assert_eq!(by_id.telegram_id, 42);
    assert_eq!(by_id.username.as_deref(), Some("@student42"));
    assert!(!by_id.is_blocked);

    assert!(repo.update_user(42, Some("اسم جديد"), None).await.unwrap());
    assert!(!repo.update_user(43, Some("اسم"), None).await.unwrap());
    assert_eq!(repo.get_user(42).await.unwrap().unwrap().full_name, "اسم جديد");

    assert!(repo.set_blocked(42, true).await.unwrap());
    assert!(repo.get_user(42).await.unwrap().unwrap().is_blocked);
    assert!(!repo.set_blocked(4242, true).await.unwrap());
}

#[tokio::test]
async fn duplicate_section_combination_is_a_conflict() {
    let store = Store::new().await;
    store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let created = store.section(ADMIN_TG, "A").await;
    assert!(created.join_code.starts_with("SEC_"));
    assert_eq!(created.section_name, "المرحلة الأولى - صباحي - شعبة A");

    let err = store
        .services
        .sections
        .create_section(
            &store.owner().await,
            store.first_level_id().await,
            "صباحي",
            "A",
            ADMIN_TG,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let by_code = store
        .repo
        .get_section_by_code(&created.join_code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_code.section_id, created.section_id);
    assert_eq!(by_code.admin_name.as_deref(), Some("أدمن الشعبة"));
    assert_eq!(by_code.max_students, 50);
    assert_eq!(store.repo.list_admin_sections(ADMIN_TG).await.unwrap().len(), 1);
    assert!(store.repo.code_exists(&created.join_code).await.unwrap());
}

#[tokio::test]
async fn registration_lifecycle_and_repeat_requests() {
    let store = Store::new().await;
    let admin = store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = store.section(ADMIN_TG, "A").await;
    let repo = &store.repo;
    let reg = NewRegistration {
        telegram_id: 500,
        full_name: "سارة أحمد".into(),
        username: None,
        section_id: section.section_id,
    };

    let student_id = repo.register(&reg).await.unwrap();
    let pending = repo.list_pending(section.section_id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].status, RegistrationStatus::Pending);
    assert_eq!(pending[0].user_id, student_id);

    let again = repo.register(&reg).await.unwrap_err();
    assert_eq!(again, DomainError::Conflict("لديك طلب تسجيل معلق".into()));

    repo.decide(500, section.section_id, Decision::Approve, admin.user_id)
        .await
        .unwrap();
    assert_eq!(repo.approved_count(section.section_id).await.unwrap(), 1);
    assert!(repo.list_pending(section.section_id).await.unwrap().is_empty());
    assert_eq!(
        repo.student_section(500).await.unwrap().unwrap().section_id,
        section.section_id
    );

    // Already processed.
    assert!(matches!(
        repo.decide(500, section.section_id, Decision::Reject, admin.user_id)
            .await,
        Err(DomainError::NotFound(_))
    ));

    // Blocked students move from the approved roster to the blocked one.
    repo.set_blocked(500, true).await.unwrap();
    assert!(repo.list_approved(section.section_id).await.unwrap().is_empty());
    let blocked = repo.list_blocked(section.section_id).await.unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].telegram_id, 500);
    assert!(blocked[0].is_blocked);
}

#[tokio::test]
async fn listings_read_every_row() {
    let store = Store::new().await;
    store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = store.section(ADMIN_TG, "A").await;
    for (tg, name) in [(603, "زينب علي"), (601, "أحمد كريم"), (602, "بلال حسن")] {
        store.approved_student(tg, name, section.section_id).await;
    }
    let repo = &store.repo;

    let roster: Vec<(i64, String)> = repo
        .list_approved(section.section_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| (s.telegram_id, s.full_name))
        .collect();
    assert_eq!(
        roster,
        vec![
            (601, "أحمد كريم".to_string()),
            (602, "بلال حسن".to_string()),
            (603, "زينب علي".to_string()),
        ]
    );

    let names: Vec<String> = repo
        .list_levels()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.level_name)
        .collect();
    assert_eq!(names.len(), 4);
    assert!(names.iter().all(|n| n.starts_with("المرحلة")));

    let settings = repo.list_settings().await.unwrap();
    assert_eq!(settings.len(), 5);
    assert!(settings.iter().all(|s| !s.key.is_empty() && !s.value.is_empty()));
    assert_eq!(repo.list_features().await.unwrap().len(), 5);
    assert_eq!(repo.list_all_sections().await.unwrap().len(), 1);
    assert_eq!(
        repo.list_users_by_type(UserType::Student).await.unwrap().len(),
        3
    );
}

#[tokio::test]
async fn capacity_is_checked_inside_the_transaction() {
    let store = Store::with_options(common::options_with_capacity(1)).await;
    store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = store.section(ADMIN_TG, "A").await;
    store
        .approved_student(501, "الطالب الأول", section.section_id)
        .await;

    let err = store
        .repo
        .register(&NewRegistration {
            telegram_id: 502,
            full_name: "الطالب الثاني".into(),
            username: None,
            section_id: section.section_id,
        })
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Conflict("الشعبة ممتلئة".into()));
    // No user row is left behind.
    assert!(store.repo.get_user(502).await.unwrap().is_none());
}

#[tokio::test]
async fn assignment_edit_keeps_history_and_soft_delete_hides() {
    let store = Store::new().await;
    let admin = store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = store.section(ADMIN_TG, "A").await;
    let deadline = parse_datetime(&future_date(4), Some("23:59"), baghdad()).unwrap();
    let repo = &store.repo;

    let id = repo
        .create_assignment(&NewAssignment {
            section_id: section.section_id,
            subject_name: "مادة جديدة".into(),
            title: "تقرير".into(),
            description: None,
            deadline,
            created_by: admin.user_id,
        })
        .await
        .unwrap();
    // Unknown subjects are created on the fly.
    assert!(repo
        .list_subjects()
        .await
        .unwrap()
        .iter()
        .any(|s| s.subject_name == "مادة جديدة"));

    repo.edit_assignment(
        id,
        &AssignmentChanges {
            title: Some("تقرير نهائي".into()),
            ..Default::default()
        },
        admin.user_id,
    )
    .await
    .unwrap();
    let edited = repo.get_assignment(id).await.unwrap().unwrap();
    assert_eq!(edited.title, "تقرير نهائي");
    assert!(edited.is_edited);
    assert_eq!(edited.deadline, deadline);
    assert_eq!(edited.creator_name, "أدمن الشعبة");

    repo.deactivate_assignment(id).await.unwrap();
    assert!(repo
        .list_section_assignments(section.section_id, false)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        repo.list_section_assignments(section.section_id, true)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(!repo.get_assignment(id).await.unwrap().unwrap().is_active);
    assert!(matches!(
        repo.edit_assignment(999, &AssignmentChanges::default(), admin.user_id)
            .await,
        Err(DomainError::NotFound(_))
    ));
}

#[tokio::test]
async fn notification_log_and_statistics() {
    let store = Store::new().await;
    let admin = store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = store.section(ADMIN_TG, "A").await;
    let s1 = store.approved_student(601, "طالب أول", section.section_id).await;
    let s2 = store.approved_student(602, "طالب ثاني", section.section_id).await;
    store
        .services
        .registrations
        .register_student(603, "طالب معلق", None, section.section_id)
        .await
        .unwrap();
    let deadline = parse_datetime(&future_date(2), Some("12:00"), baghdad()).unwrap();
    let id = store
        .repo
        .create_assignment(&NewAssignment {
            section_id: section.section_id,
            subject_name: "الرياضيات".into(),
            title: "تمارين".into(),
            description: Some("الفصل الثاني".into()),
            deadline,
            created_by: admin.user_id,
        })
        .await
        .unwrap();

    let log = &store.repo;
    log.log_notification(id, s1.user_id, NotificationType::New, DeliveryStatus::Sent)
        .await
        .unwrap();
    log.log_notification(id, s2.user_id, NotificationType::New, DeliveryStatus::Blocked)
        .await
        .unwrap();
    let stats = log.notification_stats(id).await.unwrap();
    assert_eq!((stats.total, stats.sent, stats.failed, stats.blocked), (2, 1, 0, 1));
    assert_eq!(log.notification_stats(9999).await.unwrap().total, 0);

    let owner = store.repo.owner_stats().await.unwrap();
    assert_eq!(owner.sections_count, 1);
    assert_eq!(owner.students_count, 2);
    assert_eq!(owner.pending_count, 1);
    assert_eq!(owner.assignments_count, 1);
    assert_eq!(owner.admins_count, 1);

    let mine = store.repo.admin_stats(ADMIN_TG).await.unwrap().unwrap();
    assert_eq!(
        (mine.sections_count, mine.students_count, mine.pending_count, mine.assignments_count),
        (1, 2, 1, 1)
    );
    assert!(store.repo.admin_stats(31337).await.unwrap().is_none());

    let recent = store.repo.recent_activities(50).await.unwrap();
    assert!(recent.iter().any(|a| a.action_type == "registration_requested"));
    assert!(recent.iter().any(|a| a.action_type == "section_created"));
}

#[tokio::test]
async fn settings_and_feature_flags() {
    let store = Store::new().await;
    let repo = &store.repo;
    assert_eq!(
        repo.get_setting("timezone").await.unwrap().as_deref(),
        Some("Asia/Baghdad")
    );
    repo.set_setting("bot_name", "بوت جديد").await.unwrap();
    assert_eq!(repo.get_setting("bot_name").await.unwrap().as_deref(), Some("بوت جديد"));
    assert!(matches!(
        repo.set_setting("nope", "x").await,
        Err(DomainError::NotFound(_))
    ));

    assert!(repo.is_feature_enabled("student_blocking").await.unwrap());
    assert!(!repo.toggle_feature("student_blocking").await.unwrap());
    assert!(!repo.is_feature_enabled("student_blocking").await.unwrap());
    assert!(repo.toggle_feature("leaderboards").await.unwrap());
    assert!(!repo.is_feature_enabled("unknown_feature").await.unwrap());
    assert!(matches!(
        repo.toggle_feature("unknown_feature").await,
        Err(DomainError::NotFound(_))
    ));
}
