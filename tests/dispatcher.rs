mod common;

use assignbot::domain::texts::{self, buttons};
use assignbot::domain::{Keyboard, NotificationType};
use common::{future_date, Harness, ADMIN_TG, OWNER_TG};

fn inline_data(keyboard: &Option<Keyboard>) -> Vec<String> {
    match keyboard {
        Some(Keyboard::Inline(rows)) => rows.iter().flatten().map(|b| b.data.clone()).collect(),
        _ => Vec::new(),
    }
}

fn reply_labels(keyboard: &Option<Keyboard>) -> Vec<String> {
    match keyboard {
        Some(Keyboard::Reply { rows, .. }) => rows.iter().flatten().cloned().collect(),
        _ => Vec::new(),
    }
}

#[tokio::test]
async fn strangers_get_the_new_user_welcome() {
    let h = Harness::new().await;
    h.say(42, "/start").await;
    assert_eq!(h.bot.last_to(42).text, texts::WELCOME_NEW_USER);

    h.say(42, "مرحبا").await;
    assert_eq!(h.bot.last_to(42).text, texts::WELCOME_NEW_USER);

    h.say(42, "/unknown").await;
    assert_eq!(h.bot.last_to(42).text, texts::ERROR_INVALID_INPUT);
}

#[tokio::test]
async fn owner_start_shows_the_owner_menu() {
    let h = Harness::new().await;
    h.say(OWNER_TG, "/start@TestAssignmentsBot").await;
    let sent = h.bot.last_to(OWNER_TG);
    assert_eq!(sent.text, texts::WELCOME_OWNER);
    assert!(reply_labels(&sent.keyboard).contains(&buttons::CREATE_SECTION.to_string()));
}

#[tokio::test]
async fn join_link_registration_and_approval() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = h.store.section(ADMIN_TG, "A").await;
    let student = 900;

    h.say(student, &format!("/start {}", section.join_code)).await;
    let prompt = h.bot.last_to(student).text;
    assert!(prompt.contains(&section.section_name));
    assert!(prompt.ends_with("✍️ للتسجيل، أرسل اسمك الكامل:"));

    // Too short: asked again, still waiting for the name.
    h.say(student, "ab").await;
    assert!(h
        .bot
        .last_to(student)
        .text
        .ends_with("الرجاء إدخال اسمك الكامل مرة أخرى:"));

    h.say(student, "محمد علي حسن").await;
    let confirmation = h.bot.last_to(student);
    assert_eq!(confirmation.text, texts::SUCCESS_REGISTRATION_SENT);
    assert_eq!(confirmation.keyboard, Some(Keyboard::Remove));
    assert!(h.is_idle(student).await);

    let card = h.bot.last_to(ADMIN_TG);
    assert!(card.text.contains("محمد علي حسن"));
    let approve = format!("approve_{}_{}", student, section.section_id);
    assert_eq!(
        inline_data(&card.keyboard),
        vec![approve.clone(), format!("reject_{}_{}", student, section.section_id)]
    );

    h.press(ADMIN_TG, &approve, &card.text).await;
    let edit = h.bot.edits.lock().unwrap().last().cloned().unwrap();
    assert_eq!(edit.text, format!("{}\n\n✅ تمت الموافقة على الطالب", card.text));
    assert_eq!(edit.keyboard, None);
    assert!(h.bot.last_to(student).text.starts_with("🎉 مبروك!"));
    let answer = h.bot.last_answer();
    assert_eq!(answer.id, format!("cb-{}", approve));
    assert_eq!(answer.text.as_deref(), Some("✅ تمت الموافقة"));
    assert!(!answer.alert);

    // The same button again: already decided.
    h.press(ADMIN_TG, &approve, &card.text).await;
    assert!(h.bot.last_answer().alert);

    h.say(student, buttons::SECTION_INFO).await;
    assert!(h.bot.last_to(student).text.contains(&section.section_name));
}

#[tokio::test]
async fn staff_cannot_use_join_links() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = h.store.section(ADMIN_TG, "A").await;

    h.say(ADMIN_TG, &format!("/start {}", section.join_code)).await;
    assert_eq!(
        h.bot.last_to(ADMIN_TG).text,
        "❌ لا يمكن للمالك أو الأدمن التسجيل كطالب"
    );
}

#[tokio::test]
async fn publishing_walks_through_every_step_and_queues_a_broadcast() {
    let mut h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = h.store.section(ADMIN_TG, "A").await;

    h.say(ADMIN_TG, buttons::PUBLISH_ASSIGNMENT).await;
    let ask_subject = h.bot.last_to(ADMIN_TG);
    assert!(ask_subject.text.ends_with("📖 اختر المادة أو اكتب اسمها:"));
    assert!(reply_labels(&ask_subject.keyboard).contains(&"برمجة 1".to_string()));

    h.say(ADMIN_TG, "برمجة 1").await;
    assert_eq!(h.bot.last_to(ADMIN_TG).text, "📌 أرسل عنوان الواجب:");
    h.say(ADMIN_TG, "تقرير المختبر").await;
    assert!(reply_labels(&h.bot.last_to(ADMIN_TG).keyboard).contains(&buttons::SKIP.to_string()));
    h.say(ADMIN_TG, buttons::SKIP).await;

    h.say(ADMIN_TG, "31-12-2030").await;
    assert!(h
        .bot
        .last_to(ADMIN_TG)
        .text
        .starts_with("❌ صيغة التاريخ غير صحيحة"));
    h.say(ADMIN_TG, &future_date(3)).await;
    h.say(ADMIN_TG, "22:00").await;

    let done = h.bot.last_to(ADMIN_TG);
    assert!(done.text.starts_with(texts::SUCCESS_ASSIGNMENT_CREATED));
    assert!(done.text.contains("تقرير المختبر"));

    let job = h.jobs.try_recv().unwrap();
    assert_eq!(job.section_id, section.section_id);
    assert_eq!(job.kind, NotificationType::New);
    assert_eq!(job.notify_chat, Some(ADMIN_TG));

    h.say(ADMIN_TG, buttons::ASSIGNMENTS).await;
    let card = h.bot.last_to(ADMIN_TG);
    assert_eq!(
        inline_data(&card.keyboard),
        vec![
            format!("edit_{}", job.assignment_id),
            format!("delete_{}", job.assignment_id)
        ]
    );

    h.press(ADMIN_TG, &format!("delete_{}", job.assignment_id), &card.text)
        .await;
    assert_eq!(h.bot.last_answer().text.as_deref(), Some("✅ تم حذف الواجب"));
    let deleted = h.jobs.try_recv().unwrap();
    assert_eq!(deleted.kind, NotificationType::Delete);
    assert_eq!(deleted.notify_chat, Some(ADMIN_TG));
}

#[tokio::test]
async fn editing_a_deadline_queues_an_edit_broadcast() {
    let mut h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    h.store.section(ADMIN_TG, "A").await;
    let date = future_date(2);
    for step in [
        buttons::PUBLISH_ASSIGNMENT,
        "الرياضيات",
        "حل المسائل",
        "الصفحات 10-20",
        date.as_str(),
        "09:00",
    ] {
        h.say(ADMIN_TG, step).await;
    }
    let created = h.jobs.try_recv().unwrap();

    h.press(ADMIN_TG, &format!("edit_{}", created.assignment_id), "")
        .await;
    assert!(h.bot.last_to(ADMIN_TG).text.contains("ماذا تريد أن تعدل؟"));
    h.say(ADMIN_TG, buttons::FIELD_DEADLINE).await;
    h.say(ADMIN_TG, "غداً").await;
    assert_eq!(h.bot.last_to(ADMIN_TG).text, "❌ الصيغة: YYYY-MM-DD HH:MM");
    h.say(ADMIN_TG, &format!("{} 18:30", future_date(5))).await;

    assert!(h
        .bot
        .last_to(ADMIN_TG)
        .text
        .starts_with(texts::SUCCESS_ASSIGNMENT_EDITED));
    let edited = h.jobs.try_recv().unwrap();
    assert_eq!(edited.assignment_id, created.assignment_id);
    assert_eq!(edited.kind, NotificationType::Edit);
}

#[tokio::test]
async fn cancel_abandons_the_dialog() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    h.store.section(ADMIN_TG, "A").await;

    h.say(ADMIN_TG, buttons::PUBLISH_ASSIGNMENT).await;
    assert!(!h.is_idle(ADMIN_TG).await);
    h.say(ADMIN_TG, "/cancel").await;
    let cancelled = h.bot.last_to(ADMIN_TG);
    assert_eq!(cancelled.text, texts::CANCELLED);
    assert!(reply_labels(&cancelled.keyboard).contains(&buttons::PUBLISH_ASSIGNMENT.to_string()));
    assert!(h.is_idle(ADMIN_TG).await);

    h.say(ADMIN_TG, "برمجة 1").await;
    assert_eq!(h.bot.last_to(ADMIN_TG).text, "استخدم الأزرار أدناه أو أرسل /help");
}

#[tokio::test]
async fn empty_pending_list_and_owner_only_menus() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    h.store.section(ADMIN_TG, "A").await;

    h.say(ADMIN_TG, buttons::PENDING_REQUESTS).await;
    assert_eq!(h.bot.last_to(ADMIN_TG).text, "✅ لا توجد طلبات معلقة");

    h.say(ADMIN_TG, buttons::CREATE_SECTION).await;
    assert!(h.bot.last_to(ADMIN_TG).text.starts_with("❌ "));
}

#[tokio::test]
async fn owner_statistics_list_recent_activity() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    h.store.section(ADMIN_TG, "A").await;

    h.say(OWNER_TG, buttons::STATISTICS).await;
    let text = h.bot.last_to(OWNER_TG).text;
    assert!(text.starts_with("📊 الإحصائيات"));
    assert!(text.contains("📚 عدد الشعب: 1"));
    assert!(text.contains("🕘 آخر النشاطات:"));
    assert!(text.contains("المالك الرئيسي"));

    h.say(ADMIN_TG, buttons::STATISTICS).await;
    assert!(!h.bot.last_to(ADMIN_TG).text.contains("🕘"));
}

#[tokio::test]
async fn owner_creates_a_section_through_the_dialog() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;

    h.say(OWNER_TG, buttons::CREATE_SECTION).await;
    assert_eq!(h.bot.last_to(OWNER_TG).text, "📚 اختر المرحلة الدراسية:");
    h.say(OWNER_TG, "المرحلة الأولى").await;
    h.say(OWNER_TG, "مسائي").await;
    h.say(OWNER_TG, "B").await;
    h.say(OWNER_TG, "ليس رقماً").await;
    assert_eq!(h.bot.last_to(OWNER_TG).text, "❌ معرف تلغرام يجب أن يكون رقماً");
    h.say(OWNER_TG, &ADMIN_TG.to_string()).await;

    let created = h.bot.last_to(OWNER_TG).text;
    assert!(created.starts_with("✅ تم إنشاء الشعبة بنجاح!"));
    assert!(created.contains("المرحلة الأولى - مسائي - شعبة B"));
    assert!(created.contains("https://t.me/TestAssignmentsBot?start=SEC_"));
    assert!(!h.bot.texts_to(ADMIN_TG).is_empty());
}

#[tokio::test]
async fn owner_toggles_features_in_place() {
    let h = Harness::new().await;
    h.say(OWNER_TG, buttons::FEATURES).await;
    let panel = h.bot.last_to(OWNER_TG);
    assert!(inline_data(&panel.keyboard).contains(&"feature_student_blocking".to_string()));

    h.press(OWNER_TG, "feature_student_blocking", &panel.text).await;
    assert_eq!(h.bot.last_answer().text.as_deref(), Some("❌ تم تعطيل الميزة"));
    let edit = h.bot.edits.lock().unwrap().last().cloned().unwrap();
    assert!(edit.text.contains("❌ نظام الحظر"));

    h.press(OWNER_TG, "feature_student_blocking", &edit.text).await;
    assert_eq!(h.bot.last_answer().text.as_deref(), Some("✅ تم تفعيل الميزة"));
}

#[tokio::test]
async fn blocked_students_are_turned_away() {
    let h = Harness::new().await;
    h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = h.store.section(ADMIN_TG, "A").await;
    h.store
        .approved_student(901, "طالب محظور", section.section_id)
        .await;

    h.say(ADMIN_TG, buttons::MANAGE_STUDENTS).await;
    let roster = h.bot.last_to(ADMIN_TG);
    assert_eq!(inline_data(&roster.keyboard), vec!["block_901".to_string()]);

    h.press(ADMIN_TG, "block_901", &roster.text).await;
    assert_eq!(h.bot.last_answer().text.as_deref(), Some("🚫 تم الحظر"));
    assert_eq!(
        inline_data(&h.bot.last_to(ADMIN_TG).keyboard),
        vec!["unblock_901".to_string()]
    );

    h.say(901, buttons::MY_ASSIGNMENTS).await;
    assert_eq!(h.bot.last_to(901).text, texts::ERROR_BLOCKED);
    h.say(901, "/start").await;
    assert_eq!(h.bot.last_to(901).text, texts::ERROR_BLOCKED);

    h.say(ADMIN_TG, buttons::MANAGE_STUDENTS).await;
    let sent = h.bot.sent.lock().unwrap().clone();
    let rosters: Vec<_> = sent.iter().rev().take(2).collect();
    assert!(rosters[1].text.contains("لا يوجد طلاب مسجلين"));
    assert_eq!(inline_data(&rosters[1].keyboard), Vec::<String>::new());
    assert!(rosters[0].text.starts_with("🚫 الطلاب المحظورون في"));
    assert!(rosters[0].text.contains("طالب محظور"));
    assert_eq!(inline_data(&rosters[0].keyboard), vec!["unblock_901".to_string()]);

    h.press(ADMIN_TG, "unblock_901", &rosters[0].text).await;
    assert_eq!(h.bot.last_answer().text.as_deref(), Some("✅ تم إلغاء الحظر"));
    h.say(ADMIN_TG, buttons::MANAGE_STUDENTS).await;
    assert_eq!(
        inline_data(&h.bot.last_to(ADMIN_TG).keyboard),
        vec!["block_901".to_string()]
    );
    h.say(901, buttons::MY_ASSIGNMENTS).await;
    assert_eq!(h.bot.last_to(901).text, "✅ لا توجد واجبات حالياً");
}

#[tokio::test]
async fn bad_callbacks_are_answered_with_an_alert() {
    let h = Harness::new().await;
    h.press(OWNER_TG, "approve_x_y", "").await;
    let answer = h.bot.last_answer();
    assert!(answer.alert);
    assert!(answer.text.unwrap().starts_with("❌ "));

    h.press(77_777, "approve_1_1", "").await;
    assert!(h.bot.last_answer().alert);
    assert!(h.bot.edits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn students_see_their_section_assignments() {
    let h = Harness::new().await;
    let admin = h.store.admin(ADMIN_TG, "أدمن الشعبة").await;
    let section = h.store.section(ADMIN_TG, "A").await;
    h.store
        .approved_student(902, "طالبة مجتهدة", section.section_id)
        .await;
    h.store
        .services
        .assignments
        .create(
            &admin,
            assignbot::usecases::assignment_service::PublishRequest {
                section_id: section.section_id,
                subject_name: "الرياضيات".into(),
                title: "تمارين التكامل".into(),
                description: None,
                deadline: assignbot::domain::time::parse_datetime(
                    &future_date(6),
                    Some("12:00"),
                    common::baghdad(),
                )
                .unwrap(),
            },
        )
        .await
        .unwrap();

    h.say(902, buttons::MY_ASSIGNMENTS).await;
    assert!(h.bot.last_to(902).text.contains("تمارين التكامل"));

    h.say(ADMIN_TG, buttons::MY_ASSIGNMENTS).await;
    assert_eq!(h.bot.last_to(ADMIN_TG).text, "❌ هذا الخيار للطلاب فقط");
}
