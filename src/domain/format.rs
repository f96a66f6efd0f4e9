//! Message formatting: section names, assignment notifications, registration requests,
//! listings and statistics. Also splits texts that exceed Telegram's message limit.

use crate::domain::entities::{
    Activity, AdminStats, Assignment, DeliveryStats, OwnerStats, Section, StudentEntry,
};
use crate::domain::time::{format_datetime, remaining_time};
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

/// Telegram's hard limit on message text length (in characters).
pub const MAX_MESSAGE_LENGTH: usize = 4096;

const SEPARATOR_WIDTH: usize = 30;

fn separator() -> String {
    "─".repeat(SEPARATOR_WIDTH)
}

/// `المرحلة الأولى - صباحي - شعبة A`
pub fn section_name(level_name: &str, study_type: &str, division: &str) -> String {
    format!("{} - {} - شعبة {}", level_name, study_type, division)
}

/// Deep link that opens the bot with the section's join code.
pub fn bot_link(bot_username: &str, code: Option<&str>) -> String {
    let base = format!("https://t.me/{}", bot_username.trim_start_matches('@'));
    match code.filter(|c| !c.is_empty()) {
        Some(c) => format!("{}?start={}", base, c),
        None => base,
    }
}

fn username_part(username: Option<&str>) -> String {
    match username.filter(|u| !u.is_empty()) {
        Some(u) if u.starts_with('@') => u.to_string(),
        Some(u) => format!("@{}", u),
        None => "بدون username".to_string(),
    }
}

/// Notification body for a new assignment.
pub fn assignment_message<A: TimeZone>(
    subject_name: &str,
    title: &str,
    description: Option<&str>,
    deadline: &DateTime<A>,
    now: &DateTime<Tz>,
    tz: Tz,
) -> String {
    let local = deadline.with_timezone(&tz);
    format!(
        "📚 واجب جديد - {}\n\n📌 العنوان: {}\n\n📝 التفاصيل:\n{}\n\n⏰ الموعد النهائي: {}\n⏳ الوقت المتبقي: {}\n\n🔔 لا تنسَ التسليم!",
        subject_name,
        title,
        description.unwrap_or("-"),
        format_datetime(&local, true),
        remaining_time(&local, now),
    )
}

pub fn assignment_edited_message(assignment: &Assignment, now: &DateTime<Tz>, tz: Tz) -> String {
    format!(
        "⚠️ تم تعديل واجب\n\n{}",
        assignment_message(
            &assignment.subject_name,
            &assignment.title,
            assignment.description.as_deref(),
            &assignment.deadline,
            now,
            tz,
        )
    )
}

pub fn assignment_deleted_message(assignment: &Assignment) -> String {
    format!(
        "🗑️ تم إلغاء واجب {} في مادة {}",
        assignment.title, assignment.subject_name
    )
}

/// Request card sent to the section admin when a student asks to join.
pub fn registration_request_message(
    full_name: &str,
    username: Option<&str>,
    telegram_id: i64,
    section_name: &str,
    now: &DateTime<Tz>,
) -> String {
    format!(
        "🆕 طلب تسجيل جديد\n\n👤 الاسم: {}\n🆔 المعرف: {}\n🔢 ID: {}\n📚 الشعبة: {}\n\n⏰ وقت الطلب: {}",
        full_name,
        username_part(username),
        telegram_id,
        section_name,
        format_datetime(now, true)
    )
}

pub fn section_info_message(section: &Section) -> String {
    format!(
        "📚 معلومات الشعبة\n\n🏷️ الاسم: {}\n📖 المرحلة: {}\n📅 نوع الدراسة: {}\n🔤 الشعبة: {}",
        section.section_name,
        section.level_name,
        section.study_type.label(),
        section.division.label()
    )
}

pub fn student_list(students: &[StudentEntry]) -> String {
    if students.is_empty() {
        return "لا يوجد طلاب مسجلين".to_string();
    }
    let mut out = String::from("📋 قائمة الطلاب:\n\n");
    for (idx, s) in students.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({}) {}\n   ID: {}\n\n",
            idx + 1,
            s.full_name,
            username_part(s.username.as_deref()),
            s.status.emoji(),
            s.telegram_id
        ));
    }
    out.trim_end().to_string()
}

/// Section listing with admin name and join link.
pub fn section_list(sections: &[Section], bot_username: &str) -> String {
    let mut out = String::from("📋 قائمة الشعب:\n\n");
    for s in sections {
        out.push_str(&format!("🏷️ {}\n", s.section_name));
        if let Some(admin) = s.admin_name.as_deref().filter(|a| !a.is_empty()) {
            out.push_str(&format!("👨‍💼 الأدمن: {}\n", admin));
        }
        out.push_str(&format!(
            "🔗 رابط التسجيل:\n{}\n{}\n\n",
            bot_link(bot_username, Some(&s.join_code)),
            separator()
        ));
    }
    out
}

/// Student-facing list of assignments with deadline and remaining time.
pub fn assignment_list(assignments: &[Assignment], now: &DateTime<Tz>, tz: Tz) -> String {
    let mut out = String::from("📚 واجباتك:\n\n");
    for a in assignments {
        let local = a.deadline.with_timezone(&tz);
        out.push_str(&format!(
            "📖 {}\n📌 {}\n⏰ {}\n⏳ {}\n{}\n\n",
            a.subject_name,
            a.title,
            format_datetime(&local, true),
            remaining_time(&local, now),
            separator()
        ));
    }
    out
}

/// Single assignment line used by the admin listing (one message per assignment).
pub fn assignment_card(a: &Assignment, tz: Tz) -> String {
    let edited = if a.is_edited { " (معدّل)" } else { "" };
    format!(
        "📖 {}\n📌 {}{}\n⏰ {}",
        a.subject_name,
        a.title,
        edited,
        format_datetime(&a.deadline.with_timezone(&tz), true)
    )
}

pub fn owner_statistics(stats: &OwnerStats) -> String {
    format!(
        "📊 الإحصائيات\n\n📚 عدد الشعب: {}\n👥 عدد الطلاب: {}\n⏳ طلبات معلقة: {}\n📝 عدد الواجبات: {}\n👨‍💼 عدد الأدمنز: {}",
        stats.sections_count,
        stats.students_count,
        stats.pending_count,
        stats.assignments_count,
        stats.admins_count
    )
}

/// Audit log lines, newest first. Empty when there is nothing to show.
pub fn recent_activity_list(activities: &[Activity]) -> String {
    if activities.is_empty() {
        return String::new();
    }
    let mut out = String::from("🕘 آخر النشاطات:\n");
    for a in activities {
        out.push_str(&format!(
            "\n• {} {}: {}",
            a.created_at,
            a.full_name.as_deref().unwrap_or("النظام"),
            a.details.as_deref().unwrap_or(&a.action_type)
        ));
    }
    out
}

pub fn admin_statistics(stats: &AdminStats) -> String {
    format!(
        "📊 الإحصائيات\n\n📚 عدد الشعب: {}\n👥 عدد الطلاب: {}\n⏳ طلبات معلقة: {}\n📝 عدد الواجبات: {}",
        stats.sections_count, stats.students_count, stats.pending_count, stats.assignments_count
    )
}

pub fn delivery_summary(stats: &DeliveryStats) -> String {
    format!(
        "📬 نتيجة إرسال الإشعارات\n\n✅ تم الإرسال: {}\n❌ فشل: {}\n🚫 محظور: {}",
        stats.sent, stats.failed, stats.blocked
    )
}

/// Split `text` into chunks of at most `max` UTF-16 code units (Telegram's unit for the
/// message limit), preferring to break after a newline.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    if max == 0 || utf16_len(text) <= max {
        return vec![text.to_string()];
    }
    let mut parts = Vec::new();
    let mut rest: &str = text;
    while utf16_len(rest) > max {
        // Byte index just past the longest prefix that fits in `max` units.
        let mut units = 0;
        let mut limit = rest.len();
        for (i, c) in rest.char_indices() {
            if units + c.len_utf16() > max {
                limit = i;
                break;
            }
            units += c.len_utf16();
        }
        if limit == 0 {
            limit = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let window = &rest[..limit];
        let cut = match window.rfind('\n') {
            Some(nl) if nl > 0 => nl + 1,
            _ => limit,
        };
        parts.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        parts.push(rest.to_string());
    }
    parts
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
