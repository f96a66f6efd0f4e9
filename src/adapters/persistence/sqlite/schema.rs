//! Table definitions and seed rows. Every statement is idempotent.

pub(super) const TABLES: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    telegram_id INTEGER UNIQUE NOT NULL,
    username TEXT,
    full_name TEXT NOT NULL,
    user_type TEXT NOT NULL CHECK(user_type IN ('owner', 'admin', 'student')),
    is_active INTEGER DEFAULT 1,
    is_blocked INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    last_active TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#,
    r#"
CREATE TABLE IF NOT EXISTS academic_levels (
    level_id INTEGER PRIMARY KEY AUTOINCREMENT,
    level_name TEXT UNIQUE NOT NULL,
    level_number INTEGER UNIQUE NOT NULL,
    is_active INTEGER DEFAULT 1,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#,
    r#"
CREATE TABLE IF NOT EXISTS sections (
    section_id INTEGER PRIMARY KEY AUTOINCREMENT,
    section_name TEXT NOT NULL,
    level_id INTEGER NOT NULL,
    study_type TEXT NOT NULL CHECK(study_type IN ('صباحي', 'مسائي')),
    division TEXT NOT NULL CHECK(division IN ('A', 'B')),
    admin_id INTEGER,
    join_code TEXT UNIQUE NOT NULL,
    max_students INTEGER DEFAULT 50,
    is_active INTEGER DEFAULT 1,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (level_id) REFERENCES academic_levels(level_id),
    FOREIGN KEY (admin_id) REFERENCES users(user_id),
    UNIQUE(level_id, study_type, division)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS student_sections (
    student_section_id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL,
    section_id INTEGER NOT NULL,
    registration_status TEXT NOT NULL DEFAULT 'pending'
        CHECK(registration_status IN ('pending', 'approved', 'rejected')),
    registered_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    approved_at TIMESTAMP,
    approved_by INTEGER,
    is_active INTEGER DEFAULT 1,
    FOREIGN KEY (student_id) REFERENCES users(user_id),
    FOREIGN KEY (section_id) REFERENCES sections(section_id),
    FOREIGN KEY (approved_by) REFERENCES users(user_id),
    UNIQUE(student_id, section_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS subjects (
    subject_id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_name TEXT UNIQUE NOT NULL,
    description TEXT,
    is_active INTEGER DEFAULT 1,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#,
    r#"
CREATE TABLE IF NOT EXISTS subjects_stages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id INTEGER NOT NULL,
    stage_id INTEGER NOT NULL,
    is_active INTEGER DEFAULT 1,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (subject_id) REFERENCES subjects(subject_id) ON DELETE CASCADE,
    FOREIGN KEY (stage_id) REFERENCES academic_levels(level_id) ON DELETE CASCADE,
    UNIQUE(subject_id, stage_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    section_id INTEGER NOT NULL,
    subject_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    deadline TIMESTAMP NOT NULL,
    created_by INTEGER NOT NULL,
    is_active INTEGER DEFAULT 1,
    is_edited INTEGER DEFAULT 0,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (section_id) REFERENCES sections(section_id),
    FOREIGN KEY (subject_id) REFERENCES subjects(subject_id),
    FOREIGN KEY (created_by) REFERENCES users(user_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS assignment_edits (
    edit_id INTEGER PRIMARY KEY AUTOINCREMENT,
    assignment_id INTEGER NOT NULL,
    old_title TEXT,
    old_description TEXT,
    old_deadline TIMESTAMP,
    edited_by INTEGER NOT NULL,
    edited_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (assignment_id) REFERENCES assignments(assignment_id),
    FOREIGN KEY (edited_by) REFERENCES users(user_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS assignment_notifications (
    notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
    assignment_id INTEGER NOT NULL,
    student_id INTEGER NOT NULL,
    notification_type TEXT NOT NULL CHECK(notification_type IN ('new', 'edit', 'delete', 'reminder')),
    sent_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    delivery_status TEXT DEFAULT 'sent' CHECK(delivery_status IN ('sent', 'failed', 'blocked')),
    FOREIGN KEY (assignment_id) REFERENCES assignments(assignment_id),
    FOREIGN KEY (student_id) REFERENCES users(user_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS activity_logs (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    action_type TEXT NOT NULL,
    action_details TEXT,
    target_type TEXT,
    target_id INTEGER,
    ip_address TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(user_id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS bot_settings (
    setting_id INTEGER PRIMARY KEY AUTOINCREMENT,
    setting_key TEXT UNIQUE NOT NULL,
    setting_value TEXT NOT NULL,
    setting_type TEXT NOT NULL CHECK(setting_type IN ('string', 'integer', 'boolean', 'json')),
    description TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#,
    r#"
CREATE TABLE IF NOT EXISTS bot_features (
    feature_id INTEGER PRIMARY KEY AUTOINCREMENT,
    feature_key TEXT UNIQUE NOT NULL,
    feature_name TEXT NOT NULL,
    is_enabled INTEGER DEFAULT 0,
    description TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)"#,
];

pub(super) const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_telegram_id ON users(telegram_id)",
    "CREATE INDEX IF NOT EXISTS idx_user_type ON users(user_type)",
    "CREATE INDEX IF NOT EXISTS idx_join_code ON sections(join_code)",
    "CREATE INDEX IF NOT EXISTS idx_admin_id ON sections(admin_id)",
    "CREATE INDEX IF NOT EXISTS idx_student_section ON student_sections(student_id, section_id)",
    "CREATE INDEX IF NOT EXISTS idx_registration_status ON student_sections(registration_status)",
    "CREATE INDEX IF NOT EXISTS idx_subject_stage ON subjects_stages(subject_id, stage_id)",
    "CREATE INDEX IF NOT EXISTS idx_section_assignment ON assignments(section_id)",
    "CREATE INDEX IF NOT EXISTS idx_deadline ON assignments(deadline)",
    "CREATE INDEX IF NOT EXISTS idx_assignment_notification ON assignment_notifications(assignment_id)",
    "CREATE INDEX IF NOT EXISTS idx_student_notification ON assignment_notifications(student_id)",
    "CREATE INDEX IF NOT EXISTS idx_action_type ON activity_logs(action_type)",
    "CREATE INDEX IF NOT EXISTS idx_created_at ON activity_logs(created_at)",
];

/// (level_name, level_number)
pub(super) const LEVELS: &[(&str, i64)] = &[
    ("المرحلة الأولى", 1),
    ("المرحلة الثانية", 2),
    ("المرحلة الثالثة", 3),
    ("المرحلة الرابعة", 4),
];

/// (subject_name, description)
pub(super) const SUBJECTS: &[(&str, &str)] = &[
    ("برمجة 1", "أساسيات البرمجة"),
    ("قواعد البيانات", "تصميم وإدارة قواعد البيانات"),
    ("الرياضيات", "الرياضيات للحوسبة"),
    ("الخوارزميات", "تصميم وتحليل الخوارزميات"),
    ("هندسة البرمجيات", "مبادئ هندسة البرمجيات"),
];

/// (subject_name, level_number). Resolved to ids at seed time.
pub(super) const SUBJECT_STAGES: &[(&str, i64)] = &[
    ("برمجة 1", 1),
    ("قواعد البيانات", 2),
    ("الرياضيات", 1),
    ("الخوارزميات", 3),
    ("هندسة البرمجيات", 4),
];

/// (key, value, type, description)
pub(super) const SETTINGS: &[(&str, &str, &str, &str)] = &[
    ("bot_name", "بوت الواجبات الجامعي", "string", "اسم البوت"),
    ("default_language", "ar", "string", "اللغة الافتراضية"),
    ("timezone", "Asia/Baghdad", "string", "المنطقة الزمنية"),
    (
        "max_students_per_section",
        "50",
        "integer",
        "الحد الأقصى للطلاب في الشعبة",
    ),
    (
        "assignment_edit_duration",
        "24",
        "integer",
        "مدة صلاحية تعديل الواجب (بالساعات)",
    ),
];

/// (key, name, enabled, description)
pub(super) const FEATURES: &[(&str, &str, i64, &str)] = &[
    ("warnings_system", "نظام التحذيرات", 0, "نظام إصدار تحذيرات للطلاب"),
    ("leaderboards", "القوائم التصنيفية", 0, "عرض ترتيب الطلاب"),
    (
        "assignment_submission",
        "تسليم الواجبات",
        0,
        "إمكانية تسليم الواجبات عبر البوت",
    ),
    (
        "auto_reminders",
        "التذكيرات التلقائية",
        0,
        "إرسال تذكيرات تلقائية قبل الموعد النهائي",
    ),
    ("student_blocking", "نظام الحظر", 1, "إمكانية حظر الطلاب"),
];
