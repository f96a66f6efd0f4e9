//! Chat texts and keyboard button labels.

pub const WELCOME_OWNER: &str = "مرحباً بك في لوحة تحكم المالك! 👑

يمكنك إدارة جميع جوانب البوت من هنا.
استخدم الأزرار أدناه للوصول إلى الميزات.";

pub const WELCOME_ADMIN: &str = "مرحباً بك أيها الأدمن! 👨‍💼

يمكنك إدارة شعبتك ونشر الواجبات.
استخدم الأزرار أدناه للبدء.";

pub const WELCOME_STUDENT: &str = "مرحباً بك! 👋

يمكنك استلام الواجبات والإشعارات من هنا.";

pub const WELCOME_NEW_USER: &str = "مرحباً بك في بوت الواجبات الجامعي! 🎓

للتسجيل، استخدم رابط التسجيل الخاص بشعبتك.";

pub const ERROR_GENERAL: &str = "❌ حدث خطأ غير متوقع. الرجاء المحاولة لاحقاً.";
pub const ERROR_NO_PERMISSION: &str = "❌ ليس لديك صلاحية لتنفيذ هذا الأمر.";
pub const ERROR_BLOCKED: &str = "🚫 أنت محظور من استخدام البوت.";
pub const ERROR_INVALID_INPUT: &str = "❌ المدخلات غير صحيحة. الرجاء المحاولة مرة أخرى.";
pub const ERROR_NOT_REGISTERED: &str = "❌ أنت غير مسجل. استخدم رابط التسجيل الخاص بشعبتك.";

pub const SUCCESS_REGISTRATION_SENT: &str = "✅ تم إرسال طلب التسجيل!

سيتم مراجعة طلبك من قبل الأدمن.
سنرسل لك إشعاراً عند الموافقة.";

pub const SUCCESS_ASSIGNMENT_CREATED: &str = "✅ تم إنشاء الواجب بنجاح!

سيتم إرسال إشعارات لجميع الطلاب المسجلين.";

pub const SUCCESS_ASSIGNMENT_EDITED: &str = "✅ تم تعديل الواجب بنجاح!

سيتم إرسال إشعارات التعديل للطلاب.";

pub const SENDING_NOTIFICATIONS: &str = "📤 جارِ إرسال الإشعارات...

الرجاء الانتظار حتى يتم إرسال الإشعارات لجميع الطلاب.";

pub const CANCELLED: &str = "❌ تم إلغاء العملية";

pub const HELP_HEADER: &str = "🆘 مساعدة البوت

📚 الأوامر المتاحة:
/start - بدء البوت
/help - عرض هذه المساعدة
/cancel - إلغاء العملية الحالية
";

pub const HELP_OWNER: &str = "
👑 أوامر المالك:
• إنشاء شعبة جديدة
• عرض جميع الشعب
• إدارة الأدمنز
• عرض الإحصائيات الشاملة
• إدارة الإعدادات
";

pub const HELP_ADMIN: &str = "
👨‍💼 أوامر الأدمن:
• نشر واجب جديد
• تعديل/حذف الواجبات
• إدارة الطلاب
• الموافقة على طلبات التسجيل
• عرض إحصائيات الشعبة
";

pub const HELP_STUDENT: &str = "
👨‍🎓 ميزات الطالب:
• استلام إشعارات الواجبات
• عرض واجباتي
• عرض معلومات الشعبة
";

pub const HELP_FOOTER: &str = "
💡 للاستفسارات، تواصل مع الأدمن.";

/// Reply-keyboard button labels.
pub mod buttons {
    pub const CREATE_SECTION: &str = "➕ إنشاء شعبة";
    pub const LIST_SECTIONS: &str = "📋 عرض الشعب";
    pub const MANAGE_ADMINS: &str = "👥 إدارة الأدمنز";
    pub const STATISTICS: &str = "📊 الإحصائيات";
    pub const SETTINGS: &str = "⚙️ الإعدادات";
    pub const FEATURES: &str = "🔧 الميزات";

    pub const PUBLISH_ASSIGNMENT: &str = "➕ نشر واجب";
    pub const ASSIGNMENTS: &str = "📝 الواجبات";
    pub const MANAGE_STUDENTS: &str = "👥 إدارة الطلاب";
    pub const PENDING_REQUESTS: &str = "⏳ الطلبات المعلقة";

    pub const MY_ASSIGNMENTS: &str = "📚 واجباتي";
    pub const SECTION_INFO: &str = "ℹ️ معلومات الشعبة";

    pub const APPROVE: &str = "✅ موافقة";
    pub const REJECT: &str = "❌ رفض";
    pub const BACK: &str = "🔙 رجوع";
    pub const CANCEL: &str = "❌ إلغاء";

    pub const EDIT: &str = "✏️ تعديل";
    pub const DELETE: &str = "🗑️ حذف";
    pub const BLOCK: &str = "🚫 حظر";
    pub const UNBLOCK: &str = "✅ إلغاء الحظر";

    pub const FIELD_TITLE: &str = "العنوان";
    pub const FIELD_DESCRIPTION: &str = "الوصف";
    pub const FIELD_DEADLINE: &str = "الموعد النهائي";
    pub const SKIP: &str = "⏭️ تخطي";

    pub const OWNER_MAIN: &[&[&str]] = &[
        &[CREATE_SECTION, LIST_SECTIONS],
        &[MANAGE_ADMINS, STATISTICS],
        &[SETTINGS, FEATURES],
    ];

    pub const ADMIN_MAIN: &[&[&str]] = &[
        &[PUBLISH_ASSIGNMENT, ASSIGNMENTS],
        &[MANAGE_STUDENTS, STATISTICS],
        &[PENDING_REQUESTS],
    ];

    pub const STUDENT_MAIN: &[&[&str]] = &[&[MY_ASSIGNMENTS, SECTION_INFO]];
}
