//! User-facing strings. Arabic is the primary language; English is kept in
//! step so the TUI stays usable on terminals without Arabic shaping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Ar,
    En,
}

impl Lang {
    /// Tag passed to the catalog API.
    pub fn tag(self) -> &'static str {
        match self {
            Lang::Ar => "ar",
            Lang::En => "eng",
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ar" | "arabic" => Ok(Lang::Ar),
            "en" | "eng" | "english" => Ok(Lang::En),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lang::Ar => write!(f, "ar"),
            Lang::En => write!(f, "en"),
        }
    }
}

/// Every fixed message the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    AppTitle,
    NoPersons,
    Reciters,
    Loading,
    RecitersLoadFailed,
    ReadsLoadFailed,
    SurahNotFound,
    PlaybackFailed,
    Stopped,
    NoPrayerAudio,
    Retry,
    NotSignedIn,
    NotAdmin,
    SignedOut,
    SignedIn,
    SignedUp,
    WeakPassword,
    InvalidCredentials,
    EmailTaken,
    PersonAdded,
    PersonUpdated,
    PersonDeleted,
    PersonSaveFailed,
    PersonDeleteFailed,
    PersonNotFound,
    PageNotFound,
    Tasbih,
    AdminPanel,
    SignIn,
    SignUp,
    AddPerson,
    EditPerson,
    ConfirmDelete,
    NowPlaying,
    InvalidEmail,
    AuthUnavailable,
    Radios,
    RadiosLoadFailed,
    CairoRadio,
    PrayerAudioMissing,
}

impl Text {
    pub fn get(self, lang: Lang) -> &'static str {
        match lang {
            Lang::Ar => self.arabic(),
            Lang::En => self.english(),
        }
    }

    fn arabic(self) -> &'static str {
        match self {
            Text::AppTitle => "في ذكراهم",
            Text::NoPersons => "لا يوجد أشخاص بعد",
            Text::Reciters => "قائمة القراء",
            Text::Loading => "جاري التحميل...",
            Text::RecitersLoadFailed => "فشل في تحميل قائمة القراء",
            Text::ReadsLoadFailed => "فشل في تحميل تلاوات القارئ",
            Text::SurahNotFound => "لم يتم العثور على التلاوة لهذه السورة",
            Text::PlaybackFailed => "فشل في تشغيل السورة",
            Text::Stopped => "تم إيقاف التشغيل",
            Text::NoPrayerAudio => "لا يوجد دعاء مسجل",
            Text::Retry => "إعادة المحاولة",
            Text::NotSignedIn => "يرجى تسجيل الدخول للوصول إلى لوحة التحكم",
            Text::NotAdmin => "ليس لديك صلاحية الوصول إلى لوحة التحكم",
            Text::SignedOut => "تم تسجيل الخروج",
            Text::SignedIn => "تم تسجيل الدخول بنجاح",
            Text::SignedUp => "تم إنشاء الحساب بنجاح",
            Text::WeakPassword => "كلمة مرور ضعيفة، يرجى اتباع جميع متطلبات كلمة المرور",
            Text::InvalidCredentials => "البريد الإلكتروني أو كلمة المرور غير صحيحة",
            Text::EmailTaken => "هذا البريد الإلكتروني مسجل بالفعل",
            Text::PersonAdded => "تم إضافة الشخص بنجاح",
            Text::PersonUpdated => "تم تحديث الشخص بنجاح",
            Text::PersonDeleted => "تم حذف الشخص بنجاح",
            Text::PersonSaveFailed => "حدث خطأ أثناء حفظ الشخص",
            Text::PersonDeleteFailed => "حدث خطأ أثناء حذف الشخص",
            Text::PersonNotFound => "لم يتم العثور على الشخص",
            Text::PageNotFound => "الصفحة غير موجودة",
            Text::Tasbih => "المسبحة",
            Text::AdminPanel => "لوحة التحكم",
            Text::SignIn => "تسجيل الدخول",
            Text::SignUp => "إنشاء حساب",
            Text::AddPerson => "إضافة شخص جديد",
            Text::EditPerson => "تعديل بيانات الشخص",
            Text::ConfirmDelete => "هل أنت متأكد من حذف هذا الشخص؟",
            Text::NowPlaying => "يتم التشغيل",
            Text::InvalidEmail => "يرجى إدخال بريد إلكتروني صحيح",
            Text::AuthUnavailable => "تعذر الوصول إلى بيانات الحسابات، حاول مرة أخرى",
            Text::Radios => "اذاعات المقرئين",
            Text::RadiosLoadFailed => "فشل في تحميل محطات الراديو",
            Text::CairoRadio => "إذاعة القرآن الكريم - القاهرة",
            Text::PrayerAudioMissing => "ملف الدعاء غير موجود على هذا الجهاز",
        }
    }

    fn english(self) -> &'static str {
        match self {
            Text::AppTitle => "In Their Memory",
            Text::NoPersons => "No persons yet",
            Text::Reciters => "Reciters",
            Text::Loading => "Loading...",
            Text::RecitersLoadFailed => "Failed to load the reciter list",
            Text::ReadsLoadFailed => "Failed to load the reciter's recitations",
            Text::SurahNotFound => "No recitation found for this surah",
            Text::PlaybackFailed => "Failed to play the surah",
            Text::Stopped => "Playback stopped",
            Text::NoPrayerAudio => "No prayer recording",
            Text::Retry => "Retry",
            Text::NotSignedIn => "Please sign in to reach the admin panel",
            Text::NotAdmin => "You do not have access to the admin panel",
            Text::SignedOut => "Signed out",
            Text::SignedIn => "Signed in",
            Text::SignedUp => "Account created",
            Text::WeakPassword => "Weak password: follow every password requirement",
            Text::InvalidCredentials => "Wrong email or password",
            Text::EmailTaken => "This email is already registered",
            Text::PersonAdded => "Person added",
            Text::PersonUpdated => "Person updated",
            Text::PersonDeleted => "Person deleted",
            Text::PersonSaveFailed => "Could not save the person",
            Text::PersonDeleteFailed => "Could not delete the person",
            Text::PersonNotFound => "Person not found",
            Text::PageNotFound => "Page not found",
            Text::Tasbih => "Tasbih",
            Text::AdminPanel => "Admin panel",
            Text::SignIn => "Sign in",
            Text::SignUp => "Create account",
            Text::AddPerson => "Add person",
            Text::EditPerson => "Edit person",
            Text::ConfirmDelete => "Delete this person permanently?",
            Text::NowPlaying => "Now playing",
            Text::InvalidEmail => "Enter a valid email address",
            Text::AuthUnavailable => "Could not reach the account store, try again",
            Text::Radios => "Radio stations",
            Text::RadiosLoadFailed => "Failed to load the radio stations",
            Text::CairoRadio => "Holy Quran Radio - Cairo",
            Text::PrayerAudioMissing => "The prayer recording is not installed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_names() {
        assert_eq!("AR".parse::<Lang>().unwrap(), Lang::Ar);
        assert_eq!("english".parse::<Lang>().unwrap(), Lang::En);
        assert!("fr".parse::<Lang>().is_err());
    }

    #[test]
    fn arabic_is_the_default() {
        assert_eq!(Lang::default(), Lang::Ar);
        assert_eq!(Lang::default().tag(), "ar");
    }

    #[test]
    fn access_messages_differ() {
        for lang in [Lang::Ar, Lang::En] {
            assert_ne!(Text::NotSignedIn.get(lang), Text::NotAdmin.get(lang));
        }
    }
}
