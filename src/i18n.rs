//! User-facing notices in the languages the app ships with.

use serde::{Deserialize, Serialize};

/// Display language. Uzbek is the app's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Uz,
    En,
}

impl Locale {
    /// Pick a locale from a Telegram `language_code` such as `"en"` or `"en-US"`.
    pub fn from_language_code(code: &str) -> Self {
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("en") {
            Self::En
        } else {
            Self::Uz
        }
    }
}

/// Every notice the flow can show inline or in a host alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserMessage {
    PhoneIncomplete,
    LocationRequired,
    LocationPermissionDenied,
    LocationUnavailable,
    LocationTimeout,
    LocationUnknown,
    LocationUnsupported,
    LocationOutOfBounds,
    RegistrationComplete,
    AlreadyRegistered,
    SubmitFailed,
}

impl UserMessage {
    pub fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Uz => self.uz(),
            Locale::En => self.en(),
        }
    }

    fn uz(self) -> &'static str {
        match self {
            Self::PhoneIncomplete => "Iltimos, to'liq telefon raqamini kiriting",
            Self::LocationRequired => "Iltimos, avval lokatsiyangizni aniqlang",
            Self::LocationPermissionDenied => {
                "Lokatsiya ruxsati rad etildi. Iltimos, sozlamalardan ruxsat bering."
            }
            Self::LocationUnavailable => "Lokatsiya ma'lumoti mavjud emas",
            Self::LocationTimeout => "Lokatsiyani olish vaqti tugadi",
            Self::LocationUnknown => "Noma'lum xatolik yuz berdi",
            Self::LocationUnsupported => "Qurilmangiz geolokatsiyani qo'llab-quvvatlamaydi",
            Self::LocationOutOfBounds => "Lokatsiya O'zbekiston hududidan tashqarida",
            Self::RegistrationComplete => "Ro'yxatdan o'tish muvaffaqiyatli yakunlandi!",
            Self::AlreadyRegistered => "Bu foydalanuvchi yoki telefon raqami allaqachon ro'yxatdan o'tgan",
            Self::SubmitFailed => "Ma'lumotlarni saqlashda xatolik yuz berdi. Qayta urinib ko'ring.",
        }
    }

    fn en(self) -> &'static str {
        match self {
            Self::PhoneIncomplete => "Please enter the full phone number",
            Self::LocationRequired => "Please detect your location first",
            Self::LocationPermissionDenied => {
                "Location permission was denied. Please allow it in your settings."
            }
            Self::LocationUnavailable => "Location information is unavailable",
            Self::LocationTimeout => "Timed out while getting your location",
            Self::LocationUnknown => "An unknown error occurred",
            Self::LocationUnsupported => "Your device does not support geolocation",
            Self::LocationOutOfBounds => "Your location is outside Uzbekistan",
            Self::RegistrationComplete => "Registration completed successfully!",
            Self::AlreadyRegistered => "This user or phone number is already registered",
            Self::SubmitFailed => "Could not save your details. Please try again.",
        }
    }
}
