//! User-facing message catalog.
//!
//! English and Turkish texts for the store's own log lines and for
//! errors shown to end users.

use std::fmt;
use std::str::FromStr;

/// Language of user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Turkish.
    Tr,
}

impl Language {
    /// Resolves a language code, case-insensitively.
    ///
    /// Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "tr" => Language::Tr,
            _ => Language::En,
        }
    }

    /// The two-letter language code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Tr => "tr",
        }
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_code(s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A catalog entry with its arguments.
#[derive(Debug, Clone, Copy)]
pub enum Message<'a> {
    /// The store opened a backend.
    Connected {
        /// Backend kind.
        backend: &'a str,
    },
    /// The store was closed.
    Disconnected,
    /// A newer release is available.
    OldVersion {
        /// Running version.
        current: &'a str,
        /// Latest published version.
        latest: &'a str,
    },
    /// A key argument is missing or malformed.
    BlankName {
        /// The rejected key.
        key: &'a str,
    },
    /// A value argument is blank.
    BlankData {
        /// The key being written.
        key: &'a str,
    },
    /// A numeric argument is missing or malformed.
    BlankNumber {
        /// Details.
        detail: &'a str,
    },
    /// A backend call failed.
    BackendFailed {
        /// Details.
        detail: &'a str,
    },
    /// The store is closed.
    Closed,
}

impl Message<'_> {
    /// Renders the message in `language`.
    pub fn render(&self, language: Language) -> String {
        match (language, *self) {
            (Language::En, Message::Connected { backend }) => {
                format!("Connected to the {backend} backend")
            }
            (Language::Tr, Message::Connected { backend }) => {
                format!("{backend} veritabanına bağlanıldı")
            }
            (Language::En, Message::Disconnected) => "Disconnected from the database".to_string(),
            (Language::Tr, Message::Disconnected) => "Veritabanı bağlantısı kesildi".to_string(),
            (Language::En, Message::OldVersion { current, latest }) => format!(
                "You are using version {current}, but {latest} is available. Please update."
            ),
            (Language::Tr, Message::OldVersion { current, latest }) => format!(
                "{current} sürümünü kullanıyorsunuz, ancak {latest} sürümü mevcut. \
                 Lütfen güncelleyin."
            ),
            (Language::En, Message::BlankName { key }) => {
                format!("A valid key name is required (got {key:?})")
            }
            (Language::Tr, Message::BlankName { key }) => {
                format!("Geçerli bir anahtar adı girmelisiniz ({key:?} verildi)")
            }
            (Language::En, Message::BlankData { key }) => {
                format!("Data to store under {key:?} must not be blank")
            }
            (Language::Tr, Message::BlankData { key }) => {
                format!("{key:?} için kaydedilecek veri boş olamaz")
            }
            (Language::En, Message::BlankNumber { detail }) => {
                format!("A valid number is required: {detail}")
            }
            (Language::Tr, Message::BlankNumber { detail }) => {
                format!("Geçerli bir sayı girmelisiniz: {detail}")
            }
            (Language::En, Message::BackendFailed { detail }) => {
                format!("The database is unavailable: {detail}")
            }
            (Language::Tr, Message::BackendFailed { detail }) => {
                format!("Veritabanına erişilemiyor: {detail}")
            }
            (Language::En, Message::Closed) => "The database connection is closed".to_string(),
            (Language::Tr, Message::Closed) => "Veritabanı bağlantısı kapalı".to_string(),
        }
    }
}
