//! Domain models shared by the store, the catalog client and the TUI. They
//! stay plain data holders; persistence and presentation live elsewhere.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Image shown for persons added without one.
pub const DEFAULT_IMAGE_URL: &str =
    "https://newoaks.s3.us-west-1.amazonaws.com/AutoDev/77020/3db4255c-464e-451f-a702-f7d8eb7fb1a5.png";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A commemorated person as stored in SQLite.
pub struct Person {
    /// Slug derived from the name when the row was created. It never changes
    /// afterwards, even when the name is edited, so detail routes stay valid.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Free text; the UI shows whatever the admin typed.
    pub birth_date: String,
    pub death_date: String,
    pub image_url: String,
    /// Short initial drawn on the card cover.
    pub fallback: String,
    pub prayer_audio: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Person {
    /// `birth - death` for the header line, or `None` when both are blank.
    pub fn lifespan(&self) -> Option<String> {
        let birth = self.birth_date.trim();
        let death = self.death_date.trim();
        match (birth.is_empty(), death.is_empty()) {
            (true, true) => None,
            (false, true) => Some(birth.to_string()),
            (true, false) => Some(death.to_string()),
            (false, false) => Some(format!("{birth} - {death}")),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Editable fields of a [`Person`]. Add and update both take a draft; the
/// store fills in identity and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonDraft {
    pub name: String,
    pub description: String,
    pub birth_date: String,
    pub death_date: String,
    pub image_url: String,
    pub fallback: String,
    pub prayer_audio: Option<String>,
}

impl PersonDraft {
    /// Trim every field and fill the defaults the admin form leaves out:
    /// a placeholder image and the first letter of the name as fallback.
    pub fn normalized(&self) -> PersonDraft {
        let name = self.name.trim().to_string();
        let image_url = match self.image_url.trim() {
            "" => DEFAULT_IMAGE_URL.to_string(),
            url => url.to_string(),
        };
        let fallback = match self.fallback.trim() {
            "" => name.chars().next().map(String::from).unwrap_or_default(),
            initial => initial.to_string(),
        };
        let prayer_audio = self
            .prayer_audio
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        PersonDraft {
            name,
            description: self.description.trim().to_string(),
            birth_date: self.birth_date.trim().to_string(),
            death_date: self.death_date.trim().to_string(),
            image_url,
            fallback,
            prayer_audio,
        }
    }
}

impl From<&Person> for PersonDraft {
    fn from(person: &Person) -> Self {
        Self {
            name: person.name.clone(),
            description: person.description.clone(),
            birth_date: person.birth_date.clone(),
            death_date: person.death_date.clone(),
            image_url: person.image_url.clone(),
            fallback: person.fallback.clone(),
            prayer_audio: person.prayer_audio.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A recorded recitation series. `suras` is a range specification, see
/// [`crate::ranges`].
pub struct Read {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rewaya: String,
    /// Base URL; per-surah files live directly under it.
    #[serde(alias = "server")]
    pub url: String,
    #[serde(default, alias = "surah_list")]
    pub suras: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// A reciter from the catalog. `reads` is often empty in the list endpoint
/// and filled by the per-reciter endpoint.
pub struct Reciter {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, alias = "moshaf")]
    pub reads: Vec<Read>,
}

impl fmt::Display for Reciter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A live station from the catalog's `/radios` endpoint.
pub struct Radio {
    pub id: u32,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_date: Option<String>,
}

/// Roles stored in `user_roles`. Only one exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An account able to sign in to the admin view.
pub struct User {
    pub id: i64,
    pub email: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_draft_fills_defaults() {
        let draft = PersonDraft {
            name: "  خالد ابراهيم ".into(),
            prayer_audio: Some("   ".into()),
            ..PersonDraft::default()
        }
        .normalized();

        assert_eq!(draft.name, "خالد ابراهيم");
        assert_eq!(draft.fallback, "خ");
        assert_eq!(draft.image_url, DEFAULT_IMAGE_URL);
        assert_eq!(draft.prayer_audio, None);
    }

    #[test]
    fn catalog_aliases_deserialize() {
        let json = r#"{
            "id": 7,
            "name": "Reciter",
            "moshaf": [
                {"id": 3, "name": "Hafs", "server": "https://x/", "surah_list": "1-2"}
            ]
        }"#;
        let reciter: Reciter = serde_json::from_str(json).unwrap();
        assert_eq!(reciter.reads.len(), 1);
        assert_eq!(reciter.reads[0].url, "https://x/");
        assert_eq!(reciter.reads[0].suras, "1-2");
    }

    #[test]
    fn lifespan_joins_present_dates() {
        let mut person = Person {
            id: "p".into(),
            name: "P".into(),
            description: String::new(),
            birth_date: "1950".into(),
            death_date: String::new(),
            image_url: String::new(),
            fallback: "P".into(),
            prayer_audio: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(person.lifespan().as_deref(), Some("1950"));
        person.death_date = "2020".into();
        assert_eq!(person.lifespan().as_deref(), Some("1950 - 2020"));
    }
}
