use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::auth::PasswordChecks;
use crate::i18n::Lang;
use crate::models::{Person, PersonDraft};

/// Form state for adding or editing a person.
#[derive(Default, Clone)]
pub(crate) struct PersonForm {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) birth_date: String,
    pub(crate) death_date: String,
    pub(crate) image_url: String,
    pub(crate) fallback: String,
    pub(crate) prayer_audio: String,
    pub(crate) active: PersonField,
    pub(crate) error: Option<String>,
}

/// Fields of the person form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum PersonField {
    #[default]
    Name,
    Description,
    BirthDate,
    DeathDate,
    ImageUrl,
    Fallback,
    PrayerAudio,
}

impl PersonField {
    pub(crate) const ALL: [PersonField; 7] = [
        PersonField::Name,
        PersonField::Description,
        PersonField::BirthDate,
        PersonField::DeathDate,
        PersonField::ImageUrl,
        PersonField::Fallback,
        PersonField::PrayerAudio,
    ];

    pub(crate) fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }

    pub(crate) fn label(self, lang: Lang) -> &'static str {
        match (self, lang) {
            (PersonField::Name, Lang::Ar) => "الاسم",
            (PersonField::Name, Lang::En) => "Name",
            (PersonField::Description, Lang::Ar) => "الوصف",
            (PersonField::Description, Lang::En) => "Description",
            (PersonField::BirthDate, Lang::Ar) => "تاريخ الميلاد",
            (PersonField::BirthDate, Lang::En) => "Born",
            (PersonField::DeathDate, Lang::Ar) => "تاريخ الوفاة",
            (PersonField::DeathDate, Lang::En) => "Died",
            (PersonField::ImageUrl, Lang::Ar) => "رابط الصورة",
            (PersonField::ImageUrl, Lang::En) => "Image URL",
            (PersonField::Fallback, Lang::Ar) => "الحرف الأول",
            (PersonField::Fallback, Lang::En) => "Initial",
            (PersonField::PrayerAudio, Lang::Ar) => "رابط الدعاء",
            (PersonField::PrayerAudio, Lang::En) => "Prayer audio",
        }
    }

    fn required(self) -> bool {
        self == PersonField::Name
    }
}

impl PersonForm {
    /// Populate the form from an existing person when editing.
    pub(crate) fn from_person(person: &Person) -> Self {
        Self {
            name: person.name.clone(),
            description: person.description.clone(),
            birth_date: person.birth_date.clone(),
            death_date: person.death_date.clone(),
            image_url: person.image_url.clone(),
            fallback: person.fallback.clone(),
            prayer_audio: person.prayer_audio.clone().unwrap_or_default(),
            active: PersonField::Name,
            error: None,
        }
    }

    /// Move focus to the next field, wrapping around.
    pub(crate) fn next_field(&mut self) {
        let next = (self.active.index() + 1) % PersonField::ALL.len();
        self.active = PersonField::ALL[next];
    }

    /// Move focus to the previous field, wrapping around.
    pub(crate) fn previous_field(&mut self) {
        let len = PersonField::ALL.len();
        let previous = (self.active.index() + len - 1) % len;
        self.active = PersonField::ALL[previous];
    }

    fn value(&self, field: PersonField) -> &String {
        match field {
            PersonField::Name => &self.name,
            PersonField::Description => &self.description,
            PersonField::BirthDate => &self.birth_date,
            PersonField::DeathDate => &self.death_date,
            PersonField::ImageUrl => &self.image_url,
            PersonField::Fallback => &self.fallback,
            PersonField::PrayerAudio => &self.prayer_audio,
        }
    }

    fn value_mut(&mut self, field: PersonField) -> &mut String {
        match field {
            PersonField::Name => &mut self.name,
            PersonField::Description => &mut self.description,
            PersonField::BirthDate => &mut self.birth_date,
            PersonField::DeathDate => &mut self.death_date,
            PersonField::ImageUrl => &mut self.image_url,
            PersonField::Fallback => &mut self.fallback,
            PersonField::PrayerAudio => &mut self.prayer_audio,
        }
    }

    /// Append a character to the active field. Control characters are
    /// rejected.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let field = self.active;
        self.value_mut(field).push(ch);
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        let field = self.active;
        self.value_mut(field).pop();
    }

    /// Validate the inputs and produce a draft ready for the store.
    pub(crate) fn parse_inputs(&self) -> Result<PersonDraft> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("Name is required."));
        }
        let prayer_audio = Some(self.prayer_audio.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        Ok(PersonDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            birth_date: self.birth_date.clone(),
            death_date: self.death_date.clone(),
            image_url: self.image_url.clone(),
            fallback: self.fallback.clone(),
            prayer_audio,
        }
        .normalized())
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: PersonField, lang: Lang) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = match (value.is_empty(), field.required()) {
            (true, true) => "<required>".to_string(),
            (true, false) => "<optional>".to_string(),
            (false, _) => value.clone(),
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label(lang))),
            Span::styled(display, style),
        ])
    }

    /// Character length of the requested field, for cursor placement.
    pub(crate) fn value_len(&self, field: PersonField) -> usize {
        self.value(field).chars().count()
    }
}

/// Whether the account form creates an account or signs into one.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum AuthKind {
    #[default]
    SignIn,
    SignUp,
}

/// Email and password entry for the admin area.
#[derive(Default, Clone)]
pub(crate) struct AuthForm {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) kind: AuthKind,
    pub(crate) active: AuthField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum AuthField {
    #[default]
    Email,
    Password,
}

impl AuthForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            AuthField::Email => AuthField::Password,
            AuthField::Password => AuthField::Email,
        };
    }

    /// Switch between signing in and creating an account.
    pub(crate) fn toggle_kind(&mut self) {
        self.kind = match self.kind {
            AuthKind::SignIn => AuthKind::SignUp,
            AuthKind::SignUp => AuthKind::SignIn,
        };
        self.error = None;
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            AuthField::Email if !ch.is_whitespace() => self.email.push(ch),
            AuthField::Email => return false,
            AuthField::Password => self.password.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            AuthField::Email => {
                self.email.pop();
            }
            AuthField::Password => {
                self.password.pop();
            }
        }
    }

    /// Render a field line. The password is masked.
    pub(crate) fn build_line(&self, field: AuthField, lang: Lang) -> Line<'static> {
        let (label, value) = match (field, lang) {
            (AuthField::Email, Lang::Ar) => ("البريد الإلكتروني", self.email.clone()),
            (AuthField::Email, Lang::En) => ("Email", self.email.clone()),
            (AuthField::Password, Lang::Ar) => ("كلمة المرور", mask(&self.password)),
            (AuthField::Password, Lang::En) => ("Password", mask(&self.password)),
        };
        let style = if self.active == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw(format!("{label}: ")),
            Span::styled(value, style),
        ])
    }

    /// One line per password rule while creating an account, green once met.
    pub(crate) fn requirement_lines(&self, lang: Lang) -> Vec<Line<'static>> {
        if self.kind != AuthKind::SignUp {
            return Vec::new();
        }
        let checks = PasswordChecks::of(&self.password);
        let rules: [(bool, &str, &str); 5] = [
            (checks.length, "8 أحرف على الأقل", "At least 8 characters"),
            (checks.uppercase, "حرف كبير واحد على الأقل", "One uppercase letter"),
            (checks.lowercase, "حرف صغير واحد على الأقل", "One lowercase letter"),
            (checks.number, "رقم واحد على الأقل", "One number"),
            (checks.special, "رمز خاص واحد على الأقل", "One special character"),
        ];
        rules
            .into_iter()
            .map(|(met, ar, en)| {
                let text = match lang {
                    Lang::Ar => ar,
                    Lang::En => en,
                };
                let (marker, color) = if met {
                    ("✓", Color::Green)
                } else {
                    ("✗", Color::DarkGray)
                };
                Line::from(Span::styled(
                    format!("{marker} {text}"),
                    Style::default().fg(color),
                ))
            })
            .collect()
    }

    pub(crate) fn value_len(&self, field: AuthField) -> usize {
        match field {
            AuthField::Email => self.email.chars().count(),
            AuthField::Password => self.password.chars().count(),
        }
    }
}

fn mask(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

/// State for confirming permanent person deletion.
#[derive(Clone)]
pub(crate) struct ConfirmPersonDelete {
    pub(crate) id: String,
    pub(crate) name: String,
}

impl ConfirmPersonDelete {
    pub(crate) fn from(person: &Person) -> Self {
        Self {
            id: person.id.clone(),
            name: person.name.clone(),
        }
    }
}
