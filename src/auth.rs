//! Accounts, sessions and the admin gate.
//!
//! Person writes are only available as methods of [`AdminSession`], which can
//! only be obtained from [`Authenticator::require_admin`]. A signed-out user
//! and a signed-in user without the admin role get distinct [`AccessError`]s.

use anyhow::{anyhow, Context};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{self, grant_role, has_role};
use crate::i18n::Text;
use crate::models::{Person, PersonDraft, Role, User};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Which password requirements a candidate satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordChecks {
    pub length: bool,
    pub uppercase: bool,
    pub lowercase: bool,
    pub number: bool,
    pub special: bool,
}

impl PasswordChecks {
    pub fn of(password: &str) -> Self {
        Self {
            length: password.chars().count() >= MIN_PASSWORD_LEN,
            uppercase: password.chars().any(|ch| ch.is_ascii_uppercase()),
            lowercase: password.chars().any(|ch| ch.is_ascii_lowercase()),
            number: password.chars().any(|ch| ch.is_ascii_digit()),
            special: password.chars().any(|ch| !ch.is_ascii_alphanumeric()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.length && self.uppercase && self.lowercase && self.number && self.special
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a valid email address is required")]
    InvalidEmail,
    #[error("password does not meet the requirements")]
    WeakPassword(PasswordChecks),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("wrong email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AuthError {
    /// Message shown to the user. Storage details stay in the log.
    pub fn text(&self) -> Text {
        match self {
            AuthError::InvalidEmail => Text::InvalidEmail,
            AuthError::WeakPassword(_) => Text::WeakPassword,
            AuthError::EmailTaken => Text::EmailTaken,
            AuthError::InvalidCredentials => Text::InvalidCredentials,
            AuthError::Storage(_) => Text::AuthUnavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("sign in to manage persons")]
    NotSignedIn,
    #[error("this account does not have the admin role")]
    NotAdmin,
}

impl AccessError {
    pub fn text(self) -> Text {
        match self {
            AccessError::NotSignedIn => Text::NotSignedIn,
            AccessError::NotAdmin => Text::NotAdmin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn {
        session: Session,
        is_admin: bool,
    },
}

/// Holds the current session and the emails that are promoted to admin on
/// sign-up or sign-in.
#[derive(Debug, Default)]
pub struct Authenticator {
    admin_emails: Vec<String>,
    state: AuthState,
}

impl Authenticator {
    pub fn new(admin_emails: Vec<String>) -> Self {
        Self {
            admin_emails,
            state: AuthState::SignedOut,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            AuthState::SignedIn { session, .. } => Some(session),
            AuthState::SignedOut => None,
        }
    }

    /// Create an account and sign it in.
    pub fn sign_up(
        &mut self,
        conn: &Connection,
        email: &str,
        password: &str,
    ) -> Result<&AuthState, AuthError> {
        let email = normalize_email(email)?;
        let checks = PasswordChecks::of(password);
        if !checks.is_valid() {
            return Err(AuthError::WeakPassword(checks));
        }
        if db::find_user_by_email(conn, &email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let hash = hash_password(password)?;
        let user = db::create_user(conn, &email, &hash)?;
        info!(user_id = user.id, "account created");
        self.establish(conn, user)
    }

    pub fn sign_in(
        &mut self,
        conn: &Connection,
        email: &str,
        password: &str,
    ) -> Result<&AuthState, AuthError> {
        let email = normalize_email(email)?;
        let stored = db::find_credentials(conn, &email)?;
        match stored {
            Some(stored) if verify_password(password, &stored.password_hash) => {
                self.establish(conn, stored.user)
            }
            _ => {
                warn!("rejected sign-in attempt");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub fn sign_out(&mut self) {
        if let AuthState::SignedIn { session, .. } = &self.state {
            info!(user_id = session.user.id, "signed out");
        }
        self.state = AuthState::SignedOut;
    }

    /// Re-read the role of the signed-in user, e.g. after it was granted from
    /// the command line.
    pub fn refresh_role(&mut self, conn: &Connection) -> anyhow::Result<()> {
        if let AuthState::SignedIn { session, is_admin } = &mut self.state {
            *is_admin = has_role(conn, session.user.id, Role::Admin)?;
        }
        Ok(())
    }

    pub fn require_admin(&self) -> Result<AdminSession<'_>, AccessError> {
        match &self.state {
            AuthState::SignedOut => Err(AccessError::NotSignedIn),
            AuthState::SignedIn {
                is_admin: false, ..
            } => Err(AccessError::NotAdmin),
            AuthState::SignedIn {
                session,
                is_admin: true,
            } => Ok(AdminSession { session }),
        }
    }

    fn establish(&mut self, conn: &Connection, user: User) -> Result<&AuthState, AuthError> {
        if self.is_configured_admin(&user.email) {
            grant_role(conn, user.id, Role::Admin).context("failed to grant configured admin")?;
        }
        let is_admin = has_role(conn, user.id, Role::Admin)?;
        info!(user_id = user.id, is_admin, "signed in");
        self.state = AuthState::SignedIn {
            session: Session { user },
            is_admin,
        };
        Ok(&self.state)
    }

    fn is_configured_admin(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

/// Proof that the current session holds the admin role. Every person write
/// goes through it.
pub struct AdminSession<'a> {
    session: &'a Session,
}

impl AdminSession<'_> {
    pub fn user(&self) -> &User {
        &self.session.user
    }

    pub fn add_person(&self, conn: &Connection, draft: &PersonDraft) -> anyhow::Result<Person> {
        let person = db::create_person(conn, draft)?;
        info!(user_id = self.session.user.id, person_id = %person.id, "person added");
        Ok(person)
    }

    pub fn update_person(
        &self,
        conn: &Connection,
        id: &str,
        draft: &PersonDraft,
    ) -> anyhow::Result<Person> {
        let person = db::update_person(conn, id, draft)?;
        info!(user_id = self.session.user.id, person_id = %id, "person updated");
        Ok(person)
    }

    pub fn delete_person(&self, conn: &Connection, id: &str) -> anyhow::Result<()> {
        db::delete_person(conn, id)?;
        info!(user_id = self.session.user.id, person_id = %id, "person deleted");
        Ok(())
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AuthError::InvalidEmail),
    }
}

/// Argon2id PHC string; the random salt is stored inside it.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| anyhow!("failed to encode password salt: {err}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Constant-time check of `password` against a stored PHC string.
fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is unreadable");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_policy_reports_each_rule() {
        let checks = PasswordChecks::of("abc");
        assert!(!checks.length);
        assert!(checks.lowercase);
        assert!(!checks.uppercase);
        assert!(!checks.number);
        assert!(!checks.special);
        assert!(PasswordChecks::of("Str0ng!pass").is_valid());
        assert!(!PasswordChecks::of("NoDigits!!").is_valid());
    }

    #[test]
    fn stored_hashes_are_salted_argon2() {
        let first = hash_password("Str0ng!pass").unwrap();
        let second = hash_password("Str0ng!pass").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);

        assert!(verify_password("Str0ng!pass", &first));
        assert!(verify_password("Str0ng!pass", &second));
        assert!(!verify_password("Str0ng!pasS", &first));
        assert!(!verify_password("Str0ng!pass", "not a phc string"));
    }

    #[test]
    fn each_failure_has_its_own_message() {
        let texts = [
            AuthError::InvalidEmail.text(),
            AuthError::WeakPassword(PasswordChecks::of("")).text(),
            AuthError::EmailTaken.text(),
            AuthError::InvalidCredentials.text(),
            AuthError::Storage(anyhow!("disk I/O error")).text(),
        ];
        for (idx, text) in texts.iter().enumerate() {
            assert!(texts[idx + 1..].iter().all(|other| other != text));
        }
        assert_eq!(AuthError::Storage(anyhow!("locked")).text(), Text::AuthUnavailable);
    }

    #[test]
    fn email_must_have_both_parts() {
        assert_eq!(normalize_email(" Admin@Example.org ").unwrap(), "admin@example.org");
        assert!(normalize_email("nobody").is_err());
        assert!(normalize_email("@example.org").is_err());
    }

    #[test]
    fn signed_out_and_non_admin_are_distinct() {
        let auth = Authenticator::default();
        assert_eq!(auth.require_admin().err(), Some(AccessError::NotSignedIn));

        let auth = Authenticator {
            admin_emails: Vec::new(),
            state: AuthState::SignedIn {
                session: Session {
                    user: User {
                        id: 1,
                        email: "a@b.c".into(),
                        created_at: String::new(),
                    },
                },
                is_admin: false,
            },
        };
        assert_eq!(auth.require_admin().err(), Some(AccessError::NotAdmin));
        assert_ne!(
            AccessError::NotSignedIn.text(),
            AccessError::NotAdmin.text()
        );
    }
}
