use memorial_manager::auth::{AccessError, AuthError, AuthState, Authenticator};
use memorial_manager::db::{ensure_schema, fetch_person, fetch_persons, load_or_seed_persons, person_exists};
use memorial_manager::{grant_role, revoke_role, PersonDraft};
use rusqlite::Connection;
use tempfile::TempDir;

const PASSWORD: &str = "Str0ng!pass";

fn open_store() -> (Connection, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let conn = ensure_schema(&dir.path().join("memorial.sqlite")).expect("schema");
    (conn, dir)
}

fn draft(name: &str) -> PersonDraft {
    PersonDraft {
        name: name.to_string(),
        ..PersonDraft::default()
    }
}

fn signed_in_admin(conn: &Connection) -> Authenticator {
    let mut auth = Authenticator::new(vec!["admin@example.org".to_string()]);
    auth.sign_up(conn, "admin@example.org", PASSWORD)
        .expect("admin sign-up");
    auth
}

#[test]
fn defaults_are_seeded_exactly_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memorial.sqlite");

    let conn = ensure_schema(&path).unwrap();
    let seeded = load_or_seed_persons(&conn).unwrap();
    assert_eq!(seeded.len(), 8);
    assert_eq!(seeded[0].id, "khaled-ibrahim");

    let auth = signed_in_admin(&conn);
    let admin = auth.require_admin().unwrap();
    admin.delete_person(&conn, "khaled-ibrahim").unwrap();
    drop(conn);

    let conn = ensure_schema(&path).unwrap();
    let reloaded = load_or_seed_persons(&conn).unwrap();
    assert_eq!(reloaded.len(), 7);
    assert!(!person_exists(&conn, "khaled-ibrahim").unwrap());
}

#[test]
fn new_persons_come_first_and_slugs_get_suffixes() {
    let (conn, _dir) = open_store();
    let auth = signed_in_admin(&conn);
    let admin = auth.require_admin().unwrap();

    let first = admin.add_person(&conn, &draft("Umm Kulthum")).unwrap();
    let second = admin.add_person(&conn, &draft("  Umm   Kulthum ")).unwrap();
    let third = admin.add_person(&conn, &draft("Umm Kulthum")).unwrap();

    assert_eq!(first.id, "umm-kulthum");
    assert_eq!(second.id, "umm-kulthum-2");
    assert_eq!(third.id, "umm-kulthum-3");
    assert_eq!(first.fallback, "U");

    let persons = fetch_persons(&conn).unwrap();
    assert_eq!(persons[0].id, "umm-kulthum-3");
}

#[test]
fn updates_keep_the_slug_and_missing_rows_are_reported() {
    let (conn, _dir) = open_store();
    let auth = signed_in_admin(&conn);
    let admin = auth.require_admin().unwrap();

    let person = admin.add_person(&conn, &draft("Ahmad")).unwrap();
    let mut edit = PersonDraft::from(&person);
    edit.name = "Ahmad Saleh".into();
    edit.prayer_audio = Some("https://example.org/doaa.mp3".into());
    let updated = admin.update_person(&conn, &person.id, &edit).unwrap();
    assert_eq!(updated.id, "ahmad");
    assert_eq!(updated.name, "Ahmad Saleh");
    assert_eq!(
        fetch_person(&conn, "ahmad").unwrap().unwrap().prayer_audio.as_deref(),
        Some("https://example.org/doaa.mp3")
    );

    let err = admin.update_person(&conn, "nobody", &edit).unwrap_err();
    assert!(err.to_string().contains("not found"));
    let err = admin.delete_person(&conn, "nobody").unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert!(admin.add_person(&conn, &draft("   ")).is_err());
}

#[test]
fn writes_need_an_admin_session() {
    let (conn, _dir) = open_store();
    let mut auth = Authenticator::new(Vec::new());
    assert_eq!(auth.require_admin().err(), Some(AccessError::NotSignedIn));

    auth.sign_up(&conn, "user@example.org", PASSWORD).unwrap();
    assert!(matches!(
        auth.state(),
        AuthState::SignedIn { is_admin: false, .. }
    ));
    assert_eq!(auth.require_admin().err(), Some(AccessError::NotAdmin));

    let user_id = auth.session().unwrap().user.id;
    grant_role(&conn, user_id, memorial_manager::Role::Admin).unwrap();
    auth.refresh_role(&conn).unwrap();
    assert!(auth.require_admin().is_ok());

    revoke_role(&conn, user_id, memorial_manager::Role::Admin).unwrap();
    auth.refresh_role(&conn).unwrap();
    assert_eq!(auth.require_admin().err(), Some(AccessError::NotAdmin));

    auth.sign_out();
    assert_eq!(auth.require_admin().err(), Some(AccessError::NotSignedIn));
}

#[test]
fn account_errors_are_distinct() {
    let (conn, _dir) = open_store();
    let mut auth = Authenticator::new(Vec::new());

    assert!(matches!(
        auth.sign_up(&conn, "user@example.org", "short"),
        Err(AuthError::WeakPassword(_))
    ));
    assert!(matches!(
        auth.sign_up(&conn, "not-an-email", PASSWORD),
        Err(AuthError::InvalidEmail)
    ));

    auth.sign_up(&conn, "user@example.org", PASSWORD).unwrap();
    auth.sign_out();

    assert!(matches!(
        auth.sign_up(&conn, "USER@example.org", PASSWORD),
        Err(AuthError::EmailTaken)
    ));
    assert!(matches!(
        auth.sign_in(&conn, "user@example.org", "Wr0ng!pass"),
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.sign_in(&conn, "nobody@example.org", PASSWORD),
        Err(AuthError::InvalidCredentials)
    ));

    auth.sign_in(&conn, " User@Example.org ", PASSWORD).unwrap();
    assert_eq!(auth.session().unwrap().user.email, "user@example.org");
}

#[test]
fn configured_admins_are_promoted_on_sign_in() {
    let (conn, _dir) = open_store();
    let mut plain = Authenticator::new(Vec::new());
    plain.sign_up(&conn, "late@example.org", PASSWORD).unwrap();
    assert_eq!(plain.require_admin().err(), Some(AccessError::NotAdmin));

    let mut configured = Authenticator::new(vec!["Late@Example.org".to_string()]);
    configured.sign_in(&conn, "late@example.org", PASSWORD).unwrap();
    assert!(configured.require_admin().is_ok());
}
