//! Library surface of the memorial manager: the recitation resolver at its
//! core, the stores and clients around it, and the TUI that ties them
//! together. The binary and the integration tests both build on these
//! re-exports.
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod i18n;
pub mod logging;
pub mod media;
pub mod models;
pub mod playback;
pub mod radios;
pub mod ranges;
pub mod reciters;
pub mod routes;
pub mod tasbih;
pub mod ui;

/// Persistence entry points used at startup and by the maintenance commands.
pub use db::{ensure_schema, fetch_persons, find_user_by_email, grant_role, load_or_seed_persons, revoke_role};

pub use models::{Person, PersonDraft, Radio, Read, Reciter, Role, User};

pub use ranges::parse_ranges;
pub use reciters::{all_surahs_for, resolve_read_for_surah, surah_audio_url};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
