//! Persistence module split across logical submodules.

mod connection;
mod persons;
mod users;

pub use connection::ensure_schema;
pub use persons::{fetch_person, fetch_persons, load_or_seed_persons, person_exists, slugify};
pub use users::{find_user_by_email, grant_role, has_role, revoke_role};

pub(crate) use persons::{create_person, delete_person, update_person};
pub(crate) use users::{create_user, find_credentials};
