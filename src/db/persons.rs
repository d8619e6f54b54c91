use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::connection::{schema_version, set_schema_version, NOW_SQL};
use crate::models::{Person, PersonDraft};

const PERSON_COLUMNS: &str = "id, name, description, birth_date, death_date, image_url, fallback,
     prayer_audio, created_at, updated_at";

/// Version written once the default persons have been seeded.
const SEEDED_VERSION: i64 = 1;

/// Persons inserted the first time the database is initialized, listed in
/// display order.
const DEFAULT_PERSONS: &[(&str, &str, &str, Option<&str>)] = &[
    ("khaled-ibrahim", "خالد ابراهيم شقا", "خ", Some("/audio/doaa.mp3")),
    ("abdelhadi-ashiri", "الحاج/ عبد الهادي عشيرى محمد", "ع", None),
    (
        "mohammed-mamdouh",
        "الحاج/ محمد ممدوح مصطفي أمين صالح عرفة",
        "م",
        None,
    ),
    ("ferdaws", "الحاجة/ فردوس الشيخ الطيب", "ف", None),
    ("hasan-abdelmoneim", "الحسن عبد المنعم رجب", "ح", None),
    ("ismail-haniyeh", "الشهيد بإذن الله/ إسماعيل هنية", "إ", None),
    ("saed-abdelazeem", "الشيخ/ سعيد عبد العظيم", "س", None),
    (
        "mahmoud-khalil-alhussary",
        "الشيخ/ محمود خليل الحصري",
        "م",
        None,
    ),
];

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        birth_date: row.get(3)?,
        death_date: row.get(4)?,
        image_url: row.get(5)?,
        fallback: row.get(6)?,
        prayer_audio: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Seed the default persons on first run, then load everyone. Seeding is
/// recorded in `PRAGMA user_version`, so deleting every person later does
/// not bring the defaults back.
pub fn load_or_seed_persons(conn: &Connection) -> Result<Vec<Person>> {
    if schema_version(conn)? < SEEDED_VERSION {
        let tx = conn
            .unchecked_transaction()
            .context("failed to start seed transaction")?;
        // Newest first is the display order, so insert the list backwards.
        for (id, name, fallback, prayer_audio) in DEFAULT_PERSONS.iter().rev() {
            tx.execute(
                "INSERT OR IGNORE INTO persons (id, name, image_url, fallback, prayer_audio)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id,
                    name,
                    crate::models::DEFAULT_IMAGE_URL,
                    fallback,
                    prayer_audio
                ],
            )
            .context("failed to seed person")?;
        }
        set_schema_version(&tx, SEEDED_VERSION)?;
        tx.commit().context("failed to commit seed transaction")?;
        info!(count = DEFAULT_PERSONS.len(), "seeded default persons");
    }

    fetch_persons(conn)
}

/// Every person, newest first.
pub fn fetch_persons(conn: &Connection) -> Result<Vec<Person>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons ORDER BY created_at DESC, rowid DESC"
        ))
        .context("failed to prepare persons query")?;

    let persons = stmt
        .query_map([], person_from_row)
        .context("failed to load persons")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect persons")?;

    Ok(persons)
}

/// Look up one person by slug. Missing persons are `None`, not an error.
pub fn fetch_person(conn: &Connection, id: &str) -> Result<Option<Person>> {
    conn.query_row(
        &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE id = ?1"),
        [id],
        person_from_row,
    )
    .optional()
    .context("failed to load person")
}

pub fn person_exists(conn: &Connection, id: &str) -> Result<bool> {
    conn.query_row("SELECT 1 FROM persons WHERE id = ?1", [id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .context("failed to check person")
}

/// Insert a person under a fresh slug and return the stored row. Callers
/// outside the crate go through [`crate::auth::AdminSession`].
pub(crate) fn create_person(conn: &Connection, draft: &PersonDraft) -> Result<Person> {
    let draft = draft.normalized();
    if draft.name.is_empty() {
        return Err(anyhow!("Person name is required."));
    }

    let id = unique_slug(conn, &draft.name)?;
    conn.execute(
        "INSERT INTO persons
             (id, name, description, birth_date, death_date, image_url, fallback, prayer_audio)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            draft.name,
            draft.description,
            draft.birth_date,
            draft.death_date,
            draft.image_url,
            draft.fallback,
            draft.prayer_audio
        ],
    )
    .context("failed to insert person")?;

    fetch_person(conn, &id)?.ok_or_else(|| anyhow!("Person not found"))
}

/// Overwrite the editable fields of an existing person. The slug is kept.
pub(crate) fn update_person(conn: &Connection, id: &str, draft: &PersonDraft) -> Result<Person> {
    let draft = draft.normalized();
    if draft.name.is_empty() {
        return Err(anyhow!("Person name is required."));
    }

    let updated = conn
        .execute(
            &format!(
                "UPDATE persons
                 SET name = ?1, description = ?2, birth_date = ?3, death_date = ?4,
                     image_url = ?5, fallback = ?6, prayer_audio = ?7, updated_at = {NOW_SQL}
                 WHERE id = ?8"
            ),
            params![
                draft.name,
                draft.description,
                draft.birth_date,
                draft.death_date,
                draft.image_url,
                draft.fallback,
                draft.prayer_audio,
                id
            ],
        )
        .context("failed to update person")?;

    if updated == 0 {
        return Err(anyhow!("Person not found"));
    }
    fetch_person(conn, id)?.ok_or_else(|| anyhow!("Person not found"))
}

pub(crate) fn delete_person(conn: &Connection, id: &str) -> Result<()> {
    let deleted = conn
        .execute("DELETE FROM persons WHERE id = ?1", [id])
        .context("failed to delete person")?;

    if deleted == 0 {
        Err(anyhow!("Person not found"))
    } else {
        Ok(())
    }
}

/// URL-safe identity for a name: lowercase, whitespace runs become `-`, and
/// anything other than ASCII word characters, Arabic letters or `-` is
/// dropped. Names with nothing left fall back to `person`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || is_arabic(ch) {
            slug.push(ch);
        }
    }

    if slug.trim_matches('-').is_empty() {
        "person".to_string()
    } else {
        slug
    }
}

fn is_arabic(ch: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&ch)
}

/// `slugify(name)`, suffixed `-2`, `-3`, ... until no person uses it.
fn unique_slug(conn: &Connection, name: &str) -> Result<String> {
    let base = slugify(name);
    if !person_exists(conn, &base)? {
        return Ok(base);
    }
    let mut suffix = 2u32;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !person_exists(conn, &candidate)? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_keeps_arabic_and_ascii_words() {
        assert_eq!(slugify("Khaled  Ibrahim"), "khaled-ibrahim");
        assert_eq!(slugify("خالد ابراهيم"), "خالد-ابراهيم");
        assert_eq!(slugify("الحاج/ محمد"), "الحاج-محمد");
        assert_eq!(slugify("O'Brien, Jr."), "obrien-jr");
    }

    #[test]
    fn slug_of_symbols_has_a_fallback() {
        assert_eq!(slugify("!!!"), "person");
        assert_eq!(slugify("   "), "person");
    }
}
