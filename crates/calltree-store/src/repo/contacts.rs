use crate::error::{Result, StoreError};
use calltree_core::domain::{normalize_phone, Contact, ContactId};
use rusqlite::{params, Connection};
use std::str::FromStr;

const CONTACT_COLUMNS: &str = "id, name, number, department, location, position, level";

#[derive(Debug, Clone, Default)]
pub struct ContactNew {
    pub name: String,
    pub number: String,
    pub department: String,
    pub location: String,
    pub position: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub number: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub position: Option<String>,
    pub level: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub contact: Contact,
    pub created: bool,
}

pub struct ContactsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ContactsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, input: ContactNew) -> Result<Contact> {
        create_inner(self.conn, now_utc, input)
    }

    pub fn get(&self, id: ContactId) -> Result<Option<Contact>> {
        get_inner(self.conn, id)
    }

    pub fn update(&self, now_utc: i64, id: ContactId, update: ContactUpdate) -> Result<Contact> {
        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction()?;
            let contact = update_inner(&tx, now_utc, id, update)?;
            tx.commit()?;
            Ok(contact)
        } else {
            update_inner(self.conn, now_utc, id, update)
        }
    }

    pub fn delete(&self, id: ContactId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Whole roster, ordered by name.
    pub fn list_all(&self) -> Result<Vec<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTACT_COLUMNS}
             FROM contacts
             ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(contact_from_row(row)?);
        }
        Ok(contacts)
    }

    /// Contacts whose stored number normalizes to the same key as `raw`.
    pub fn find_by_number(&self, raw: &str) -> Result<Vec<Contact>> {
        find_by_number_inner(self.conn, raw)
    }

    /// Roster import: update the contact already holding this number, or
    /// create a new one. Numbers that normalize to nothing always create.
    pub fn upsert_by_number(&self, now_utc: i64, input: ContactNew) -> Result<UpsertOutcome> {
        if self.conn.is_autocommit() {
            let tx = self.conn.unchecked_transaction()?;
            let outcome = upsert_inner(&tx, now_utc, input)?;
            tx.commit()?;
            Ok(outcome)
        } else {
            upsert_inner(self.conn, now_utc, input)
        }
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts;", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn create_inner(conn: &Connection, now_utc: i64, input: ContactNew) -> Result<Contact> {
    let contact = Contact {
        id: ContactId::new(),
        name: input.name.trim().to_string(),
        number: input.number.trim().to_string(),
        department: input.department.trim().to_string(),
        location: input.location.trim().to_string(),
        position: input.position.trim().to_string(),
        level: clean_level(input.level),
    };
    contact.validate()?;

    conn.execute(
        "INSERT INTO contacts (id, name, number, normalized_number, department, location, position, level, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9);",
        params![
            contact.id.to_string(),
            contact.name,
            contact.number,
            normalize_phone(&contact.number),
            contact.department,
            contact.location,
            contact.position,
            contact.level,
            now_utc,
        ],
    )?;

    Ok(contact)
}

fn get_inner(conn: &Connection, id: ContactId) -> Result<Option<Contact>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(contact_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn find_by_number_inner(conn: &Connection, raw: &str) -> Result<Vec<Contact>> {
    let key = normalize_phone(raw);
    if key.is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS}
         FROM contacts
         WHERE normalized_number = ?1
         ORDER BY updated_at DESC, id ASC;"
    ))?;
    let mut rows = stmt.query([key])?;
    let mut contacts = Vec::new();
    while let Some(row) = rows.next()? {
        contacts.push(contact_from_row(row)?);
    }
    Ok(contacts)
}

fn update_inner(
    conn: &Connection,
    now_utc: i64,
    id: ContactId,
    update: ContactUpdate,
) -> Result<Contact> {
    let mut contact = get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if let Some(value) = update.name {
        contact.name = value.trim().to_string();
    }
    if let Some(value) = update.number {
        contact.number = value.trim().to_string();
    }
    if let Some(value) = update.department {
        contact.department = value.trim().to_string();
    }
    if let Some(value) = update.location {
        contact.location = value.trim().to_string();
    }
    if let Some(value) = update.position {
        contact.position = value.trim().to_string();
    }
    if let Some(value) = update.level {
        contact.level = clean_level(value);
    }
    contact.validate()?;

    conn.execute(
        "UPDATE contacts
         SET name = ?2, number = ?3, normalized_number = ?4, department = ?5,
             location = ?6, position = ?7, level = ?8, updated_at = ?9
         WHERE id = ?1;",
        params![
            contact.id.to_string(),
            contact.name,
            contact.number,
            normalize_phone(&contact.number),
            contact.department,
            contact.location,
            contact.position,
            contact.level,
            now_utc,
        ],
    )?;

    Ok(contact)
}

fn upsert_inner(conn: &Connection, now_utc: i64, input: ContactNew) -> Result<UpsertOutcome> {
    let existing = find_by_number_inner(conn, &input.number)?;
    match existing.first() {
        Some(current) => {
            let contact = update_inner(
                conn,
                now_utc,
                current.id,
                ContactUpdate {
                    name: Some(input.name),
                    number: Some(input.number),
                    department: Some(input.department),
                    location: Some(input.location),
                    position: Some(input.position),
                    level: Some(input.level),
                },
            )?;
            Ok(UpsertOutcome {
                contact,
                created: false,
            })
        }
        None => Ok(UpsertOutcome {
            contact: create_inner(conn, now_utc, input)?,
            created: true,
        }),
    }
}

fn clean_level(level: Option<String>) -> Option<String> {
    level
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn contact_from_row(row: &rusqlite::Row<'_>) -> Result<Contact> {
    let id_str: String = row.get(0)?;
    let id = ContactId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    Ok(Contact {
        id,
        name: row.get(1)?,
        number: row.get(2)?,
        department: row.get(3)?,
        location: row.get(4)?,
        position: row.get(5)?,
        level: row.get(6)?,
    })
}
