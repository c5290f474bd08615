use crate::error::{Result, StoreError};
use calltree_core::domain::{RawResponse, ResponseId, ResponseOrigin};
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

const RESPONSE_COLUMNS: &str = "id, uid, sender, contents, received_at, origin";

#[derive(Debug, Clone)]
pub struct ResponseNew {
    pub uid: Option<String>,
    pub sender: String,
    pub contents: String,
    pub received_at: i64,
    pub origin: ResponseOrigin,
}

impl From<RawResponse> for ResponseNew {
    fn from(response: RawResponse) -> Self {
        Self {
            uid: response.uid,
            sender: response.sender,
            contents: response.contents,
            received_at: response.received_at,
            origin: response.origin,
        }
    }
}

pub struct ResponsesRepo<'a> {
    conn: &'a Connection,
}

impl<'a> ResponsesRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Stores one inbound message. A `uid` already on file is rejected so a
    /// gateway redelivery cannot double count.
    pub fn add(&self, now_utc: i64, input: ResponseNew) -> Result<RawResponse> {
        let uid = input
            .uid
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if let Some(uid) = uid.as_deref() {
            if self.get_by_uid(uid)?.is_some() {
                return Err(StoreError::DuplicateUid(uid.to_string()));
            }
        }

        let response = RawResponse {
            id: ResponseId::new(),
            uid,
            sender: input.sender,
            contents: input.contents,
            received_at: input.received_at,
            origin: input.origin,
        };

        self.conn.execute(
            "INSERT INTO responses (id, uid, sender, contents, received_at, origin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                response.id.to_string(),
                response.uid,
                response.sender,
                response.contents,
                response.received_at,
                response.origin.as_str(),
                now_utc,
            ],
        )?;

        Ok(response)
    }

    pub fn get(&self, id: ResponseId) -> Result<Option<RawResponse>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE id = ?1;"
        ))?;
        let found = stmt
            .query_row([id.to_string()], |row| Ok(response_from_row(row)))
            .optional()?;
        found.transpose()
    }

    pub fn get_by_uid(&self, uid: &str) -> Result<Option<RawResponse>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE uid = ?1;"
        ))?;
        let found = stmt
            .query_row([uid], |row| Ok(response_from_row(row)))
            .optional()?;
        found.transpose()
    }

    /// One page of the window `[start, end]`, newest first.
    pub fn list_page(
        &self,
        start: i64,
        end: i64,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<RawResponse>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RESPONSE_COLUMNS}
             FROM responses
             WHERE received_at >= ?1 AND received_at <= ?2
             ORDER BY received_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4;"
        ))?;
        let mut rows = stmt.query(params![start, end, limit, offset as i64])?;
        let mut responses = Vec::new();
        while let Some(row) = rows.next()? {
            responses.push(response_from_row(row)?);
        }
        Ok(responses)
    }

    /// Every response in `[start, end]`, newest first, read `page_size` rows
    /// at a time.
    pub fn list_in_window(
        &self,
        start: i64,
        end: i64,
        page_size: u32,
    ) -> Result<Vec<RawResponse>> {
        let page_size = page_size.max(1);
        let mut all = Vec::new();
        let mut offset = 0u64;
        loop {
            let page = self.list_page(start, end, page_size, offset)?;
            let fetched = page.len();
            all.extend(page);
            if fetched < page_size as usize {
                break;
            }
            offset += fetched as u64;
        }
        Ok(all)
    }

    pub fn count_in_window(&self, start: i64, end: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM responses WHERE received_at >= ?1 AND received_at <= ?2;",
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn delete(&self, id: ResponseId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM responses WHERE id = ?1;", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn response_from_row(row: &rusqlite::Row<'_>) -> Result<RawResponse> {
    let id_str: String = row.get(0)?;
    let id = ResponseId::from_str(&id_str).map_err(|_| StoreError::InvalidId(id_str.clone()))?;
    let origin: String = row.get(5)?;
    let origin = ResponseOrigin::parse(&origin)
        .map_err(|_| StoreError::InvalidData(format!("response origin {origin}")))?;
    Ok(RawResponse {
        id,
        uid: row.get(1)?,
        sender: row.get(2)?,
        contents: row.get(3)?,
        received_at: row.get(4)?,
        origin,
    })
}
