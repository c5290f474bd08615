use crate::error::{Result, StoreError};
use calltree_core::domain::{
    validate_incident_name, validate_incident_window, Incident, IncidentId, IncidentKind,
};
use calltree_core::CoreError;
use rusqlite::{params, Connection, OptionalExtension};

const INCIDENT_COLUMNS: &str = "id, name, kind, start_time, end_time";

/// A past incident recorded after the fact.
#[derive(Debug, Clone)]
pub struct IncidentNew {
    pub name: String,
    pub kind: IncidentKind,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Clone, Default)]
pub struct IncidentUpdate {
    pub name: Option<String>,
    pub kind: Option<IncidentKind>,
    pub start_time: Option<i64>,
    pub end_time: Option<Option<i64>>,
}

pub struct IncidentsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> IncidentsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Opens a new incident at `now_utc`. Only one may be open at a time.
    pub fn start(&self, now_utc: i64, name: &str, kind: IncidentKind) -> Result<Incident> {
        let name = validate_incident_name(name)?;
        let tx = self.conn.unchecked_transaction()?;
        if let Some(active) = active_inner(&tx)? {
            return Err(CoreError::IncidentAlreadyActive(active.name).into());
        }
        let incident = insert_inner(&tx, &name, kind, now_utc, None)?;
        tx.commit()?;
        Ok(incident)
    }

    /// Closes the open incident at `now_utc`.
    pub fn end_active(&self, now_utc: i64) -> Result<Incident> {
        let tx = self.conn.unchecked_transaction()?;
        let mut incident = active_inner(&tx)?.ok_or(CoreError::NoActiveIncident)?;
        validate_incident_window(incident.start_time, Some(now_utc))?;
        tx.execute(
            "UPDATE incidents SET end_time = ?2 WHERE id = ?1;",
            params![incident.id.0, now_utc],
        )?;
        tx.commit()?;
        incident.end_time = Some(now_utc);
        Ok(incident)
    }

    pub fn active(&self) -> Result<Option<Incident>> {
        active_inner(self.conn)
    }

    pub fn register(&self, input: IncidentNew) -> Result<Incident> {
        let name = validate_incident_name(&input.name)?;
        validate_incident_window(input.start_time, Some(input.end_time))?;
        insert_inner(
            self.conn,
            &name,
            input.kind,
            input.start_time,
            Some(input.end_time),
        )
    }

    pub fn update(&self, id: IncidentId, update: IncidentUpdate) -> Result<Incident> {
        let tx = self.conn.unchecked_transaction()?;
        let mut incident =
            get_inner(&tx, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(name) = update.name {
            incident.name = validate_incident_name(&name)?;
        }
        if let Some(kind) = update.kind {
            incident.kind = kind;
        }
        if let Some(start_time) = update.start_time {
            incident.start_time = start_time;
        }
        if let Some(end_time) = update.end_time {
            if end_time.is_none() {
                if let Some(active) = active_inner(&tx)?.filter(|active| active.id != id) {
                    return Err(CoreError::IncidentAlreadyActive(active.name).into());
                }
            }
            incident.end_time = end_time;
        }
        validate_incident_window(incident.start_time, incident.end_time)?;

        tx.execute(
            "UPDATE incidents
             SET name = ?2, kind = ?3, start_time = ?4, end_time = ?5
             WHERE id = ?1;",
            params![
                incident.id.0,
                incident.name,
                incident.kind.as_str(),
                incident.start_time,
                incident.end_time,
            ],
        )?;
        tx.commit()?;
        Ok(incident)
    }

    pub fn delete(&self, id: IncidentId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM incidents WHERE id = ?1;", [id.0])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: IncidentId) -> Result<Option<Incident>> {
        get_inner(self.conn, id)
    }

    /// Ended incidents, most recent start first.
    pub fn history(&self) -> Result<Vec<Incident>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {INCIDENT_COLUMNS}
             FROM incidents
             WHERE end_time IS NOT NULL
             ORDER BY start_time DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut incidents = Vec::new();
        while let Some(row) = rows.next()? {
            incidents.push(incident_from_row(row)?);
        }
        Ok(incidents)
    }
}

fn insert_inner(
    conn: &Connection,
    name: &str,
    kind: IncidentKind,
    start_time: i64,
    end_time: Option<i64>,
) -> Result<Incident> {
    conn.execute(
        "INSERT INTO incidents (name, kind, start_time, end_time) VALUES (?1, ?2, ?3, ?4);",
        params![name, kind.as_str(), start_time, end_time],
    )?;
    Ok(Incident {
        id: IncidentId(conn.last_insert_rowid()),
        name: name.to_string(),
        kind,
        start_time,
        end_time,
    })
}

fn active_inner(conn: &Connection) -> Result<Option<Incident>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCIDENT_COLUMNS}
         FROM incidents
         WHERE end_time IS NULL
         ORDER BY start_time DESC
         LIMIT 1;"
    ))?;
    let found = stmt
        .query_row([], |row| Ok(incident_from_row(row)))
        .optional()?;
    found.transpose()
}

fn get_inner(conn: &Connection, id: IncidentId) -> Result<Option<Incident>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = ?1;"
    ))?;
    let found = stmt
        .query_row([id.0], |row| Ok(incident_from_row(row)))
        .optional()?;
    found.transpose()
}

fn incident_from_row(row: &rusqlite::Row<'_>) -> Result<Incident> {
    let kind: String = row.get(2)?;
    let kind = IncidentKind::parse(&kind)
        .map_err(|_| StoreError::InvalidData(format!("incident kind {kind}")))?;
    Ok(Incident {
        id: IncidentId(row.get(0)?),
        name: row.get(1)?,
        kind,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
    })
}
