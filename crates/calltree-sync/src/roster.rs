use crate::csv::parse_records;
use crate::error::{Result, SyncError};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

/// One usable roster line. Optional columns missing from the file read as
/// empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub name: String,
    pub number: String,
    pub department: String,
    pub location: String,
    pub position: String,
    pub level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ParsedRoster {
    pub rows: Vec<RosterRow>,
    pub warnings: Vec<String>,
    pub skipped: usize,
}

struct Columns {
    name: usize,
    number: usize,
    department: Option<usize>,
    location: Option<usize>,
    position: Option<usize>,
    level: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self> {
        let find = |wanted: &[&str]| {
            header.iter().position(|column| {
                let column = column.trim().to_ascii_lowercase();
                wanted.iter().any(|candidate| column == *candidate)
            })
        };
        Ok(Self {
            name: find(&["name"]).ok_or(SyncError::MissingColumn("name"))?,
            number: find(&["number", "phone"]).ok_or(SyncError::MissingColumn("number"))?,
            department: find(&["department", "dept"]),
            location: find(&["location"]),
            position: find(&["position"]),
            level: find(&["level"]),
        })
    }
}

/// Reads a roster CSV with a header row. `name` and `number` (or `phone`)
/// columns are required; rows without a name are skipped with a warning.
pub fn parse_roster(data: &str) -> Result<ParsedRoster> {
    let mut records = parse_records(data)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| SyncError::Parse("roster is empty".to_string()))?;
    let columns = Columns::from_header(&header)?;

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut skipped = 0;

    // Line numbers count the header as line 1.
    for (index, record) in records.enumerate() {
        let line = index + 2;
        let cell = |column: usize| record.get(column).map(|v| v.trim()).unwrap_or("");
        let optional = |column: Option<usize>| column.map(cell).unwrap_or("").to_string();

        let name = cell(columns.name);
        if name.is_empty() {
            warnings.push(format!("line {line}: missing name, row skipped"));
            skipped += 1;
            continue;
        }
        let number = cell(columns.number);
        if number.is_empty() {
            warnings.push(format!("line {line}: {name} has no number"));
        }

        let level = optional(columns.level);
        rows.push(RosterRow {
            name: name.to_string(),
            number: number.to_string(),
            department: optional(columns.department),
            location: optional(columns.location),
            position: optional(columns.position),
            level: (!level.is_empty()).then_some(level),
        });
    }

    Ok(ParsedRoster {
        rows,
        warnings,
        skipped,
    })
}
