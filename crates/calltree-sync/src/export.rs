use crate::csv::write_record;
use calltree_core::domain::RawResponse;
use calltree_core::rules::ProjectedContact;
use calltree_core::time::format_timestamp_full;

const RESPONSES_HEADER: [&str; 7] = [
    "name",
    "status",
    "position",
    "department",
    "location",
    "datetime",
    "number",
];
const PENDING_HEADER: [&str; 4] = ["Name", "Dept", "Position", "Phone"];
const UNKNOWN_HEADER: [&str; 3] = ["Phone", "Message", "Time"];

/// Responded contacts. `number` is the normalized key the reply matched on.
pub fn export_responses(rows: &[&ProjectedContact]) -> String {
    let mut out = String::new();
    write_record(&mut out, &RESPONSES_HEADER);
    for row in rows {
        let datetime = row.response_at.map(format_timestamp_full).unwrap_or_default();
        write_record(
            &mut out,
            &[
                row.contact.name.as_str(),
                row.status.as_str(),
                row.contact.position.as_str(),
                row.contact.department.as_str(),
                row.contact.location.as_str(),
                datetime.as_str(),
                row.normalized_number.as_str(),
            ],
        );
    }
    out
}

pub fn export_pending(rows: &[&ProjectedContact]) -> String {
    let mut out = String::new();
    write_record(&mut out, &PENDING_HEADER);
    for row in rows {
        write_record(
            &mut out,
            &[
                row.contact.name.as_str(),
                row.contact.department.as_str(),
                row.contact.position.as_str(),
                row.contact.number.as_str(),
            ],
        );
    }
    out
}

pub fn export_unknown(responses: &[RawResponse]) -> String {
    let mut out = String::new();
    write_record(&mut out, &UNKNOWN_HEADER);
    for response in responses {
        write_record(
            &mut out,
            &[
                response.sender.clone(),
                response.contents.clone(),
                format_timestamp_full(response.received_at),
            ],
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::parse_records;
    use calltree_core::domain::{Contact, ContactId, ResponseId, ResponseOrigin, Status};

    fn projected(name: &str, status: Status, at: Option<i64>) -> ProjectedContact {
        ProjectedContact {
            contact: Contact {
                id: ContactId::new(),
                name: name.to_string(),
                number: "0917 123 4567".to_string(),
                department: "Ops".to_string(),
                location: "Quezon City, NCR".to_string(),
                position: "Driver".to_string(),
                level: None,
            },
            normalized_number: "09171234567".to_string(),
            status,
            response_id: at.map(|_| ResponseId::new()),
            response_content: at.map(|_| "2".to_string()),
            response_at: at,
            match_kind: None,
        }
    }

    #[test]
    fn responses_export_has_expected_columns() {
        let row = projected("Juan Dela Cruz", Status::Slight, Some(1_700_000_000));
        let csv = export_responses(&[&row]);
        let records = parse_records(&csv).unwrap();
        assert_eq!(
            records[0],
            vec!["name", "status", "position", "department", "location", "datetime", "number"]
        );
        assert_eq!(records[1][0], "Juan Dela Cruz");
        assert_eq!(records[1][1], "Slight");
        assert_eq!(records[1][4], "Quezon City, NCR");
        assert_eq!(records[1][5], format_timestamp_full(1_700_000_000));
        assert_eq!(records[1][6], "09171234567");
        assert!(csv.contains("\"Quezon City, NCR\""));
    }

    #[test]
    fn pending_export_uses_raw_number() {
        let row = projected("Maria", Status::NoResponse, None);
        let csv = export_pending(&[&row]);
        assert_eq!(
            csv,
            "Name,Dept,Position,Phone\r\nMaria,Ops,Driver,0917 123 4567\r\n"
        );
    }

    #[test]
    fn unknown_export_quotes_messages() {
        let response = RawResponse {
            id: ResponseId::new(),
            uid: None,
            sender: "+639990000000".to_string(),
            contents: "1, safe \"here\"".to_string(),
            received_at: 0,
            origin: ResponseOrigin::Sms,
        };
        let csv = export_unknown(&[response]);
        let records = parse_records(&csv).unwrap();
        assert_eq!(records[0], vec!["Phone", "Message", "Time"]);
        assert_eq!(records[1][1], "1, safe \"here\"");
    }
}
