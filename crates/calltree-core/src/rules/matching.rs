use crate::domain::{
    normalize_phone, Contact, ContactId, RawResponse, ResponseId, ResponseOrigin, Status,
};
use crate::rules::classify::classify;
use crate::rules::name_match::{find_by_name, NameMatch};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MANUAL_MARKER: &str = "manual entry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Phone,
    Name,
    Manual,
}

impl MatchKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MatchKind::Phone => "phone",
            MatchKind::Name => "name",
            MatchKind::Manual => "manual",
        }
    }
}

/// Per-response view: the status and residual text read from the reply and
/// how (if at all) it was tied to a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub status: Status,
    pub residual: String,
    pub kind: Option<MatchKind>,
}

/// A roster contact with the latest response linked to it in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectedContact {
    #[serde(flatten)]
    pub contact: Contact,
    pub normalized_number: String,
    pub status: Status,
    pub response_id: Option<ResponseId>,
    pub response_content: Option<String>,
    pub response_at: Option<i64>,
    pub match_kind: Option<MatchKind>,
}

impl ProjectedContact {
    fn pending(contact: &Contact) -> Self {
        Self {
            normalized_number: normalize_phone(&contact.number),
            contact: contact.clone(),
            status: Status::NoResponse,
            response_id: None,
            response_content: None,
            response_at: None,
            match_kind: None,
        }
    }

    pub fn has_response(&self) -> bool {
        self.response_id.is_some()
    }
}

/// A name found in a reply that fit more than one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousName {
    pub response_id: ResponseId,
    pub candidate: String,
    pub contact_ids: Vec<ContactId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// One entry per roster contact, in roster order.
    pub contacts: Vec<ProjectedContact>,
    /// Responses tied to no contact, in input order.
    pub unknown: Vec<RawResponse>,
    pub ambiguous: Vec<AmbiguousName>,
    /// Older responses dropped because the contact already had a newer one.
    pub superseded: usize,
}

/// Normalized phone lookup over a roster, built once per pass.
pub struct RosterIndex<'a> {
    roster: &'a [Contact],
    by_number: HashMap<String, usize>,
}

struct Resolution {
    contact: Option<usize>,
    result: MatchResult,
    ambiguous: Option<AmbiguousName>,
}

impl<'a> RosterIndex<'a> {
    pub fn new(roster: &'a [Contact]) -> Self {
        let mut by_number = HashMap::with_capacity(roster.len());
        for (index, contact) in roster.iter().enumerate() {
            let key = normalize_phone(&contact.number);
            // Empty keys never match; duplicate keys resolve to the last contact.
            if !key.is_empty() {
                by_number.insert(key, index);
            }
        }
        Self { roster, by_number }
    }

    pub fn roster(&self) -> &'a [Contact] {
        self.roster
    }

    pub fn by_number(&self, raw: &str) -> Option<&'a Contact> {
        self.lookup_number(raw).map(|index| &self.roster[index])
    }

    fn lookup_number(&self, raw: &str) -> Option<usize> {
        let key = normalize_phone(raw);
        if key.is_empty() {
            return None;
        }
        self.by_number.get(&key).copied()
    }

    /// Ties one response to a contact without recording anything.
    pub fn match_response(&self, response: &RawResponse) -> (Option<&'a Contact>, MatchResult) {
        let resolution = self.resolve(response);
        (
            resolution.contact.map(|index| &self.roster[index]),
            resolution.result,
        )
    }

    fn resolve(&self, response: &RawResponse) -> Resolution {
        let classification = classify(&response.contents);
        let mut ambiguous = None;

        let (mut contact, mut kind) = match self.lookup_number(&response.sender) {
            Some(index) => (Some(index), Some(MatchKind::Phone)),
            None => (None, None),
        };

        if contact.is_none()
            && classification.status.is_responded()
            && !classification.residual.is_empty()
        {
            match find_by_name(&classification.residual, self.roster) {
                // Replies are recorded per phone key, so a contact without a
                // number cannot hold one.
                NameMatch::Single(found) if normalize_phone(&found.number).is_empty() => {}
                NameMatch::Single(found) => {
                    contact = self.position_of(found.id);
                    kind = contact.map(|_| MatchKind::Name);
                }
                NameMatch::Ambiguous(contact_ids) => {
                    ambiguous = Some(AmbiguousName {
                        response_id: response.id,
                        candidate: classification.residual.clone(),
                        contact_ids,
                    });
                }
                NameMatch::NoMatch => {}
            }
        }

        if contact.is_some() && is_manual(response) {
            kind = Some(MatchKind::Manual);
        }

        Resolution {
            contact,
            result: MatchResult {
                status: classification.status,
                residual: classification.residual,
                kind,
            },
            ambiguous,
        }
    }

    fn position_of(&self, id: ContactId) -> Option<usize> {
        self.roster.iter().position(|contact| contact.id == id)
    }
}

/// Manual corrections are tagged at write time; older rows without the tag
/// are recognized by their "manual entry" text.
pub fn is_manual(response: &RawResponse) -> bool {
    response.origin == ResponseOrigin::Manual
        || response.contents.to_lowercase().contains(MANUAL_MARKER)
}

/// Links a newest-first batch of responses to the roster, keeping the first
/// (newest) response seen for each contact. Never fails: anything that cannot
/// be tied to a contact lands in `unknown`.
pub fn match_responses(roster: &[Contact], responses: &[RawResponse]) -> MatchOutcome {
    let index = RosterIndex::new(roster);
    let mut latest: Vec<Option<(&RawResponse, MatchKind)>> = vec![None; roster.len()];
    let mut unknown = Vec::new();
    let mut ambiguous = Vec::new();
    let mut superseded = 0;

    for response in responses {
        let resolution = index.resolve(response);
        if let Some(candidate) = resolution.ambiguous {
            ambiguous.push(candidate);
        }

        match (resolution.contact, resolution.result.kind) {
            (Some(position), Some(kind)) => {
                let slot = &mut latest[position];
                if slot.is_none() {
                    *slot = Some((response, kind));
                } else {
                    superseded += 1;
                }
            }
            _ => unknown.push(response.clone()),
        }
    }

    let contacts = roster
        .iter()
        .zip(latest)
        .map(|(contact, recorded)| {
            let mut projected = ProjectedContact::pending(contact);
            if let Some((response, kind)) = recorded {
                // Re-derived from the stored text rather than reusing the
                // provisional status from the matching loop.
                projected.status = classify(&response.contents).status;
                projected.response_id = Some(response.id);
                projected.response_content = Some(response.contents.clone());
                projected.response_at = Some(response.received_at);
                projected.match_kind = Some(kind);
            }
            projected
        })
        .collect();

    MatchOutcome {
        contacts,
        unknown,
        ambiguous,
        superseded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, number: &str) -> Contact {
        Contact {
            id: ContactId::new(),
            name: name.to_string(),
            number: number.to_string(),
            department: "Operations".to_string(),
            location: "Cebu".to_string(),
            position: "Staff".to_string(),
            level: None,
        }
    }

    fn response(sender: &str, contents: &str, received_at: i64) -> RawResponse {
        RawResponse {
            id: ResponseId::new(),
            uid: None,
            sender: sender.to_string(),
            contents: contents.to_string(),
            received_at,
            origin: ResponseOrigin::Sms,
        }
    }

    #[test]
    fn phone_match_sets_status_and_kind() {
        let roster = vec![contact("Juan Dela Cruz", "09171234567")];
        let responses = vec![response("09171234567", "2 resting at home", 100)];

        let outcome = match_responses(&roster, &responses);

        let projected = &outcome.contacts[0];
        assert_eq!(projected.status, Status::Slight);
        assert_eq!(projected.match_kind, Some(MatchKind::Phone));
        assert_eq!(projected.response_at, Some(100));
        assert_eq!(
            projected.response_content.as_deref(),
            Some("2 resting at home")
        );
        assert!(outcome.unknown.is_empty());
    }

    #[test]
    fn unknown_number_matches_by_name_in_text() {
        let roster = vec![contact("Juan Dela Cruz", "09171234567")];
        let responses = vec![response("unknown-number", "safe - Juan Dela Cruz", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::Safe);
        assert_eq!(outcome.contacts[0].match_kind, Some(MatchKind::Name));
        assert!(outcome.unknown.is_empty());
    }

    #[test]
    fn formatted_sender_matches_plain_roster_number() {
        let roster = vec![contact("Ana Reyes", "0917 123 4567")];
        let responses = vec![response("(0917) 123-4567", "1", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].match_kind, Some(MatchKind::Phone));
        assert_eq!(outcome.contacts[0].normalized_number, "09171234567");
    }

    #[test]
    fn country_code_spelling_does_not_match_by_phone() {
        let roster = vec![contact("Ana Reyes", "09171234567")];
        let responses = vec![response("+639171234567", "1", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::NoResponse);
        assert_eq!(outcome.unknown.len(), 1);
    }

    #[test]
    fn newest_response_wins_per_contact() {
        let roster = vec![contact("Ana Reyes", "09171234567")];
        let responses = vec![
            response("09171234567", "4 trapped", 300),
            response("09171234567", "1 fine", 200),
            response("+0917-123-4567", "2", 100),
        ];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::Severe);
        assert_eq!(outcome.contacts[0].response_at, Some(300));
        assert_eq!(outcome.superseded, 2);
        assert!(outcome.unknown.is_empty());
    }

    #[test]
    fn name_match_and_phone_match_share_one_slot() {
        let roster = vec![contact("Juan Dela Cruz", "09171234567")];
        let responses = vec![
            response("09990000000", "3 Juan Dela Cruz", 300),
            response("09171234567", "1", 200),
        ];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::Moderate);
        assert_eq!(outcome.contacts[0].match_kind, Some(MatchKind::Name));
        assert_eq!(outcome.superseded, 1);
    }

    #[test]
    fn ambiguous_name_goes_to_unknown_and_is_reported() {
        let roster = vec![
            contact("Juan Cruz", "09170000001"),
            contact("Jan Cruz", "09170000002"),
        ];
        let reply = response("09990000000", "1 J. Cruz", 100);
        let responses = vec![reply.clone()];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.unknown, vec![reply.clone()]);
        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.ambiguous[0].response_id, reply.id);
        assert_eq!(outcome.ambiguous[0].candidate, "J. Cruz");
        assert_eq!(
            outcome.ambiguous[0].contact_ids,
            vec![roster[0].id, roster[1].id]
        );
        assert!(outcome
            .contacts
            .iter()
            .all(|c| c.status == Status::NoResponse));
    }

    #[test]
    fn name_lookup_requires_a_status_keyword() {
        let roster = vec![contact("Juan Dela Cruz", "09171234567")];
        let responses = vec![response("09990000000", "Juan Dela Cruz here", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.unknown.len(), 1);
        assert!(outcome.ambiguous.is_empty());
    }

    #[test]
    fn manual_marker_overrides_kind_but_not_contact() {
        let roster = vec![
            contact("Juan Dela Cruz", "09171234567"),
            contact("Maria Santos", "09181234567"),
        ];
        let responses = vec![response("09181234567", "1 - Manual Entry", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::NoResponse);
        assert_eq!(outcome.contacts[1].status, Status::Safe);
        assert_eq!(outcome.contacts[1].match_kind, Some(MatchKind::Manual));
    }

    #[test]
    fn manual_origin_tag_marks_kind_without_marker_text() {
        let roster = vec![contact("Maria Santos", "09181234567")];
        let mut reply = response("09181234567", "2 - Replied via Viber", 100);
        reply.origin = ResponseOrigin::Manual;

        let outcome = match_responses(&roster, &[reply]);

        assert_eq!(outcome.contacts[0].match_kind, Some(MatchKind::Manual));
        assert_eq!(outcome.contacts[0].status, Status::Slight);
    }

    #[test]
    fn unmatched_manual_text_still_lands_in_unknown() {
        let roster = vec![contact("Maria Santos", "09181234567")];
        let responses = vec![response("000", "manual entry", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.unknown.len(), 1);
    }

    #[test]
    fn phone_match_with_unclassifiable_text_records_no_response() {
        let roster = vec![contact("Ana Reyes", "09171234567")];
        let responses = vec![response("09171234567", "who is this?", 100)];

        let outcome = match_responses(&roster, &responses);

        let projected = &outcome.contacts[0];
        assert!(projected.has_response());
        assert_eq!(projected.status, Status::NoResponse);
        assert_eq!(projected.match_kind, Some(MatchKind::Phone));
    }

    #[test]
    fn empty_numbers_never_match_each_other() {
        let roster = vec![contact("Ana Reyes", "")];
        let responses = vec![response("", "1", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::NoResponse);
        assert_eq!(outcome.unknown.len(), 1);
    }

    #[test]
    fn name_match_skips_contact_without_number() {
        let roster = vec![contact("Ana Reyes", " - ")];
        let responses = vec![response("09990000000", "safe Ana Reyes", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::NoResponse);
        assert_eq!(outcome.contacts[0].match_kind, None);
        assert_eq!(outcome.unknown.len(), 1);
        assert!(outcome.ambiguous.is_empty());
    }

    #[test]
    fn decimal_code_from_unknown_sender_is_not_name_matched() {
        let roster = vec![contact("Pedro Santos", "09171234567")];
        let responses = vec![response("09990000000", "4.0 Pedro", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::NoResponse);
        assert_eq!(outcome.contacts[0].match_kind, None);
        assert_eq!(outcome.unknown.len(), 1);
    }

    #[test]
    fn unknown_bucket_keeps_input_order() {
        let roster = vec![contact("Ana Reyes", "09171234567")];
        let responses = vec![
            response("1111", "hello", 300),
            response("09171234567", "1", 250),
            response("2222", "ok", 200),
            response("3333", "", 100),
        ];

        let outcome = match_responses(&roster, &responses);

        let senders: Vec<_> = outcome.unknown.iter().map(|r| r.sender.as_str()).collect();
        assert_eq!(senders, vec!["1111", "2222", "3333"]);
    }

    #[test]
    fn every_roster_contact_is_projected_and_counts_add_up() {
        let roster = vec![
            contact("Ana Reyes", "09171234567"),
            contact("Ben Lim", "09181234567"),
            contact("Carla Tan", "09191234567"),
        ];
        let responses = vec![
            response("09171234567", "1", 500),
            response("09171234567", "2", 400),
            response("5555", "garbled", 300),
            response("09181234567", "3", 200),
        ];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts.len(), roster.len());
        let matched = outcome.contacts.iter().filter(|c| c.has_response()).count();
        assert_eq!(
            matched + outcome.unknown.len() + outcome.superseded,
            responses.len()
        );
        assert_eq!(outcome.contacts[2].status, Status::NoResponse);
        assert_eq!(outcome.contacts[2].match_kind, None);
    }

    #[test]
    fn duplicate_roster_numbers_resolve_to_last_contact() {
        let roster = vec![
            contact("Ana Reyes", "09171234567"),
            contact("Ana R. Duplicate", "0917-123-4567"),
        ];
        let responses = vec![response("09171234567", "1", 100)];

        let outcome = match_responses(&roster, &responses);

        assert_eq!(outcome.contacts[0].status, Status::NoResponse);
        assert_eq!(outcome.contacts[1].status, Status::Safe);
    }

    #[test]
    fn match_response_reports_per_response_result() {
        let roster = vec![contact("Juan Dela Cruz", "09171234567")];
        let index = RosterIndex::new(&roster);

        let (found, result) = index.match_response(&response("0000", "help Juan", 1));

        assert_eq!(found.map(|c| c.id), Some(roster[0].id));
        assert_eq!(result.status, Status::Severe);
        assert_eq!(result.residual, "Juan");
        assert_eq!(result.kind, Some(MatchKind::Name));
        assert_eq!(index.by_number("0917 123 4567").map(|c| c.id), Some(roster[0].id));
    }

    #[test]
    fn empty_inputs_produce_empty_outcome() {
        let outcome = match_responses(&[], &[]);
        assert!(outcome.contacts.is_empty());
        assert!(outcome.unknown.is_empty());
        assert_eq!(outcome.superseded, 0);
    }
}
