use crate::domain::{Contact, ContactId};

const MIN_CANDIDATE_LEN: usize = 2;

/// Outcome of looking a free-text name up in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch<'a> {
    NoMatch,
    Single(&'a Contact),
    /// More than one contact qualified; rejected rather than guessed.
    Ambiguous(Vec<ContactId>),
}

impl<'a> NameMatch<'a> {
    pub fn contact(&self) -> Option<&'a Contact> {
        match self {
            NameMatch::Single(contact) => Some(contact),
            _ => None,
        }
    }
}

/// Prefix match: every search token must start some token of the contact's
/// name. Single letters are plain prefixes, not a separate initials rule.
pub fn find_by_name<'a>(candidate: &str, roster: &'a [Contact]) -> NameMatch<'a> {
    if candidate.chars().count() < MIN_CANDIDATE_LEN {
        return NameMatch::NoMatch;
    }

    let search = name_tokens(candidate);
    if search.is_empty() {
        return NameMatch::NoMatch;
    }

    let matches: Vec<&Contact> = roster
        .iter()
        .filter(|contact| {
            let parts = name_tokens(&contact.name);
            search
                .iter()
                .all(|token| parts.iter().any(|part| part.starts_with(token.as_str())))
        })
        .collect();

    match matches.as_slice() {
        [] => NameMatch::NoMatch,
        [single] => NameMatch::Single(*single),
        many => NameMatch::Ambiguous(many.iter().map(|contact| contact.id).collect()),
    }
}

fn name_tokens(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|ch| ch.is_ascii_alphanumeric())
                .map(|ch| ch.to_ascii_lowercase())
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect()
}
