use crate::domain::Status;
use serde::{Deserialize, Serialize};

/// Status read out of a free-text reply plus the text left once the status
/// keyword is removed. The residual is usually the sender's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub status: Status,
    pub residual: String,
}

impl Classification {
    fn no_response(residual: &str) -> Self {
        Self {
            status: Status::NoResponse,
            residual: residual.to_string(),
        }
    }
}

/// Classifies a reply. The first keyword token from the left wins; character
/// classes are ASCII-only so results do not depend on locale.
pub fn classify(text: &str) -> Classification {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Classification::no_response("");
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let found = tokens
        .iter()
        .enumerate()
        .find_map(|(index, token)| keyword_status(token).map(|status| (index, status)));

    let Some((index, status)) = found else {
        return Classification::no_response(trimmed);
    };

    let remainder = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, token)| *token)
        .collect::<Vec<_>>()
        .join(" ");

    Classification {
        status,
        residual: trim_non_alphanumeric(&remainder).to_string(),
    }
}

fn keyword_status(token: &str) -> Option<Status> {
    let cleaned: String = token
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect();
    Status::from_keyword(&cleaned)
}

fn trim_non_alphanumeric(value: &str) -> &str {
    value.trim_matches(|ch: char| !ch.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::{classify, Classification};
    use crate::domain::Status;

    fn classified(status: Status, residual: &str) -> Classification {
        Classification {
            status,
            residual: residual.to_string(),
        }
    }

    #[test]
    fn leading_code_then_name() {
        assert_eq!(
            classify("2 Juan Dela Cruz"),
            classified(Status::Slight, "Juan Dela Cruz")
        );
    }

    #[test]
    fn trailing_code_after_name() {
        assert_eq!(
            classify("Juan Dela Cruz 2"),
            classified(Status::Slight, "Juan Dela Cruz")
        );
    }

    #[test]
    fn bare_keyword_has_empty_residual() {
        assert_eq!(classify("safe"), classified(Status::Safe, ""));
        assert_eq!(classify("  OK!  "), classified(Status::Safe, ""));
    }

    #[test]
    fn empty_input_is_no_response() {
        assert_eq!(classify(""), classified(Status::NoResponse, ""));
        assert_eq!(classify("   \n "), classified(Status::NoResponse, ""));
    }

    #[test]
    fn unclassifiable_text_is_kept_as_residual() {
        assert_eq!(
            classify("hello there"),
            classified(Status::NoResponse, "hello there")
        );
        assert_eq!(
            classify("  call me  back "),
            classified(Status::NoResponse, "call me  back")
        );
    }

    #[test]
    fn earliest_keyword_wins_over_severity() {
        assert_eq!(
            classify("ok but need help"),
            classified(Status::Safe, "but need help")
        );
        assert_eq!(
            classify("help ok"),
            classified(Status::Severe, "ok")
        );
    }

    #[test]
    fn punctuation_around_keyword_and_name_is_stripped() {
        assert_eq!(
            classify("safe - Juan Dela Cruz"),
            classified(Status::Safe, "Juan Dela Cruz")
        );
        assert_eq!(
            classify("3, Maria (HR)."),
            classified(Status::Moderate, "Maria (HR")
        );
    }

    #[test]
    fn decimal_codes_lose_their_dot_and_are_not_keywords() {
        assert_eq!(
            classify("4.0 Pedro"),
            classified(Status::NoResponse, "4.0 Pedro")
        );
        assert_eq!(classify("2.0"), classified(Status::NoResponse, "2.0"));
        assert_eq!(
            classify("10 people here"),
            classified(Status::NoResponse, "10 people here")
        );
    }

    #[test]
    fn inner_whitespace_is_collapsed_in_residual() {
        assert_eq!(
            classify("Ana\t  Santos   1"),
            classified(Status::Safe, "Ana Santos")
        );
    }

    #[test]
    fn deterministic_for_repeated_calls() {
        let text = "MINOR injuries - Jose Rizal";
        assert_eq!(classify(text), classify(text));
        assert_eq!(classify(text), classified(Status::Slight, "injuries - Jose Rizal"));
    }
}
