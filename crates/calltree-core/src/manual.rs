use crate::domain::{Contact, RawResponse, ResponseId, ResponseOrigin, Status};
use crate::error::CoreError;
use uuid::Uuid;

pub const DEFAULT_MANUAL_MESSAGE: &str = "Manual Entry";

/// Builds the response an operator records on behalf of `contact`, shaped so
/// the regular matcher ties it back to the same contact by phone.
pub fn compose_manual_entry(
    contact: &Contact,
    status: Status,
    message: Option<&str>,
    now_millis: i64,
) -> Result<RawResponse, CoreError> {
    let code = status
        .code()
        .ok_or(CoreError::ManualEntryWithoutStatus(status.as_str()))?;
    let sender = manual_sender(&contact.number)?;
    let message = message
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_MANUAL_MESSAGE);

    Ok(RawResponse {
        id: ResponseId::new(),
        uid: Some(manual_uid(now_millis)),
        sender,
        contents: format!("{code} - {message}"),
        received_at: now_millis.div_euclid(1000),
        origin: ResponseOrigin::Manual,
    })
}

/// Rewrites a roster number into the international form the SMS gateway
/// reports (`+63…`).
pub fn manual_sender(number: &str) -> Result<String, CoreError> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(CoreError::MissingContactNumber);
    }

    let digits = if let Some(rest) = digits.strip_prefix("09") {
        format!("639{rest}")
    } else if digits.len() == 10 && digits.starts_with('9') {
        format!("63{digits}")
    } else {
        digits
    };

    if digits.starts_with("63") {
        Ok(format!("+{digits}"))
    } else {
        Ok(digits)
    }
}

fn manual_uid(now_millis: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("m-{now_millis}-{}", &suffix[..8])
}
