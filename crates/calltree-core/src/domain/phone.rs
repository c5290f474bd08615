/// Comparison key for a phone number: whitespace, hyphens, parentheses and
/// plus signs removed. Country codes are not canonicalized, so `0917…` and
/// `+63917…` produce different keys.
pub fn normalize_phone(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !(ch.is_whitespace() || matches!(ch, '-' | '+' | '(' | ')')))
        .collect()
}

/// Display form following the +63 mobile convention. Never used for matching.
pub fn format_phone_display(value: &str) -> String {
    if value.is_empty() {
        return "-".to_string();
    }
    let digits: String = value.chars().filter(|ch| ch.is_ascii_digit()).collect();

    if digits.len() == 10 && digits.starts_with('9') {
        return format!("+63{digits}");
    }
    if digits.len() == 12 && digits.starts_with("63") {
        return format!("+{digits}");
    }
    if digits.len() == 11 && digits.starts_with('0') {
        return format!("+63{}", &digits[1..]);
    }

    if value.starts_with('+') {
        value.to_string()
    } else {
        format!("+{digits}")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_phone_display, normalize_phone};

    #[test]
    fn normalize_strips_formatting() {
        assert_eq!(normalize_phone(" (0917) 123-4567 "), "09171234567");
        assert_eq!(normalize_phone("+63 917 123 4567"), "639171234567");
    }

    #[test]
    fn normalize_empty_is_empty_key() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("  -  "), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["+63 (917) 123-4567", "0917-123-4567", "abc 12", "", "++--"] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once);
        }
    }

    // Local and international spellings of the same number do not meet.
    // Display code assumes +63 while matching does not; kept until the
    // product decides on canonicalization.
    #[test]
    fn normalize_keeps_country_code_spellings_apart() {
        assert_eq!(normalize_phone("09171234567"), "09171234567");
        assert_eq!(normalize_phone("+639171234567"), "639171234567");
        assert_ne!(
            normalize_phone("09171234567"),
            normalize_phone("+639171234567")
        );
    }

    #[test]
    fn display_applies_mobile_prefix() {
        assert_eq!(format_phone_display("9171234567"), "+639171234567");
        assert_eq!(format_phone_display("639171234567"), "+639171234567");
        assert_eq!(format_phone_display("0917-123-4567"), "+639171234567");
        assert_eq!(format_phone_display("+1 415 555"), "+1 415 555");
        assert_eq!(format_phone_display("12345"), "+12345");
        assert_eq!(format_phone_display(""), "-");
    }
}
