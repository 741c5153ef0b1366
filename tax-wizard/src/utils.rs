use rust_decimal::Decimal;

/// Normalizes amount input: trims whitespace and removes commas and a leading `$`.
fn normalize_amount_input(s: &str) -> String {
    s.trim().trim_start_matches('$').replace(',', "")
}

/// Parses a money amount entered by the user.
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`). Empty,
/// non-numeric and negative input all coerce to 0, so the result is always
/// non-negative.
pub fn parse_amount(s: &str) -> Decimal {
    let normalized = normalize_amount_input(s);
    if normalized.is_empty() {
        return Decimal::ZERO;
    }
    match normalized.parse::<Decimal>() {
        Ok(value) if value.is_sign_negative() => {
            tracing::debug!(input = %s, "negative amount coerced to 0");
            Decimal::ZERO
        }
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(input = %s, "invalid amount coerced to 0: {}", e);
            Decimal::ZERO
        }
    }
}

/// Keeps the ASCII digits of `s`, at most `limit` of them.
pub fn digits_only(
    s: &str,
    limit: usize,
) -> String {
    s.chars().filter(char::is_ascii_digit).take(limit).collect()
}

/// Reformats partial phone input as the user types.
///
/// `"555"` stays `"555"`, `"55512"` becomes `"(555) 12"`, and ten digits
/// become `"(555) 123-4567"`. Digits past the tenth stay in the last group
/// (`"(555) 123-45678"`) so validation still sees them.
pub fn format_phone(input: &str) -> String {
    let digits = digits_only(input, usize::MAX);
    match digits.len() {
        0..=3 => digits,
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// Reformats partial SSN input as the user types (`"123456789"` → `"123-45-6789"`).
pub fn format_ssn(input: &str) -> String {
    let digits = digits_only(input, 9);
    match digits.len() {
        0..=3 => digits,
        4..=5 => format!("{}-{}", &digits[..3], &digits[3..]),
        _ => format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..]),
    }
}

/// Shows only the last four digits of an SSN.
pub fn mask_ssn(ssn: &str) -> String {
    let digits = digits_only(ssn, 9);
    if digits.len() < 4 {
        return "***-**-****".to_string();
    }
    format!("***-**-{}", &digits[digits.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_amount_accepts_comma_thousands_separator() {
        assert_eq!(parse_amount("1,234.56"), dec!(1234.56));
        assert_eq!(parse_amount("$73,000"), dec!(73000));
    }

    #[test]
    fn parse_amount_empty_is_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("   "), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_non_numeric_is_zero() {
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("12abc"), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_negative_is_zero() {
        assert_eq!(parse_amount("-500"), Decimal::ZERO);
    }

    #[test]
    fn format_phone_handles_partial_input() {
        assert_eq!(format_phone("555"), "555");
        assert_eq!(format_phone("55512"), "(555) 12");
        assert_eq!(format_phone("5551234567"), "(555) 123-4567");
    }

    #[test]
    fn format_phone_strips_punctuation_and_keeps_extra_digits() {
        assert_eq!(format_phone("(555) 123-4567"), "(555) 123-4567");
        assert_eq!(format_phone("555-123-45678"), "(555) 123-45678");
        assert_eq!(format_phone("+1 555 123 4567"), "(155) 512-34567");
    }

    #[test]
    fn format_ssn_inserts_dashes() {
        assert_eq!(format_ssn("123456789"), "123-45-6789");
        assert_eq!(format_ssn("1234"), "123-4");
        assert_eq!(format_ssn("12"), "12");
    }

    #[test]
    fn format_ssn_is_idempotent() {
        assert_eq!(format_ssn("123-45-6789"), "123-45-6789");
    }

    #[test]
    fn mask_ssn_shows_last_four() {
        assert_eq!(mask_ssn("123-45-6789"), "***-**-6789");
        assert_eq!(mask_ssn("12"), "***-**-****");
    }
}
