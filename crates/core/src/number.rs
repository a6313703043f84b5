//! Phone-number normalization: raw URI text to a canonical dialable string.

use percent_encoding::percent_decode_str;

use crate::config::DIAL_SCHEMES;

/// Whether the text starts with a recognized dial scheme (`tel:` / `callto:`),
/// case-insensitively. The dispatcher rejects anything else before normalizing.
pub fn has_dial_scheme(raw: &str) -> bool {
    strip_scheme(raw).is_some()
}

fn strip_scheme(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    for scheme in DIAL_SCHEMES {
        if trimmed.len() > scheme.len()
            && trimmed.as_bytes()[scheme.len()] == b':'
            && trimmed[..scheme.len()].eq_ignore_ascii_case(scheme)
        {
            return Some(&trimmed[scheme.len() + 1..]);
        }
    }
    None
}

/// Normalize a `tel:`/`callto:` URI into at most one leading `+` followed by
/// a bare digit run. Returns `None` when the scheme prefix is missing.
///
/// Everything from the first `,` or `#` on (call-control separators and
/// extension markers) is discarded. Pure and total over its domain; no IO.
pub fn normalize(raw: &str) -> Option<String> {
    let rest = strip_scheme(raw)?.trim();
    let decoded = percent_decode_str(rest).decode_utf8_lossy();
    let head = match decoded.find(&[',', '#'][..]) {
        Some(cut) => &decoded[..cut],
        None => decoded.as_ref(),
    };
    let plus = head.starts_with('+');
    let digits: String = head.chars().filter(char::is_ascii_digit).collect();
    if plus {
        Some(format!("+{digits}"))
    } else {
        Some(digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_punctuation_and_keeps_leading_plus() {
        assert_eq!(normalize("tel:+1 (555) 123-4567").as_deref(), Some("+15551234567"));
    }

    #[test]
    fn discards_everything_after_the_first_separator() {
        assert_eq!(normalize("callto:555.123.4567,1234#").as_deref(), Some("5551234567"));
        assert_eq!(normalize("tel:555#99,1").as_deref(), Some("555"));
    }

    #[test]
    fn scheme_match_is_case_insensitive() {
        assert_eq!(normalize("TEL:0000").as_deref(), Some("0000"));
        assert_eq!(normalize("CallTo:12").as_deref(), Some("12"));
    }

    #[test]
    fn percent_decodes_before_cleaning() {
        assert_eq!(normalize("tel:%2B49%20170%20123").as_deref(), Some("+49170123"));
        // An encoded comma still terminates the number
        assert_eq!(normalize("tel:555%2C99").as_deref(), Some("555"));
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(normalize("tel:").as_deref(), Some(""));
        assert_eq!(normalize("tel:+").as_deref(), Some("+"));
        assert_eq!(normalize("  tel: 123 ").as_deref(), Some("123"));
    }

    #[test]
    fn unrecognized_schemes_are_rejected() {
        assert_eq!(normalize("http://example.com"), None);
        assert_eq!(normalize("telephone:123"), None);
        assert_eq!(normalize("123"), None);
        assert!(!has_dial_scheme("sip:123"));
        assert!(has_dial_scheme("tel:123"));
    }
}
