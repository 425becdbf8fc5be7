//! Guest-info heuristics for feed events.
//!
//! Channel feeds hide guest identity behind free text: the summary carries a
//! name with boilerplate suffixes, the description sometimes carries a
//! labeled phone number. Extraction is best-effort; a miss is not an error.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder name used when a feed event carries no real guest name.
pub const GENERIC_GUEST_NAME: &str = "Guest";

static SUMMARY_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*-\s*(Reserved|Blocked|Not available)$").expect("suffix pattern is valid")
});

static TRAILING_PAREN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*\)$").expect("paren pattern is valid"));

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Reserved|Blocked|Not available|Unavailable)$")
        .expect("placeholder pattern is valid")
});

static PHONE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Phone|Tel|Mobile):\s*(\+?[\d\s-]+)").expect("phone pattern is valid")
});

/// Guest identity derived from an event's free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    /// Display name, or [`GENERIC_GUEST_NAME`] when nothing usable was found.
    pub name: String,
    /// Phone number with whitespace and dashes stripped, if one was found.
    pub phone: Option<String>,
}

impl GuestInfo {
    /// Returns true when the name is the generic placeholder.
    ///
    /// Placeholder-named events block availability but never materialize a
    /// reservation.
    pub fn is_placeholder(&self) -> bool {
        self.name == GENERIC_GUEST_NAME
    }
}

/// Derives guest info from an event's summary and description.
pub fn extract_guest_info(summary: Option<&str>, description: Option<&str>) -> GuestInfo {
    let mut name = GENERIC_GUEST_NAME.to_string();

    if let Some(summary) = summary {
        let stripped = SUMMARY_SUFFIX.replace(summary, "");
        let stripped = TRAILING_PAREN.replace(&stripped, "");
        let candidate = stripped.trim();

        if !candidate.is_empty() && !PLACEHOLDER.is_match(candidate) {
            name = candidate.to_string();
        }
    }

    let phone = description.and_then(|text| {
        PHONE_LABEL.captures(text).map(|caps| {
            caps[1]
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '-')
                .collect::<String>()
        })
    });

    GuestInfo { name, phone }
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+995|995)?[0-9]{9}$|^\+?[1-9]\d{6,14}$").expect("phone pattern is valid")
});

/// Checks an email address for the minimal `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Checks a phone number: Georgian national format or loose international.
///
/// Whitespace and dashes are ignored.
pub fn is_valid_phone(phone: &str) -> bool {
    let normalized: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    PHONE.is_match(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod names {
        use super::*;

        #[test]
        fn suffix_is_stripped() {
            let info = extract_guest_info(Some("Jane Doe - Reserved"), None);
            assert_eq!(info.name, "Jane Doe");
            assert!(!info.is_placeholder());
        }

        #[test]
        fn blocked_suffix_and_case() {
            assert_eq!(
                extract_guest_info(Some("John Smith - blocked"), None).name,
                "John Smith"
            );
            assert_eq!(
                extract_guest_info(Some("John Smith - Not Available"), None).name,
                "John Smith"
            );
        }

        #[test]
        fn trailing_parenthetical_is_stripped() {
            assert_eq!(
                extract_guest_info(Some("Jane Doe (HMABCDEF12)"), None).name,
                "Jane Doe"
            );
        }

        #[test]
        fn bare_placeholders_become_generic() {
            for summary in ["Reserved", "Blocked", "Not available", "UNAVAILABLE"] {
                let info = extract_guest_info(Some(summary), None);
                assert_eq!(info.name, GENERIC_GUEST_NAME, "summary: {summary}");
                assert!(info.is_placeholder());
            }
        }

        #[test]
        fn missing_summary_is_generic() {
            assert!(extract_guest_info(None, None).is_placeholder());
            assert!(extract_guest_info(Some("   "), None).is_placeholder());
        }

        #[test]
        fn plain_name_passes_through() {
            assert_eq!(
                extract_guest_info(Some("Nino Beridze"), None).name,
                "Nino Beridze"
            );
        }
    }

    mod phones {
        use super::*;

        #[test]
        fn labeled_phone_is_extracted_and_normalized() {
            let info = extract_guest_info(
                Some("Jane Doe"),
                Some("Guest details\nPhone: +995 555 12-34-56\nNights: 3"),
            );
            assert_eq!(info.phone.as_deref(), Some("+995555123456"));
        }

        #[test]
        fn tel_and_mobile_labels_work() {
            assert_eq!(
                extract_guest_info(None, Some("Tel: 555 123 456")).phone.as_deref(),
                Some("555123456")
            );
            assert_eq!(
                extract_guest_info(None, Some("mobile: +49 170 1234567"))
                    .phone
                    .as_deref(),
                Some("+491701234567")
            );
        }

        #[test]
        fn no_label_no_phone() {
            assert!(extract_guest_info(None, Some("just some text 12345")).phone.is_none());
            assert!(extract_guest_info(Some("Jane"), None).phone.is_none());
        }
    }

    mod validators {
        use super::*;

        #[test]
        fn emails() {
            assert!(is_valid_email("guest@example.com"));
            assert!(is_valid_email("first.last@mail.example.ge"));
            assert!(!is_valid_email("not-an-email"));
            assert!(!is_valid_email("spaces in@example.com"));
            assert!(!is_valid_email("missing@tld"));
        }

        #[test]
        fn georgian_phones() {
            assert!(is_valid_phone("+995555123456"));
            assert!(is_valid_phone("995 555 123 456"));
            assert!(is_valid_phone("555-123-456"));
        }

        #[test]
        fn international_phones() {
            assert!(is_valid_phone("+491701234567"));
            assert!(is_valid_phone("+1 212 555 0199"));
            assert!(!is_valid_phone("12"));
            assert!(!is_valid_phone("abcdef"));
        }
    }
}
