//! Mention scanning.
//!
//! A mention is an `@` marker immediately followed by an email address, as in
//! `please review @alice@example.com`. The leading `@` is the marker, not
//! part of the address. Scanning is a regex heuristic over the raw content
//! blob: an email quoted in prose counts as a mention too, which is accepted
//! behavior.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `@` marker followed by a local part, `@`, domain labels, and a 2+ letter
/// TLD. The capture group is the address without the marker.
static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})").expect("mention pattern")
});

/// Extract every distinct mentioned email address from `content`.
///
/// Duplicates collapse to the first occurrence and the result preserves
/// document order. Matching is case-sensitive; empty content yields an empty
/// list.
pub fn extract_mentioned_emails(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut emails = Vec::new();
    for caps in MENTION.captures_iter(content) {
        let email = &caps[1];
        if seen.insert(email.to_string()) {
            emails.push(email.to_string());
        }
    }
    emails
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_single_mention() {
        let emails = extract_mentioned_emails("please review @alice@example.com today");
        assert_eq!(emails, vec!["alice@example.com"]);
    }

    #[test]
    fn test_extracts_multiple_mentions_in_order() {
        let emails = extract_mentioned_emails(
            "cc @bob@mail.co and @alice@example.com, then @carol@dev.example.org",
        );
        assert_eq!(
            emails,
            vec!["bob@mail.co", "alice@example.com", "carol@dev.example.org"]
        );
    }

    #[test]
    fn test_deduplicates_repeated_mentions() {
        let emails =
            extract_mentioned_emails("@alice@example.com again @alice@example.com and again");
        assert_eq!(emails, vec!["alice@example.com"]);
    }

    #[test]
    fn test_plain_email_without_marker_is_not_a_mention() {
        // A bare address has no leading marker, so nothing matches.
        assert!(extract_mentioned_emails("mail alice@example.com directly").is_empty());
    }

    #[test]
    fn test_empty_content_yields_nothing() {
        assert!(extract_mentioned_emails("").is_empty());
    }

    #[test]
    fn test_trailing_punctuation_is_not_captured() {
        let emails = extract_mentioned_emails("ping @bob@mail.co.");
        assert_eq!(emails, vec!["bob@mail.co"]);
    }

    #[test]
    fn test_case_is_preserved() {
        let emails = extract_mentioned_emails("ask @Alice@Example.COM");
        assert_eq!(emails, vec!["Alice@Example.COM"]);
    }

    #[test]
    fn test_incomplete_addresses_are_ignored() {
        assert!(extract_mentioned_emails("@alice is not an address").is_empty());
        assert!(extract_mentioned_emails("@alice@nodomain is missing a tld").is_empty());
    }
}
