//! Duplicate-candidate scoring.
//!
//! Exact email or phone equality (after normalization) is treated as a
//! certain match; equal names on the same mail domain is a weaker signal
//! flagged separately so a reviewer can override it.

use serde::Serialize;

use crate::candidate::Candidate;

/// Which identity signal flagged the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    EmailExact,
    PhoneExact,
    NameAndDomain,
}

/// Outcome of comparing two candidate records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub is_match: bool,
    pub reasons: Vec<MatchReason>,
}

/// Lowercased, trimmed email; `None` when effectively empty.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

/// Digits only; `None` when nothing is left.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then_some(digits)
}

fn normalize_name(raw: &str) -> Option<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    (!name.is_empty()).then_some(name)
}

fn email_domain(normalized: &str) -> Option<&str> {
    normalized
        .split_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
}

/// Scores two candidate records for likely identity collision.
///
/// Symmetric: `score(a, b)` and `score(b, a)` agree. Empty normalized
/// values never match each other.
pub fn score(a: &Candidate, b: &Candidate) -> MatchResult {
    let mut reasons = Vec::new();

    let email_a = a.email.as_deref().and_then(normalize_email);
    let email_b = b.email.as_deref().and_then(normalize_email);
    if let (Some(ea), Some(eb)) = (&email_a, &email_b) {
        if ea == eb {
            reasons.push(MatchReason::EmailExact);
        }
    }

    let phone_a = a.phone.as_deref().and_then(normalize_phone);
    let phone_b = b.phone.as_deref().and_then(normalize_phone);
    if let (Some(pa), Some(pb)) = (phone_a, phone_b) {
        if pa == pb {
            reasons.push(MatchReason::PhoneExact);
        }
    }

    if let (Some(na), Some(nb)) = (normalize_name(&a.full_name), normalize_name(&b.full_name)) {
        if na == nb {
            let domains = (
                email_a.as_deref().and_then(email_domain),
                email_b.as_deref().and_then(email_domain),
            );
            if let (Some(da), Some(db)) = domains {
                if da == db && !reasons.contains(&MatchReason::EmailExact) {
                    reasons.push(MatchReason::NameAndDomain);
                }
            }
        }
    }

    MatchResult {
        is_match: !reasons.is_empty(),
        reasons,
    }
}

/// Compares one candidate against a pool, returning the flagged pairs.
///
/// The candidate itself (same id) is skipped, as are anonymised records,
/// whose identity fields are placeholders.
pub fn find_matches<'a>(
    candidate: &Candidate,
    pool: &'a [Candidate],
) -> Vec<(&'a Candidate, MatchResult)> {
    pool.iter()
        .filter(|other| other.id != candidate.id && !other.is_anonymised())
        .filter_map(|other| {
            let result = score(candidate, other);
            result.is_match.then_some((other, result))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, email: Option<&str>, phone: Option<&str>) -> Candidate {
        Candidate::new(name, email, phone)
    }

    #[test]
    fn exact_email_matches_despite_case_and_whitespace() {
        let a = candidate("Jane Smith", Some("  Jane.Smith@Example.COM "), None);
        let b = candidate("J. Smith", Some("jane.smith@example.com"), None);
        let result = score(&a, &b);
        assert!(result.is_match);
        assert_eq!(result.reasons, vec![MatchReason::EmailExact]);
    }

    #[test]
    fn phone_matches_after_stripping_formatting() {
        let a = candidate("Jane Smith", None, Some("+44 7700 900123"));
        let b = candidate("Jane Smyth", None, Some("(07700) 900-123"));
        // +44 7700900123 vs 07700900123 differ in digits, so build equal ones
        let a2 = candidate("Jane Smith", None, Some("07700 900123"));
        assert!(score(&a2, &b).is_match);
        assert_eq!(score(&a2, &b).reasons, vec![MatchReason::PhoneExact]);
        assert!(!score(&a, &b).is_match);
    }

    #[test]
    fn same_name_same_domain_is_a_weak_match() {
        let a = candidate("Alex Chen", Some("achen@acme.io"), None);
        let b = candidate("alex  chen", Some("alex.chen@acme.io"), None);
        let result = score(&a, &b);
        assert!(result.is_match);
        assert_eq!(result.reasons, vec![MatchReason::NameAndDomain]);
    }

    #[test]
    fn same_name_different_domain_is_no_match() {
        let a = candidate("Alex Chen", Some("achen@acme.io"), None);
        let b = candidate("Alex Chen", Some("achen@other.io"), None);
        assert!(!score(&a, &b).is_match);
    }

    #[test]
    fn empty_fields_never_match_each_other() {
        let a = candidate("A", Some("   "), Some("n/a"));
        let b = candidate("B", Some(""), Some("---"));
        let result = score(&a, &b);
        assert!(!result.is_match);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn scoring_is_symmetric() {
        let pairs = [
            (
                candidate("Jane Smith", Some("jane@example.com"), Some("0123456")),
                candidate("Jane Smith", Some("JANE@example.com"), None),
            ),
            (
                candidate("Alex Chen", Some("achen@acme.io"), None),
                candidate("Alex Chen", Some("alex.chen@acme.io"), None),
            ),
            (
                candidate("No Match", Some("x@y.z"), Some("111")),
                candidate("Other Person", Some("a@b.c"), Some("222")),
            ),
        ];
        for (a, b) in &pairs {
            assert_eq!(score(a, b).is_match, score(b, a).is_match);
            assert_eq!(score(a, b).reasons, score(b, a).reasons);
        }
    }

    #[test]
    fn exact_email_match_suppresses_the_weaker_reason() {
        let a = candidate("Jane Smith", Some("jane@example.com"), None);
        let b = candidate("Jane Smith", Some("jane@example.com"), None);
        let result = score(&a, &b);
        assert_eq!(result.reasons, vec![MatchReason::EmailExact]);
    }

    #[test]
    fn multiple_reasons_accumulate() {
        let a = candidate("Jane Smith", Some("jane@example.com"), Some("0123 456"));
        let b = candidate("Janet Smith", Some("jane@example.com"), Some("0123456"));
        let result = score(&a, &b);
        assert_eq!(
            result.reasons,
            vec![MatchReason::EmailExact, MatchReason::PhoneExact]
        );
    }

    #[test]
    fn find_matches_skips_self_and_anonymised() {
        let target = candidate("Jane Smith", Some("jane@example.com"), None);
        let mut anonymised = candidate("Jane Smith", Some("jane@example.com"), None);
        anonymised.anonymised_at = Some(chrono::Utc::now());
        let twin = candidate("Jane Smith", Some("jane@example.com"), None);
        let unrelated = candidate("Sam Jones", Some("sam@jones.dev"), None);

        let pool = vec![target.clone(), anonymised, twin.clone(), unrelated];
        let matches = find_matches(&target, &pool);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0.id, twin.id);
    }
}
