//! Per-client placeholder substitution in question templates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tokens such as `MANAGER_OR_ADVISOR` or `FUND` and the client-specific
/// text that replaces them.
///
/// The template is scanned once from left to right. At each position the
/// longest matching token wins, so `FUND_NAME` is never clobbered by `FUND`,
/// and substituted values are never scanned again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
}

impl Placeholders {
    /// No substitutions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a substitution.
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    /// Add or replace a substitution. Empty tokens are ignored.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        if !token.is_empty() {
            self.values.insert(token, value.into());
        }
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if there is nothing to substitute.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replace every token occurring in `template`.
    pub fn apply(&self, template: &str) -> String {
        let mut tokens: Vec<(&String, &String)> = self.values.iter().collect();
        tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        'scan: while let Some(c) = rest.chars().next() {
            for (token, value) in &tokens {
                if let Some(after) = rest.strip_prefix(token.as_str()) {
                    out.push_str(value);
                    rest = after;
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Placeholders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut placeholders = Self::new();
        for (token, value) in iter {
            placeholders.insert(token, value);
        }
        placeholders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_replaces_every_occurrence() {
        let placeholders = Placeholders::new()
            .with("MANAGER_OR_ADVISOR", "Advent International Fund Manager Sàrl")
            .with("FUND", "Advent International GPE X-A SCSp");
        let question = placeholders.apply("Is MANAGER_OR_ADVISOR regulated? Who audits FUND and FUND?");
        assert_eq!(
            question,
            "Is Advent International Fund Manager Sàrl regulated? \
             Who audits Advent International GPE X-A SCSp and Advent International GPE X-A SCSp?"
        );
    }

    #[test]
    fn test_longer_tokens_win() {
        let placeholders: Placeholders = [("FUND", "Alpha"), ("FUND_NAME", "Alpha Fund I")].into_iter().collect();
        assert_eq!(placeholders.apply("FUND_NAME / FUND"), "Alpha Fund I / Alpha");
    }

    #[test]
    fn test_values_are_not_substituted_again() {
        let placeholders = Placeholders::new()
            .with("FUND", "MANAGER Fund I")
            .with("MANAGER", "Alpha Advisors");
        assert_eq!(
            placeholders.apply("Does MANAGER advise FUND?"),
            "Does Alpha Advisors advise MANAGER Fund I?"
        );
    }

    #[test]
    fn test_empty_placeholders_leave_text_untouched() {
        assert_eq!(Placeholders::new().apply("What is the fee?"), "What is the fee?");
    }
}
