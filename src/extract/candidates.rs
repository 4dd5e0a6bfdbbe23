//! Candidate module-id mining.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Object-literal keys: quoted or bare, after `{` or `,` and before `:`.
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[{,]\s*(?:"([^"\n]+)"|'([^'\n]+)'|([\w$.\-]+))\s*:"#)
        .expect("candidate key regex is valid")
});

/// A module id to probe the loader with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateId {
    /// All-digit keys are passed as numbers
    Number(i64),
    Name(String),
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateId::Number(n) => write!(f, "{n}"),
            CandidateId::Name(s) => write!(f, "{s:?}"),
        }
    }
}

impl CandidateId {
    fn from_key(key: &str) -> Self {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = key.parse::<i64>() {
                return CandidateId::Number(n);
            }
        }
        CandidateId::Name(key.to_string())
    }
}

/// Mines candidate ids from a loader expression, deduplicated in order of
/// first appearance.
pub fn mine_candidates(expression: &str) -> Vec<CandidateId> {
    let mut out: Vec<CandidateId> = Vec::new();
    for caps in KEY_RE.captures_iter(expression) {
        let key = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().trim());
        if let Some(key) = key.filter(|k| !k.is_empty()) {
            let id = CandidateId::from_key(key);
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}
