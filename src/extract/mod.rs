//! Loader-extraction engine.
//!
//! Finds the chunk-loader function in one downloaded file: the syntax-tree
//! search runs first; the regex fallback only runs when that search yields
//! no usable loader or the file does not parse.

mod candidates;
mod fallback;
mod structural;
mod syntax;

use log::debug;

pub use candidates::{mine_candidates, CandidateId};
pub use fallback::{scan_fallback, FallbackLoader, FallbackScan};
pub use structural::{find_structural_loader, strip_public_path_prefix, StructuralLoader};
pub use syntax::parse_javascript;

use crate::storage::ExtractionMethod;

/// A loader ready for the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderMatch {
    pub parameter: String,
    /// Expression the synthesized function returns
    pub expression: String,
    pub method: ExtractionMethod,
    pub candidates: Vec<CandidateId>,
}

/// Everything extraction learned about one file.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Loaders with at least one candidate id
    pub matches: Vec<LoaderMatch>,
    pub parse_failed: bool,
    /// Fallback captures dropped for size
    pub oversized: usize,
}

impl ExtractionOutcome {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Runs structural search, then the regex fallback if needed.
///
/// Loaders without any candidate id are dropped: there is nothing to
/// evaluate them with.
pub fn extract_loaders(source: &str) -> ExtractionOutcome {
    let mut outcome = ExtractionOutcome::default();

    match parse_javascript(source) {
        Some(tree) => {
            if let Some(loader) = find_structural_loader(&tree, source) {
                let candidates = mine_candidates(&loader.expression);
                if candidates.is_empty() {
                    debug!("Structural loader has no candidate ids: {}", loader.expression);
                } else {
                    outcome.matches.push(LoaderMatch {
                        parameter: loader.parameter,
                        expression: loader.expression,
                        method: ExtractionMethod::Structural,
                        candidates,
                    });
                    return outcome;
                }
            }
        }
        None => {
            debug!("Parse failed, falling back to regex search");
            outcome.parse_failed = true;
        }
    }

    let scan = scan_fallback(source);
    outcome.oversized = scan.oversized;
    for loader in scan.loaders {
        let candidates = mine_candidates(&loader.expression);
        if candidates.is_empty() {
            continue;
        }
        outcome.matches.push(LoaderMatch {
            parameter: loader.parameter,
            expression: loader.expression,
            method: ExtractionMethod::Regex,
            candidates,
        });
    }
    outcome
}
