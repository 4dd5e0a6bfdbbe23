//! Regex fallback for loaders the structural search misses.
//!
//! Targets the classic JSONP loader, which builds a `<script>` element and
//! sets its `src` to `X.p + "<...>.js"`.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::config::MAX_FALLBACK_SNIPPET_CHARS;

static CREATE_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"createElement\(\s*["']script["']\s*\)"#).expect("createElement regex is valid")
});

static DOUBLE_QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\w$]\.p\s*\+\s*"(.*?)\.js""#).expect("double-quoted loader regex is valid")
});

static SINGLE_QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\w$]\.p\s*\+\s*'(.*?)\.js'"#).expect("single-quoted loader regex is valid")
});

static PARAMETER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([A-Za-z_$][\w$]*)\]").expect("parameter regex is valid")
});

/// A loader expression recovered by the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLoader {
    pub parameter: String,
    /// The capture re-quoted into a single string expression
    pub expression: String,
}

/// Result of the regex scan.
#[derive(Debug, Default)]
pub struct FallbackScan {
    pub loaders: Vec<FallbackLoader>,
    /// Captures discarded for exceeding the size threshold
    pub oversized: usize,
}

/// Scans raw text for `X.p + "<...>.js"` concatenations next to a
/// `createElement("script")` idiom.
///
/// Captures of `MAX_FALLBACK_SNIPPET_CHARS` characters or more are discarded
/// and never reach the sandbox.
pub fn scan_fallback(source: &str) -> FallbackScan {
    let mut scan = FallbackScan::default();
    if !CREATE_SCRIPT_RE.is_match(source) {
        return scan;
    }

    let quoted = DOUBLE_QUOTED_RE
        .captures_iter(source)
        .map(|c| ('"', c))
        .chain(SINGLE_QUOTED_RE.captures_iter(source).map(|c| ('\'', c)));

    for (quote, caps) in quoted {
        let Some(body) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        if body.chars().count() >= MAX_FALLBACK_SNIPPET_CHARS {
            debug!(
                "Discarding oversized loader capture ({} chars)",
                body.chars().count()
            );
            scan.oversized += 1;
            continue;
        }

        let expression = format!("{quote}{body}.js{quote}");
        let Some(parameter) = PARAMETER_RE
            .captures(&expression)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };

        if scan.loaders.iter().any(|l| l.expression == expression) {
            continue;
        }
        scan.loaders.push(FallbackLoader {
            parameter,
            expression,
        });
    }
    scan
}
