//! Per-file analysis: loader extraction followed by sandboxed resolution.
//!
//! Runs synchronously; the pipeline drives it on a blocking thread, one file
//! at a time.

use log::{debug, warn};

use crate::error_handling::SandboxError;
use crate::extract::{extract_loaders, LoaderMatch};
use crate::sandbox::{LoaderSandbox, Resolution};

/// A loader and what the sandbox made of it.
#[derive(Debug)]
pub(crate) struct ResolvedLoader {
    pub(crate) loader: LoaderMatch,
    pub(crate) resolution: Result<Resolution, SandboxError>,
}

#[derive(Debug, Default)]
pub(crate) struct FileAnalysis {
    pub(crate) loaders: Vec<ResolvedLoader>,
    pub(crate) parse_failed: bool,
    pub(crate) oversized: usize,
}

/// Extracts the loaders of one file and evaluates each against its
/// candidates in a sandbox dedicated to this file.
pub(crate) fn analyze_source(label: &str, source: &str) -> FileAnalysis {
    let outcome = extract_loaders(source);
    let mut analysis = FileAnalysis {
        loaders: Vec::with_capacity(outcome.matches.len()),
        parse_failed: outcome.parse_failed,
        oversized: outcome.oversized,
    };
    if outcome.matches.is_empty() {
        debug!("No chunk loader in {label}");
        return analysis;
    }

    let sandbox = match LoaderSandbox::new() {
        Ok(sandbox) => sandbox,
        Err(e) => {
            warn!("Cannot evaluate loaders of {label}: {e}");
            analysis.loaders = outcome
                .matches
                .into_iter()
                .map(|loader| ResolvedLoader {
                    loader,
                    resolution: Err(SandboxError::Runtime(e.to_string())),
                })
                .collect();
            return analysis;
        }
    };

    for loader in outcome.matches {
        let resolution = sandbox.resolve(&loader.parameter, &loader.expression, &loader.candidates);
        if let Ok(resolution) = &resolution {
            debug!(
                "{label}: {} loader resolved {} of {} candidates",
                loader.method,
                resolution.names.len(),
                loader.candidates.len()
            );
        }
        analysis.loaders.push(ResolvedLoader { loader, resolution });
    }
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ExtractionMethod;

    #[test]
    fn test_analyze_resolves_structural_loader() {
        let source = r#"__x.p="/static/";__x.u=function(e){return {0:"a",1:"b"}[e]+".js"};"#;
        let analysis = analyze_source("root.js", source);
        assert_eq!(analysis.loaders.len(), 1);
        let resolved = &analysis.loaders[0];
        assert_eq!(resolved.loader.method, ExtractionMethod::Structural);
        let names = resolved.resolution.as_ref().unwrap().names.clone();
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["a.js".to_string(), "b.js".to_string()]
        );
    }

    #[test]
    fn test_analyze_file_without_loader() {
        let analysis = analyze_source("plain.js", "var x = 1;");
        assert!(analysis.loaders.is_empty());
        assert!(!analysis.parse_failed);
    }

    #[test]
    fn test_analyze_reports_install_failure_per_loader() {
        // Captured by the fallback but not a valid expression once re-quoted
        let source = r#"document.createElement("script"); s.src = n.p + "" + {0:"a"[e] + ".js";"#;
        let analysis = analyze_source("broken.js", source);
        assert_eq!(analysis.loaders.len(), 1);
        assert!(analysis.loaders[0].resolution.is_err());
    }
}
