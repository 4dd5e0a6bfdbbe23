//! Sandboxed loader evaluation.
//!
//! A recovered loader expression is wrapped into a one-parameter function and
//! called once per candidate id inside a QuickJS context that has no host
//! bindings: no file system, no network, no timers. Every call runs under a
//! wall-clock deadline enforced by the runtime's interrupt handler, and the
//! runtime carries memory and stack caps.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use log::{debug, trace};
use regex::Regex;
use rquickjs::{Context, Ctx, Runtime, Value};

use crate::config::{MAX_JS_EXECUTION_TIME_MS, MAX_JS_MEMORY_LIMIT, MAX_JS_STACK_SIZE};
use crate::error_handling::SandboxError;
use crate::extract::CandidateId;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*$").expect("identifier regex is valid")
});

/// Global the synthesized loader is installed under.
const RESOLVER_NAME: &str = "__resolve_chunk";

/// Deadline value meaning "no call in flight".
const NO_DEADLINE: u64 = u64::MAX;

/// File names produced by one loader.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub names: BTreeSet<String>,
    /// Calls that threw or ran past the deadline
    pub failed_calls: usize,
}

/// One QuickJS runtime, used for the loaders of a single file and dropped
/// afterwards.
pub struct LoaderSandbox {
    context: Context,
    started: Instant,
    /// Milliseconds since `started` after which the running call is interrupted
    deadline_ms: Arc<AtomicU64>,
    call_timeout: Duration,
}

impl LoaderSandbox {
    pub fn new() -> Result<Self, SandboxError> {
        Self::with_call_timeout(Duration::from_millis(MAX_JS_EXECUTION_TIME_MS))
    }

    pub fn with_call_timeout(call_timeout: Duration) -> Result<Self, SandboxError> {
        let runtime = Runtime::new().map_err(|e| SandboxError::Runtime(e.to_string()))?;
        runtime.set_memory_limit(MAX_JS_MEMORY_LIMIT);
        runtime.set_max_stack_size(MAX_JS_STACK_SIZE);

        let started = Instant::now();
        let deadline_ms = Arc::new(AtomicU64::new(NO_DEADLINE));
        let handler_deadline = Arc::clone(&deadline_ms);
        runtime.set_interrupt_handler(Some(Box::new(move || {
            let now = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            now > handler_deadline.load(Ordering::Relaxed)
        })));

        let context = Context::full(&runtime).map_err(|e| SandboxError::Runtime(e.to_string()))?;
        Ok(Self {
            context,
            started,
            deadline_ms,
            call_timeout,
        })
    }

    /// Installs `function(<parameter>) { return (<expression>); }` and calls it
    /// with each candidate.
    ///
    /// Keeps string results that are non-empty and do not contain
    /// `undefined`. A throwing or interrupted call is counted and skipped.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `parameter` is not a plain identifier, `Install`
    /// if the synthesized function does not compile.
    pub fn resolve(
        &self,
        parameter: &str,
        expression: &str,
        candidates: &[CandidateId],
    ) -> Result<Resolution, SandboxError> {
        if !IDENTIFIER_RE.is_match(parameter) {
            return Err(SandboxError::InvalidParameter(parameter.to_string()));
        }
        let install = format!(
            "globalThis.{RESOLVER_NAME} = function({parameter}) {{ return (\n{expression}\n); }};"
        );

        self.context.with(|ctx| {
            self.arm_deadline();
            let installed = ctx.eval::<Value, _>(install.as_str());
            self.disarm_deadline();
            if let Err(e) = installed {
                return Err(SandboxError::Install(exception_message(&ctx, e)));
            }

            let mut resolution = Resolution::default();
            for candidate in candidates {
                let call = format!("{RESOLVER_NAME}({})", js_literal(candidate));
                self.arm_deadline();
                let result = ctx.eval::<Value, _>(call.as_str());
                self.disarm_deadline();

                match result {
                    Ok(value) => {
                        if let Some(name) = accepted_name(&value) {
                            trace!("Candidate {candidate} resolved to {name}");
                            resolution.names.insert(name);
                        }
                    }
                    Err(e) => {
                        let message = exception_message(&ctx, e);
                        debug!("Loader call for candidate {candidate} failed: {message}");
                        resolution.failed_calls += 1;
                    }
                }
            }
            Ok(resolution)
        })
    }

    fn arm_deadline(&self) {
        let now = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let timeout = u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX);
        self.deadline_ms
            .store(now.saturating_add(timeout), Ordering::Relaxed);
    }

    fn disarm_deadline(&self) {
        self.deadline_ms.store(NO_DEADLINE, Ordering::Relaxed);
    }
}

/// Source literal for a candidate id.
fn js_literal(candidate: &CandidateId) -> String {
    match candidate {
        CandidateId::Number(n) => n.to_string(),
        CandidateId::Name(s) => serde_json::Value::String(s.clone()).to_string(),
    }
}

fn accepted_name(value: &Value<'_>) -> Option<String> {
    let name = value.as_string()?.to_string().ok()?;
    (!name.is_empty() && !name.contains("undefined")).then_some(name)
}

/// Takes the pending exception (clearing it) and renders a message.
fn exception_message(ctx: &Ctx<'_>, error: rquickjs::Error) -> String {
    if !error.is_exception() {
        return error.to_string();
    }
    let exception = ctx.catch();
    exception
        .as_exception()
        .and_then(|e| e.message())
        .unwrap_or_else(|| error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(keys: &[i64]) -> Vec<CandidateId> {
        keys.iter().map(|k| CandidateId::Number(*k)).collect()
    }

    #[test]
    fn test_resolves_each_candidate() {
        let sandbox = LoaderSandbox::new().unwrap();
        let resolution = sandbox
            .resolve("e", r#"{0:"a",1:"b"}[e] + ".js""#, &ids(&[0, 1]))
            .unwrap();
        let names: Vec<&str> = resolution.names.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["a.js", "b.js"]);
        assert_eq!(resolution.failed_calls, 0);
    }

    #[test]
    fn test_string_candidates_and_duplicates() {
        let sandbox = LoaderSandbox::new().unwrap();
        let candidates = vec![
            CandidateId::Name("vendors~main".to_string()),
            CandidateId::Name("it's".to_string()),
        ];
        let resolution = sandbox
            .resolve("c", r#""js/" + ({"vendors~main":"v"}[c] || "v") + ".js""#, &candidates)
            .unwrap();
        assert_eq!(resolution.names.len(), 1);
        assert!(resolution.names.contains("js/v.js"));
    }

    #[test]
    fn test_undefined_results_are_dropped() {
        let sandbox = LoaderSandbox::new().unwrap();
        let resolution = sandbox
            .resolve("e", r#"{0:"a"}[e] + ".js""#, &ids(&[0, 7]))
            .unwrap();
        assert_eq!(resolution.names.len(), 1);
        assert!(resolution.names.contains("a.js"));
    }

    #[test]
    fn test_throwing_candidate_does_not_stop_others() {
        let sandbox = LoaderSandbox::new().unwrap();
        let expression = r#"(e === 1 ? null.boom : {0:"a",2:"c"}[e]) + ".js""#;
        let resolution = sandbox.resolve("e", expression, &ids(&[0, 1, 2])).unwrap();
        assert_eq!(resolution.failed_calls, 1);
        assert!(resolution.names.contains("a.js"));
        assert!(resolution.names.contains("c.js"));
    }

    #[test]
    fn test_runaway_call_is_interrupted() {
        let sandbox = LoaderSandbox::with_call_timeout(Duration::from_millis(100)).unwrap();
        let expression = r#"(e === 0 ? (function(){ while (true) {} })() : "ok") + ".js""#;
        let started = Instant::now();
        let resolution = sandbox.resolve("e", expression, &ids(&[0, 1])).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(resolution.failed_calls, 1);
        assert!(resolution.names.contains("ok.js"));
    }

    #[test]
    fn test_no_host_bindings() {
        let sandbox = LoaderSandbox::new().unwrap();
        let expression = r#"(typeof require + typeof process + typeof fetch) + e + ".js""#;
        let resolution = sandbox
            .resolve("e", expression, &[CandidateId::Name("x".to_string())])
            .unwrap();
        // typeof yields "undefined" for all three, so the result is filtered out
        assert!(resolution.names.is_empty());
        assert_eq!(resolution.failed_calls, 0);
    }

    #[test]
    fn test_rejects_non_identifier_parameter() {
        let sandbox = LoaderSandbox::new().unwrap();
        let err = sandbox
            .resolve("e){evil()}//", r#"e + ".js""#, &ids(&[0]))
            .unwrap_err();
        assert!(matches!(err, SandboxError::InvalidParameter(_)));
    }

    #[test]
    fn test_install_error_for_broken_expression() {
        let sandbox = LoaderSandbox::new().unwrap();
        let err = sandbox.resolve("e", r#"{0:"a"[e] + ".js""#, &ids(&[0])).unwrap_err();
        assert!(matches!(err, SandboxError::Install(_)));
    }

    #[test]
    fn test_sandbox_reusable_across_loaders() {
        let sandbox = LoaderSandbox::new().unwrap();
        let first = sandbox.resolve("e", r#"e + ".a.js""#, &ids(&[1])).unwrap();
        let second = sandbox.resolve("t", r#"t + ".b.js""#, &ids(&[1])).unwrap();
        assert!(first.names.contains("1.a.js"));
        assert!(second.names.contains("1.b.js"));
    }
}
