//! OPA subprocess evaluator.
//!
//! Runs `<bin> eval -f json -d <policy> <query> --stdin-input` once per
//! decision, with the canonical JSON context on stdin. Exit status plus
//! stdout/stderr are the whole contract with the child process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use hel_core::decision::details;
use hel_core::error::{HelError, Result};
use hel_core::{Decision, PolicyContext, Reason};

use super::{resolve_executable, PolicyEvaluator};

pub const DEFAULT_OPA_BIN: &str = "opa";
pub const DEFAULT_QUERY: &str = "data.odin.allow";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON pointer to the first result's first expression value.
const VALUE_POINTER: &str = "/result/0/expressions/0/value";

#[derive(Debug, Clone)]
pub struct OpaEvaluator {
    bin: String,
    policy_path: PathBuf,
    query: String,
    timeout: Duration,
}

impl OpaEvaluator {
    pub fn new(bin: impl Into<String>, policy_path: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            policy_path: policy_path.into(),
            query: DEFAULT_QUERY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }
    pub fn policy_path(&self) -> &Path {
        &self.policy_path
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Command-line arguments after the executable.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "eval".into(),
            "-f".into(),
            "json".into(),
            "-d".into(),
            self.policy_path.clone().into_os_string(),
            self.query.clone().into(),
            "--stdin-input".into(),
        ]
    }

    async fn run(&self, input: Vec<u8>) -> Result<Output> {
        let exe = resolve_executable(&self.bin).unwrap_or_else(|| PathBuf::from(&self.bin));
        let mut child = Command::new(exe)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HelError::Evaluator(format!("spawn {} failed: {e}", self.bin)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| HelError::Internal("evaluator stdin not captured".into()))?;

        // Feed stdin while draining stdout/stderr so a chatty child cannot
        // deadlock on a full pipe. Dropping `stdin` closes it.
        let feed = async move {
            stdin.write_all(&input).await?;
            stdin.flush().await
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());

        let output = output?;
        fed.map_err(|e| HelError::Evaluator(format!("writing input failed: {e}")))?;
        Ok(output)
    }
}

#[async_trait]
impl PolicyEvaluator for OpaEvaluator {
    fn is_available(&self) -> bool {
        resolve_executable(&self.bin).is_some() && self.policy_path.exists()
    }

    async fn evaluate(&self, ctx: &PolicyContext) -> Decision {
        let input = match ctx.to_canonical_json() {
            Ok(b) => b,
            Err(e) => return exception(&e),
        };

        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.run(input)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Err(_) => {
                tracing::warn!(bin = %self.bin, timeout_ms = self.timeout.as_millis() as u64, "evaluator timed out; child killed");
                Decision::deny(
                    Reason::RegoTimeout,
                    details([("timeout_ms", self.timeout.as_millis() as u64)]),
                )
            }
            Ok(Err(e)) => {
                tracing::warn!(bin = %self.bin, error = %e, "evaluator invocation failed");
                exception(&e)
            }
            Ok(Ok(out)) => {
                tracing::debug!(bin = %self.bin, elapsed_ms, status = %out.status, "evaluator finished");
                interpret(out.status.success(), out.status.code(), &out.stdout, &out.stderr)
            }
        }
    }
}

/// Turn a finished evaluator run into a decision.
pub fn interpret(success: bool, code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Decision {
    if !success {
        let mut d = details([("stderr", String::from_utf8_lossy(stderr).into_owned())]);
        d.insert("exit_code".into(), code.map(Value::from).unwrap_or(Value::Null));
        return Decision::deny(Reason::RegoError, d);
    }

    let out: Value = match serde_json::from_slice(stdout) {
        Ok(v) => v,
        Err(e) => return exception(&HelError::Json(e)),
    };

    match out.pointer(VALUE_POINTER) {
        Some(Value::Bool(true)) => Decision::allow(Reason::RegoAllow, Map::new()),
        other => Decision::deny(
            Reason::RegoDeny,
            details([("value", other.cloned().unwrap_or(Value::Null))]),
        ),
    }
}

fn exception(e: &HelError) -> Decision {
    Decision::deny(Reason::RegoException, details([("error", e.to_string())]))
}
