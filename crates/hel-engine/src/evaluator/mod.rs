//! Delegated policy evaluation.
//!
//! An evaluator is the authoritative second tier: when it reports itself
//! available, its decision replaces the allowlist baseline. Availability is
//! checked on every call and never cached.

pub mod opa;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use hel_core::{Decision, PolicyContext};

pub use opa::{OpaEvaluator, DEFAULT_OPA_BIN, DEFAULT_QUERY};

/// Port for out-of-process (or fake) policy evaluation.
///
/// `evaluate` must be total: every failure is expressed as a deny decision.
#[async_trait]
pub trait PolicyEvaluator: Send + Sync {
    fn is_available(&self) -> bool;
    async fn evaluate(&self, ctx: &PolicyContext) -> Decision;
}

/// Locate `bin` the way a shell would.
///
/// A name containing a path separator is taken as a path; a bare name is
/// searched on `PATH`. On Windows a name without an extension also tries
/// each `PATHEXT` suffix (`opa` finds `opa.exe`).
pub fn resolve_executable(bin: &str) -> Option<PathBuf> {
    if bin.is_empty() {
        return None;
    }
    let candidate = Path::new(bin);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        return with_exe_suffixes(candidate).find(|p| is_executable(p));
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| with_exe_suffixes(&dir.join(bin)))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn with_exe_suffixes(p: &Path) -> impl Iterator<Item = PathBuf> {
    std::iter::once(p.to_path_buf())
}

#[cfg(not(unix))]
fn with_exe_suffixes(p: &Path) -> impl Iterator<Item = PathBuf> {
    let mut out = vec![p.to_path_buf()];
    if p.extension().is_none() {
        let exts = std::env::var("PATHEXT").unwrap_or_else(|_| DEFAULT_PATHEXT.to_string());
        out.extend(
            exts.split(';')
                .filter(|e| !e.is_empty())
                .map(|e| p.with_extension(e.trim_start_matches('.'))),
        );
    }
    out.into_iter()
}

#[cfg(not(unix))]
const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

#[cfg(unix)]
fn is_executable(p: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(p)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(p: &Path) -> bool {
    p.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_missing_names_do_not_resolve() {
        assert!(resolve_executable("").is_none());
        assert!(resolve_executable("definitely-not-an-evaluator-binary-4f1c").is_none());
        assert!(resolve_executable("/nonexistent/dir/opa").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn sh_resolves_from_path() {
        assert!(resolve_executable("sh").is_some());
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_file_is_not_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("opa");
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        assert!(resolve_executable(path.to_str().unwrap()).is_none());
    }

    #[cfg(windows)]
    #[test]
    fn bare_name_resolves_through_pathext() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("opa.exe"), b"MZ").unwrap();
        let bare = dir.path().join("opa");
        let found = resolve_executable(bare.to_str().unwrap()).unwrap();
        let ext = found.extension().and_then(|e| e.to_str()).unwrap();
        assert!(ext.eq_ignore_ascii_case("exe"));
        assert!(resolve_executable(dir.path().join("missing").to_str().unwrap()).is_none());
    }
}
