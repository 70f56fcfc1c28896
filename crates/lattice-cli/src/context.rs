//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds all the state a command handler needs:
//! resolved database path and the global output flags.

use std::path::PathBuf;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Resolved database file path, from `--db` (clap already falls back
    /// to the `LATTICE_DB` env var via the `env` attribute on the flag).
    pub db_path: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            db_path: global.db.as_ref().map(PathBuf::from),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// Returns the resolved database path, or an error message if none was
    /// supplied by flag or by the `LATTICE_DB` environment variable.
    pub fn require_db_path(&self) -> Result<&PathBuf, anyhow::Error> {
        self.db_path
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no database path given: pass --db or set LATTICE_DB"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_global_args_resolves_db_path() {
        let global = GlobalArgs {
            db: Some("/tmp/lattice.db".to_string()),
            json: false,
            verbose: false,
            quiet: false,
        };
        let ctx = RuntimeContext::from_global_args(&global);
        assert_eq!(ctx.db_path, Some(PathBuf::from("/tmp/lattice.db")));
    }

    #[test]
    fn require_db_path_errors_when_absent() {
        let global = GlobalArgs {
            db: None,
            json: false,
            verbose: false,
            quiet: false,
        };
        let ctx = RuntimeContext::from_global_args(&global);
        assert!(ctx.require_db_path().is_err());
    }
}
