//! quill-drv - Interpreter Driver
//!
//! Orchestrates one run of the pipeline: read the source file, parse it
//! into a fresh arena, report any diagnostics, evaluate, report again, and
//! map the outcome to an exit code. Diagnostics are printed to stderr as
//! `<offset>: <level>: <message>` lines; the program's own output goes to
//! stdout through the `print` intrinsic.

use std::fs;
use std::path::{Path, PathBuf};

use quill_eval::{Interp, Status};
use quill_par::{Context, Parser};
use quill_util::Handler;
use thiserror::Error;

/// Errors of the driver itself, as opposed to diagnostics of the program
/// being run.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The source file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// The path that failed to open.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },
}

/// Runs the source file at `path` and returns the process exit code.
pub fn run_file(path: &Path) -> Result<i32, DriveError> {
    let source = fs::read_to_string(path).map_err(|source| DriveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(run_source(&source))
}

/// Parses and evaluates `source`, reporting diagnostics on stderr.
/// Returns 0 on success, 1 when any error was reported.
pub fn run_source(source: &str) -> i32 {
    let handler = Handler::new();
    let mut context = Context::new(source);
    let decls = Parser::new(&mut context, &handler).parse();

    // A program that failed to parse is not evaluated; the error nodes in
    // its tree have no runtime meaning.
    if handler.has_errors() {
        report(&handler);
        return 1;
    }

    let status = Interp::new(&handler).eval_program(&context, &decls);
    report(&handler);

    if status == Status::Ok && !handler.has_errors() {
        0
    } else {
        1
    }
}

/// Prints every collected diagnostic to stderr.
fn report(handler: &Handler) {
    for diagnostic in handler.diagnostics() {
        eprintln!(
            "{}: {}: {}",
            diagnostic.span.start, diagnostic.level, diagnostic.message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_source_success() {
        assert_eq!(run_source("print(1)"), 0);
    }

    #[test]
    fn test_run_source_parse_error() {
        assert_eq!(run_source("var = "), 1);
    }

    #[test]
    fn test_run_source_runtime_error() {
        assert_eq!(run_source("print(missing)"), 1);
    }

    #[test]
    fn test_run_file_missing() {
        let result = run_file(Path::new("definitely/not/a/real/path.ql"));
        assert!(matches!(result, Err(DriveError::Io { .. })));
    }
}
