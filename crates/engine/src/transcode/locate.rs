use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::TranscodeError;

/// Resolves the encoder executable.
///
/// A program containing a path separator is checked as given; a bare name is
/// searched on `PATH`.
pub fn locate_encoder(program: &Path) -> Result<PathBuf, TranscodeError> {
    let not_found = || TranscodeError::EncoderNotFound {
        program: program.to_path_buf(),
    };

    if program.components().count() > 1 || program.is_absolute() {
        return if is_executable(program) {
            Ok(program.to_path_buf())
        } else {
            Err(not_found())
        };
    }

    let search_path = env::var_os("PATH").ok_or_else(not_found)?;
    for dir in env::split_paths(&search_path) {
        for candidate in candidates(&dir, program) {
            if is_executable(&candidate) {
                debug!(encoder = %candidate.display(), "Encoder located");
                return Ok(candidate);
            }
        }
    }
    Err(not_found())
}

fn candidates(dir: &Path, program: &Path) -> Vec<PathBuf> {
    let plain = dir.join(program);
    if cfg!(windows) && program.extension().is_none() {
        vec![plain.with_extension("exe"), plain]
    } else {
        vec![plain]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
