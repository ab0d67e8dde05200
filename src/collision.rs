/// Destination-name collision resolution.
///
/// When a planned destination already exists, a numeric disambiguator is
/// inserted before the extension (`report.pdf` -> `report (1).pdf`) and
/// incremented until a free name is found.
use std::path::{Path, PathBuf};

/// Upper bound on disambiguation attempts for a single destination.
pub const MAX_ATTEMPTS: usize = 10_000;

/// Raised when no free name was found within [`MAX_ATTEMPTS`] candidates.
#[derive(Debug, Clone)]
pub struct CollisionExhausted {
    /// The destination that could not be disambiguated.
    pub path: PathBuf,
}

impl std::fmt::Display for CollisionExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Gave up finding a free name for {} after {} attempts",
            self.path.display(),
            MAX_ATTEMPTS
        )
    }
}

impl std::error::Error for CollisionExhausted {}

/// Returns `desired` if it is free, otherwise the first free variant with a
/// ` (n)` suffix before the extension.
///
/// Existence is re-checked per candidate through the supplied closure, so the
/// result stays correct while earlier moves in the same run mutate the
/// directory.
///
/// # Errors
///
/// Returns [`CollisionExhausted`] once [`MAX_ATTEMPTS`] candidates were taken.
pub fn unique_path(
    desired: &Path,
    mut exists: impl FnMut(&Path) -> bool,
) -> Result<PathBuf, CollisionExhausted> {
    if !exists(desired) {
        return Ok(desired.to_path_buf());
    }

    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = desired.extension().map(|e| e.to_string_lossy().into_owned());

    for n in 1..=MAX_ATTEMPTS {
        let candidate_name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = desired.with_file_name(candidate_name);
        if !exists(&candidate) {
            return Ok(candidate);
        }
    }

    Err(CollisionExhausted {
        path: desired.to_path_buf(),
    })
}
