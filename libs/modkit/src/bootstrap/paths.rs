use std::path::{Path, PathBuf};

/// Errors for resolving the home directory
#[derive(Debug, thiserror::Error)]
pub enum HomeDirError {
    #[error("user home directory could not be determined")]
    HomeMissing,
    #[error("home_dir is not valid UTF-8: {0}")]
    NonUtf8(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default home directory: `~/.beacon`.
///
/// # Errors
/// Returns `HomeDirError::HomeMissing` if the user home cannot be resolved.
pub fn default_home_dir() -> Result<PathBuf, HomeDirError> {
    dirs::home_dir()
        .map(|h| h.join(".beacon"))
        .ok_or(HomeDirError::HomeMissing)
}

/// Expand a leading `~` to the user home directory.
///
/// `~user` forms are not supported and are returned unchanged.
///
/// # Errors
/// Returns `HomeDirError::HomeMissing` if expansion is needed but the home is unknown.
pub fn expand_tilde(raw: &str) -> Result<PathBuf, HomeDirError> {
    if raw == "~" {
        return dirs::home_dir().ok_or(HomeDirError::HomeMissing);
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(HomeDirError::HomeMissing)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Expand `~`, make the path absolute against the current directory and create it.
///
/// # Errors
/// Returns an error if expansion fails or the directory cannot be created.
pub fn normalize_home_dir(raw: &Path) -> Result<PathBuf, HomeDirError> {
    let raw = raw
        .to_str()
        .ok_or_else(|| HomeDirError::NonUtf8(raw.to_string_lossy().into_owned()))?;
    let expanded = expand_tilde(raw)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()?.join(expanded)
    };
    std::fs::create_dir_all(&absolute)?;
    Ok(absolute)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_tilde("/srv/beacon").unwrap(), PathBuf::from("/srv/beacon"));
        assert_eq!(expand_tilde("~other/x").unwrap(), PathBuf::from("~other/x"));
    }

    #[test]
    fn tilde_is_expanded_when_home_is_known() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~").unwrap(), home);
            assert_eq!(expand_tilde("~/.beacon").unwrap(), home.join(".beacon"));
        }
    }

    #[test]
    fn normalize_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("home");

        let resolved = normalize_home_dir(&target).unwrap();

        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
    }
}
