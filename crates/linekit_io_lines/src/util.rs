use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::spec::{CopyLinesError, EnumCopyFileConflictStrategy};

////////////////////////////////////////////////////////////////////////////////
// #region PathChecks

/// How the destination file is opened once the conflict policy has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnumDestinationOpenMode {
    Truncate,
    Append,
    /// Fails if the file appeared after the conflict check.
    CreateNew,
}

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Reject empty paths, non-file sources and source == destination.
///
/// A missing source is left for the open step, which reports it as an
/// open failure.
pub(crate) fn validate_copy_paths(path_src: &Path, path_dst: &Path) -> Result<(), CopyLinesError> {
    if path_src.as_os_str().is_empty() {
        return Err(CopyLinesError::InvalidPath(
            "Arg `path_src` must not be empty.".to_string(),
        ));
    }
    if path_dst.as_os_str().is_empty() {
        return Err(CopyLinesError::InvalidPath(
            "Arg `path_dst` must not be empty.".to_string(),
        ));
    }

    match fs::metadata(path_src) {
        Ok(meta_src) if !meta_src.is_file() => {
            return Err(CopyLinesError::SourceNotFile(path_src.to_path_buf()));
        }
        _ => {}
    }

    if path_dst.exists()
        && (_normalize_path(path_src) == _normalize_path(path_dst)
            || is_same_file(path_src, path_dst))
    {
        return Err(CopyLinesError::SourceDestinationSame(path_dst.to_path_buf()));
    }
    Ok(())
}

/// Same inode on the same device, which also catches hard links.
#[cfg(unix)]
fn is_same_file(path_src: &Path, path_dst: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(path_src), fs::metadata(path_dst)) {
        (Ok(stat_src), Ok(stat_dst)) => {
            (stat_src.dev(), stat_src.ino()) == (stat_dst.dev(), stat_dst.ino())
        }
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(_path_src: &Path, _path_dst: &Path) -> bool {
    false
}

/// Apply the destination conflict policy.
///
/// Returns `None` when the copy must be skipped.
pub(crate) fn resolve_destination_open_mode(
    path_dst: &Path,
    rule_conflict: EnumCopyFileConflictStrategy,
) -> Result<Option<EnumDestinationOpenMode>, CopyLinesError> {
    if !path_dst.exists() {
        return Ok(Some(match rule_conflict {
            EnumCopyFileConflictStrategy::Append => EnumDestinationOpenMode::Append,
            EnumCopyFileConflictStrategy::Error => EnumDestinationOpenMode::CreateNew,
            _ => EnumDestinationOpenMode::Truncate,
        }));
    }
    if path_dst.is_dir() {
        return Err(CopyLinesError::DestinationIsDirectory(path_dst.to_path_buf()));
    }

    match rule_conflict {
        EnumCopyFileConflictStrategy::Skip => Ok(None),
        EnumCopyFileConflictStrategy::Error => {
            Err(CopyLinesError::DestinationExists(path_dst.to_path_buf()))
        }
        EnumCopyFileConflictStrategy::Overwrite => Ok(Some(EnumDestinationOpenMode::Truncate)),
        EnumCopyFileConflictStrategy::Append => Ok(Some(EnumDestinationOpenMode::Append)),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Metadata

/// Copy permissions and timestamps (plus xattrs on Linux) from source to
/// destination. Failures are appended to `warnings`.
pub(crate) fn preserve_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    warnings: &mut Vec<String>,
) {
    if let Err(e) = apply_metadata(path_file_src, path_file_dst) {
        warnings.push(format!(
            "Failed to preserve metadata on {} ({e})",
            path_file_dst.display()
        ));
        return;
    }

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst, warnings);
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(
    path_file_src: &Path,
    path_file_dst: &Path,
    warnings: &mut Vec<String>,
) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        // Filesystem without xattr support.
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        if let Err(e) = xattr::set(path_file_dst, &name, &raw_value) {
            warnings.push(format!(
                "Failed to copy xattr {} to {} ({e})",
                name.to_string_lossy(),
                path_file_dst.display()
            ));
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
