//! Line-copy options, enums and top-level error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFileConflictStrategy {
    /// Keep destination file and skip the copy entirely.
    Skip,
    /// Truncate destination file and write source lines into it.
    Overwrite,
    /// Keep destination content and append source lines after it.
    Append,
    /// Fail with [`CopyLinesError::DestinationExists`].
    Error,
}

/// Line terminator written after every destination line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLineTerminator {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
    /// Platform convention (`\r\n` on Windows, `\n` elsewhere).
    Native,
}

impl EnumLineTerminator {
    /// Terminator text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
        }
    }
}

/// Which of the two handles an error or release refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStreamRole {
    Source,
    Destination,
}

impl fmt::Display for EnumStreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

/// Lifecycle of a single copy run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnumCopyState {
    #[default]
    NotStarted,
    Copying,
    Completed,
    Failed,
}

impl EnumCopyState {
    /// `Completed` and `Failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Coarse failure category, used for exit codes and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFailureKind {
    /// Input validation or conflict policy rejected the call.
    Setup,
    Open,
    Read,
    Write,
    Release,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `copy_lines` and `copy_file_lines`.
#[derive(Debug, Clone)]
pub struct SpecLineCopyOptions {
    /// Conflict behavior for an existing destination file.
    pub rule_conflict_file: EnumCopyFileConflictStrategy,
    /// Terminator used for file destinations opened by `copy_file_lines`.
    pub rule_line_terminator: EnumLineTerminator,
    /// Copy permissions, timestamps and xattrs onto the destination after success.
    pub if_preserve_metadata: bool,
    /// Emit per-line progress markers.
    pub if_progress: bool,
    /// Per-line progress marker.
    pub char_progress_marker: char,
    /// Completion indicator printed once after the last marker.
    pub text_progress_done: String,
}

impl Default for SpecLineCopyOptions {
    fn default() -> Self {
        Self {
            rule_conflict_file: EnumCopyFileConflictStrategy::Overwrite,
            rule_line_terminator: EnumLineTerminator::Native,
            if_preserve_metadata: false,
            if_progress: true,
            char_progress_marker: '.',
            text_progress_done: "done!".to_string(),
        }
    }
}

/// Failure of one copy call.
///
/// `Open`, `Read`, `Write` and `Release` carry the underlying [`io::Error`] as
/// their source. Release failures hit while cleaning up after an earlier
/// failure are attached through [`CopyLinesError::WithSuppressed`].
#[derive(Debug, Error)]
pub enum CopyLinesError {
    /// Empty or otherwise unusable path argument.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Source path exists but is not a regular file.
    #[error("Source is not a regular file: {}", .0.display())]
    SourceNotFile(PathBuf),

    /// Source and destination resolve to the same file.
    #[error("Source and destination are the same file: {}", .0.display())]
    SourceDestinationSame(PathBuf),

    /// Destination exists and the conflict policy is `Error`.
    #[error("Destination exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Destination path is a directory.
    #[error("Destination is a directory: {}", .0.display())]
    DestinationIsDirectory(PathBuf),

    /// Source or destination cannot be acquired.
    #[error("Failed to open {role} {}", .path.display())]
    Open {
        role: EnumStreamRole,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while fetching line `n_line` (1-based) from the source.
    #[error("Failed to read line {n_line} from source")]
    Read {
        n_line: u64,
        #[source]
        source: io::Error,
    },

    /// I/O error while writing line `n_line` (1-based) to the destination.
    #[error("Failed to write line {n_line} to destination")]
    Write {
        n_line: u64,
        #[source]
        source: io::Error,
    },

    /// I/O error while releasing a handle.
    #[error("Failed to release {role}")]
    Release {
        role: EnumStreamRole,
        #[source]
        source: io::Error,
    },

    /// First failure plus release failures collected during cleanup.
    #[error("{primary} ({} suppressed release failure(s))", .suppressed.len())]
    WithSuppressed {
        #[source]
        primary: Box<CopyLinesError>,
        suppressed: Vec<CopyLinesError>,
    },
}

impl CopyLinesError {
    /// Category of the primary failure.
    pub fn kind(&self) -> EnumCopyFailureKind {
        match self {
            Self::InvalidPath(_)
            | Self::SourceNotFile(_)
            | Self::SourceDestinationSame(_)
            | Self::DestinationExists(_)
            | Self::DestinationIsDirectory(_) => EnumCopyFailureKind::Setup,
            Self::Open { .. } => EnumCopyFailureKind::Open,
            Self::Read { .. } => EnumCopyFailureKind::Read,
            Self::Write { .. } => EnumCopyFailureKind::Write,
            Self::Release { .. } => EnumCopyFailureKind::Release,
            Self::WithSuppressed { primary, .. } => primary.kind(),
        }
    }

    /// The failure that aborted the copy.
    pub fn primary(&self) -> &CopyLinesError {
        match self {
            Self::WithSuppressed { primary, .. } => primary,
            _ => self,
        }
    }

    /// Release failures collected after the primary failure.
    pub fn suppressed(&self) -> &[CopyLinesError] {
        match self {
            Self::WithSuppressed { suppressed, .. } => suppressed,
            _ => &[],
        }
    }

    /// Attach cleanup failures; returns `self` unchanged when there are none.
    pub(crate) fn with_suppressed(self, l_suppressed: Vec<CopyLinesError>) -> Self {
        if l_suppressed.is_empty() {
            return self;
        }
        match self {
            Self::WithSuppressed {
                primary,
                mut suppressed,
            } => {
                suppressed.extend(l_suppressed);
                Self::WithSuppressed {
                    primary,
                    suppressed,
                }
            }
            other => Self::WithSuppressed {
                primary: Box::new(other),
                suppressed: l_suppressed,
            },
        }
    }

    /// Error text with the full `source()` chain and any suppressed failures.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self.primary());

        let mut source = std::error::Error::source(self.primary());
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {depth}: {err}"));
            source = err.source();
            depth += 1;
        }

        for err_suppressed in self.suppressed() {
            output.push_str(&format!("\nSuppressed:\n  {err_suppressed}"));
            if let Some(err) = std::error::Error::source(err_suppressed) {
                output.push_str(&format!(": {err}"));
            }
        }

        output
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
