//! `linekit_io_lines` v1:
//! Rust-side line copy engine with scoped handle release.
//!
//! Architecture:
//! - `copy`     : copy loop and path-level entry points
//! - `scope`    : guard tying handle release to scope exit
//! - `stream`   : source/destination handle traits and implementations
//! - `progress` : per-line progress side channel
//! - `spec`     : enums/options/errors
//! - `report`   : run-time report model
//! - `util`     : path checks, conflict policy, metadata helpers

pub mod copy;
pub mod progress;
pub mod report;
pub mod scope;
pub mod spec;
pub mod stream;
mod util;

#[cfg(test)]
mod testing;

pub use copy::{
    LineCopier, copy_file_lines, copy_file_lines_with_progress, copy_lines, open_file_destination,
    report_skipped,
};
pub use progress::{ProgressLines, ProgressMarkers, ProgressSilent, progress_from_options};
pub use report::{ReportLineCopy, ReportLineCopyBuilder};
pub use scope::HandleGuard;
pub use spec::{
    CopyLinesError, EnumCopyFailureKind, EnumCopyFileConflictStrategy, EnumCopyState,
    EnumLineTerminator, EnumStreamRole, SpecLineCopyOptions,
};
pub use stream::{
    DestinationStream, FileDestination, FileSource, ReaderSource, SourceStream, StreamHandle,
    WriterDestination,
};
