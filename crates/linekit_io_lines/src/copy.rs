//! Line copy orchestration with scoped release of both handles.

use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::progress::{ProgressLines, ProgressSilent, progress_from_options};
use crate::report::{ReportLineCopy, ReportLineCopyBuilder};
use crate::scope::HandleGuard;
use crate::spec::{
    CopyLinesError, EnumCopyState, EnumLineTerminator, EnumStreamRole, SpecLineCopyOptions,
};
use crate::stream::{DestinationStream, FileDestination, FileSource, SourceStream};
use crate::util::{
    EnumDestinationOpenMode, preserve_metadata, resolve_destination_open_mode,
    validate_copy_paths,
};

#[derive(Debug, Default)]
struct SpecLineCopyContext {
    enum_state: EnumCopyState,
    builder_report: ReportLineCopyBuilder,
    buf_line: String,
    buf_record: String,
}

impl SpecLineCopyContext {
    fn transition(&mut self, enum_state_next: EnumCopyState) {
        debug_assert!(!self.enum_state.is_terminal());
        debug!(from = ?self.enum_state, to = ?enum_state_next, "copy state");
        self.enum_state = enum_state_next;
    }
}

/// Copies lines from one source to one destination, releasing both.
///
/// Stateless across calls; `P` receives the progress events of every run.
#[derive(Debug)]
pub struct LineCopier<P: ProgressLines> {
    progress: P,
}

impl LineCopier<ProgressSilent> {
    pub fn new() -> Self {
        Self {
            progress: ProgressSilent,
        }
    }
}

impl Default for LineCopier<ProgressSilent> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProgressLines> LineCopier<P> {
    pub fn with_progress(progress: P) -> Self {
        Self { progress }
    }

    pub fn into_progress(self) -> P {
        self.progress
    }

    /// Copy every line of `source` into `destination`.
    ///
    /// Both handles are owned by this call and released exactly once before
    /// it returns, destination first. The first read or write failure aborts
    /// the loop; release failures hit afterwards are attached to it as
    /// suppressed errors. When the loop succeeds but a release fails, that
    /// release failure is returned instead.
    ///
    /// A panic inside the loop still releases both handles while unwinding.
    pub fn copy<S, D>(
        &mut self,
        source: S,
        destination: D,
    ) -> Result<ReportLineCopy, CopyLinesError>
    where
        S: SourceStream,
        D: DestinationStream,
    {
        let mut guard_src = HandleGuard::new(source, EnumStreamRole::Source);
        let mut guard_dst = HandleGuard::new(destination, EnumStreamRole::Destination);

        let mut spec_cp_ctx = SpecLineCopyContext::default();
        spec_cp_ctx.transition(EnumCopyState::Copying);

        let res_pump = pump_lines(
            &mut *guard_src,
            &mut *guard_dst,
            &mut self.progress,
            &mut spec_cp_ctx,
        );

        // Both releases are attempted whatever the other one returns.
        let res_release_dst = guard_dst.release();
        let res_release_src = guard_src.release();
        let l_errors_release: Vec<CopyLinesError> = [res_release_dst, res_release_src]
            .into_iter()
            .filter_map(Result::err)
            .collect();

        match res_pump {
            Ok(()) => {
                let mut iter_errors = l_errors_release.into_iter();
                if let Some(err_release) = iter_errors.next() {
                    spec_cp_ctx.transition(EnumCopyState::Failed);
                    return Err(err_release.with_suppressed(iter_errors.collect()));
                }

                spec_cp_ctx.transition(EnumCopyState::Completed);
                let report = spec_cp_ctx.builder_report.build();
                self.progress.on_done(&report);
                info!(
                    cnt_lines = report.cnt_lines_written,
                    cnt_bytes = report.cnt_bytes_written,
                    "line copy completed"
                );
                Ok(report)
            }
            Err(err) => {
                spec_cp_ctx.transition(EnumCopyState::Failed);
                for err_release in &l_errors_release {
                    warn!(
                        error = %err,
                        suppressed = %err_release,
                        "release failed after copy failure"
                    );
                }
                Err(err.with_suppressed(l_errors_release))
            }
        }
    }
}

fn pump_lines<S, D, P>(
    source: &mut S,
    destination: &mut D,
    progress: &mut P,
    spec_cp_ctx: &mut SpecLineCopyContext,
) -> Result<(), CopyLinesError>
where
    S: SourceStream,
    D: DestinationStream,
    P: ProgressLines,
{
    loop {
        let n_line = spec_cp_ctx.builder_report.cnt_lines_read + 1;
        let b_has_line = source
            .read_line(&mut spec_cp_ctx.buf_line)
            .map_err(|e| CopyLinesError::Read {
                n_line,
                source: e,
            })?;
        if !b_has_line {
            return Ok(());
        }
        spec_cp_ctx.builder_report.add_read();

        // Line and terminator go out in one write.
        spec_cp_ctx.buf_record.clear();
        spec_cp_ctx.buf_record.push_str(&spec_cp_ctx.buf_line);
        spec_cp_ctx
            .buf_record
            .push_str(destination.line_terminator());
        destination
            .write_record(&spec_cp_ctx.buf_record)
            .map_err(|e| CopyLinesError::Write {
                n_line,
                source: e,
            })?;
        spec_cp_ctx
            .builder_report
            .add_written(spec_cp_ctx.buf_record.len());

        progress.on_line(n_line);
    }
}

/// Copy `source` into `destination` without progress output.
pub fn copy_lines<S, D>(source: S, destination: D) -> Result<ReportLineCopy, CopyLinesError>
where
    S: SourceStream,
    D: DestinationStream,
{
    LineCopier::new().copy(source, destination)
}

/// Copy the text file `path_src` into `path_dst` line by line.
///
/// Progress markers go to standard output when `spec_options.if_progress`
/// is set. See [`copy_file_lines_with_progress`] for a custom side channel.
pub fn copy_file_lines<P, Q>(
    path_src: P,
    path_dst: Q,
    spec_options: &SpecLineCopyOptions,
) -> Result<ReportLineCopy, CopyLinesError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let progress = progress_from_options(io::stdout(), spec_options);
    copy_file_lines_with_progress(path_src, path_dst, spec_options, progress)
}

/// Copy the text file `path_src` into `path_dst`, reporting to `progress`.
///
/// This function performs:
/// 1. Path validation and the destination conflict policy.
/// 2. Opening the source, then the destination. If the destination cannot be
///    opened the source is released before the open failure is returned.
/// 3. The line copy itself (see [`LineCopier::copy`]).
/// 4. Optional metadata preservation, whose failures are report warnings.
pub fn copy_file_lines_with_progress<P, Q, G>(
    path_src: P,
    path_dst: Q,
    spec_options: &SpecLineCopyOptions,
    progress: G,
) -> Result<ReportLineCopy, CopyLinesError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    G: ProgressLines,
{
    let path_src = path_src.as_ref();
    let path_dst = path_dst.as_ref();

    validate_copy_paths(path_src, path_dst)?;
    let Some(enum_open_mode) =
        resolve_destination_open_mode(path_dst, spec_options.rule_conflict_file)?
    else {
        info!(path = %path_dst.display(), "destination exists; copy skipped");
        return Ok(report_skipped());
    };

    let source = FileSource::open(path_src)?;
    let res_open_dst =
        open_destination_with_mode(path_dst, enum_open_mode, spec_options.rule_line_terminator);
    let destination = match res_open_dst {
        Ok(v) => v,
        Err(err) => {
            let l_suppressed = HandleGuard::new(source, EnumStreamRole::Source)
                .release()
                .err()
                .into_iter()
                .collect();
            return Err(err.with_suppressed(l_suppressed));
        }
    };

    let mut line_copier = LineCopier::with_progress(progress);
    let mut report = line_copier.copy(source, destination)?;

    if spec_options.if_preserve_metadata {
        preserve_metadata(path_src, path_dst, &mut report.warnings);
    }
    for warning in &report.warnings {
        warn!("{warning}");
    }
    Ok(report)
}

/// Apply the conflict policy to `path_dst` and open it for line writing.
///
/// Returns `Ok(None)` when the policy says to skip the copy.
pub fn open_file_destination<P: AsRef<Path>>(
    path_dst: P,
    spec_options: &SpecLineCopyOptions,
) -> Result<Option<FileDestination>, CopyLinesError> {
    let path_dst = path_dst.as_ref();
    let Some(enum_open_mode) =
        resolve_destination_open_mode(path_dst, spec_options.rule_conflict_file)?
    else {
        return Ok(None);
    };
    open_destination_with_mode(path_dst, enum_open_mode, spec_options.rule_line_terminator)
        .map(Some)
}

/// Report for a run the conflict policy skipped.
pub fn report_skipped() -> ReportLineCopy {
    let mut builder_report = ReportLineCopyBuilder::default();
    builder_report.set_skipped();
    builder_report.build()
}

fn open_destination_with_mode(
    path_dst: &Path,
    enum_open_mode: EnumDestinationOpenMode,
    rule_line_terminator: EnumLineTerminator,
) -> Result<FileDestination, CopyLinesError> {
    match enum_open_mode {
        EnumDestinationOpenMode::Truncate => FileDestination::create(path_dst, rule_line_terminator),
        EnumDestinationOpenMode::Append => FileDestination::append(path_dst, rule_line_terminator),
        EnumDestinationOpenMode::CreateNew => {
            FileDestination::create_new(path_dst, rule_line_terminator)
        }
    }
}
