//! Progress side channel: one marker per copied line, one completion text.

use std::io::Write;

use tracing::debug;

use crate::report::ReportLineCopy;
use crate::spec::SpecLineCopyOptions;

/// Observer of copy progress. Purely observational; cannot fail the copy.
pub trait ProgressLines {
    /// Called after line `n_line` (1-based) has been written.
    fn on_line(&mut self, n_line: u64);

    /// Called once after both handles were released successfully.
    fn on_done(&mut self, report: &ReportLineCopy);
}

impl<P: ProgressLines + ?Sized> ProgressLines for &mut P {
    fn on_line(&mut self, n_line: u64) {
        (**self).on_line(n_line);
    }

    fn on_done(&mut self, report: &ReportLineCopy) {
        (**self).on_done(report);
    }
}

impl<P: ProgressLines + ?Sized> ProgressLines for Box<P> {
    fn on_line(&mut self, n_line: u64) {
        (**self).on_line(n_line);
    }

    fn on_done(&mut self, report: &ReportLineCopy) {
        (**self).on_done(report);
    }
}

/// Emits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressSilent;

impl ProgressLines for ProgressSilent {
    fn on_line(&mut self, _n_line: u64) {}

    fn on_done(&mut self, _report: &ReportLineCopy) {}
}

/// Writes `char_marker` per line and `text_done` plus newline on completion.
#[derive(Debug)]
pub struct ProgressMarkers<W: Write> {
    writer: W,
    char_marker: char,
    text_done: String,
}

impl<W: Write> ProgressMarkers<W> {
    pub fn new(writer: W, char_marker: char, text_done: impl Into<String>) -> Self {
        Self {
            writer,
            char_marker,
            text_done: text_done.into(),
        }
    }

    pub fn from_options(writer: W, spec_options: &SpecLineCopyOptions) -> Self {
        Self::new(
            writer,
            spec_options.char_progress_marker,
            spec_options.text_progress_done.clone(),
        )
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ProgressLines for ProgressMarkers<W> {
    fn on_line(&mut self, n_line: u64) {
        let mut buf_marker = [0_u8; 4];
        let marker = self.char_marker.encode_utf8(&mut buf_marker);
        if let Err(e) = self
            .writer
            .write_all(marker.as_bytes())
            .and_then(|_| self.writer.flush())
        {
            debug!(n_line, error = %e, "progress marker not written");
        }
    }

    fn on_done(&mut self, report: &ReportLineCopy) {
        if let Err(e) = writeln!(self.writer, "{}", self.text_done).and_then(|_| self.writer.flush())
        {
            debug!(
                cnt_lines = report.cnt_lines_written,
                error = %e,
                "progress completion not written"
            );
        }
    }
}

/// Build the progress sink described by `spec_options` on top of `writer`.
pub fn progress_from_options<'a, W: Write + 'a>(
    writer: W,
    spec_options: &SpecLineCopyOptions,
) -> Box<dyn ProgressLines + 'a> {
    if spec_options.if_progress {
        Box::new(ProgressMarkers::from_options(writer, spec_options))
    } else {
        Box::new(ProgressSilent)
    }
}
