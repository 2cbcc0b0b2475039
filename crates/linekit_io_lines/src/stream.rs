//! Source/destination handle traits and their reader/writer implementations.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::spec::{CopyLinesError, EnumLineTerminator, EnumStreamRole};

////////////////////////////////////////////////////////////////////////////////
// #region Traits

/// An open I/O resource that must be released exactly once.
pub trait StreamHandle {
    /// Release the underlying resource. Buffered data is committed here, so
    /// failures are real I/O failures and must be reported.
    fn release(&mut self) -> io::Result<()>;
}

/// Lazy, finite, non-restartable sequence of text lines.
pub trait SourceStream: StreamHandle {
    /// Replace `buf` with the next line, terminator stripped.
    ///
    /// Returns `Ok(false)` at end of input.
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool>;
}

/// Sink for text lines.
pub trait DestinationStream: StreamHandle {
    /// Terminator appended after every line.
    fn line_terminator(&self) -> &str;

    /// Write one complete record (line text followed by terminator).
    fn write_record(&mut self, record: &str) -> io::Result<()>;
}

impl<H: StreamHandle + ?Sized> StreamHandle for Box<H> {
    fn release(&mut self) -> io::Result<()> {
        (**self).release()
    }
}

impl<S: SourceStream + ?Sized> SourceStream for Box<S> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool> {
        (**self).read_line(buf)
    }
}

impl<D: DestinationStream + ?Sized> DestinationStream for Box<D> {
    fn line_terminator(&self) -> &str {
        (**self).line_terminator()
    }

    fn write_record(&mut self, record: &str) -> io::Result<()> {
        (**self).write_record(record)
    }
}

fn err_released(role: EnumStreamRole) -> io::Error {
    io::Error::other(format!("{role} handle already released"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReaderSource

/// [`SourceStream`] over any buffered reader.
///
/// Lines end at `\n`; a `\r` directly before it is treated as part of the
/// terminator. A trailing line without terminator is still yielded.
#[derive(Debug)]
pub struct ReaderSource<R: BufRead> {
    reader: Option<R>,
}

/// Source backed by a file on disk.
pub type FileSource = ReaderSource<BufReader<File>>;

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }

    /// Whether [`StreamHandle::release`] has run.
    pub fn is_released(&self) -> bool {
        self.reader.is_none()
    }
}

impl ReaderSource<BufReader<File>> {
    /// Open `path` for line reading.
    ///
    /// A path that opens but is not a regular file (a directory, say) fails
    /// with [`CopyLinesError::SourceNotFile`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CopyLinesError> {
        let path = path.as_ref();
        let err_open = |source: io::Error| CopyLinesError::Open {
            role: EnumStreamRole::Source,
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(err_open)?;
        if !file.metadata().map_err(err_open)?.is_file() {
            return Err(CopyLinesError::SourceNotFile(path.to_path_buf()));
        }
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> StreamHandle for ReaderSource<R> {
    fn release(&mut self) -> io::Result<()> {
        match self.reader.take() {
            Some(reader) => {
                drop(reader);
                Ok(())
            }
            None => Err(err_released(EnumStreamRole::Source)),
        }
    }
}

impl<R: BufRead> SourceStream for ReaderSource<R> {
    fn read_line(&mut self, buf: &mut String) -> io::Result<bool> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| err_released(EnumStreamRole::Source))?;

        buf.clear();
        if reader.read_line(buf)? == 0 {
            return Ok(false);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(true)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriterDestination

/// [`DestinationStream`] over any writer, buffered internally.
///
/// Releasing flushes the buffer; a flush error is a release failure.
#[derive(Debug)]
pub struct WriterDestination<W: Write> {
    writer: Option<BufWriter<W>>,
    line_terminator: &'static str,
}

/// Destination backed by a file on disk.
pub type FileDestination = WriterDestination<File>;

impl<W: Write> WriterDestination<W> {
    pub fn new(writer: W, rule_line_terminator: EnumLineTerminator) -> Self {
        Self {
            writer: Some(BufWriter::new(writer)),
            line_terminator: rule_line_terminator.as_str(),
        }
    }

    /// Whether [`StreamHandle::release`] has run.
    pub fn is_released(&self) -> bool {
        self.writer.is_none()
    }
}

impl WriterDestination<File> {
    /// Create (or truncate) `path` for line writing.
    pub fn create<P: AsRef<Path>>(
        path: P,
        rule_line_terminator: EnumLineTerminator,
    ) -> Result<Self, CopyLinesError> {
        Self::open_with(
            path.as_ref(),
            rule_line_terminator,
            OpenOptions::new().write(true).create(true).truncate(true),
        )
    }

    /// Open `path` positioned for append, creating it when missing.
    pub fn append<P: AsRef<Path>>(
        path: P,
        rule_line_terminator: EnumLineTerminator,
    ) -> Result<Self, CopyLinesError> {
        Self::open_with(
            path.as_ref(),
            rule_line_terminator,
            OpenOptions::new().append(true).create(true),
        )
    }

    /// Create `path`, failing with [`CopyLinesError::DestinationExists`] if
    /// it already exists.
    pub fn create_new<P: AsRef<Path>>(
        path: P,
        rule_line_terminator: EnumLineTerminator,
    ) -> Result<Self, CopyLinesError> {
        let path = path.as_ref();
        Self::open_with(
            path,
            rule_line_terminator,
            OpenOptions::new().write(true).create_new(true),
        )
        .map_err(|err| match err {
            CopyLinesError::Open { source, .. } if source.kind() == io::ErrorKind::AlreadyExists => {
                CopyLinesError::DestinationExists(path.to_path_buf())
            }
            other => other,
        })
    }

    fn open_with(
        path: &Path,
        rule_line_terminator: EnumLineTerminator,
        open_options: &OpenOptions,
    ) -> Result<Self, CopyLinesError> {
        let file = open_options
            .open(path)
            .map_err(|source| CopyLinesError::Open {
                role: EnumStreamRole::Destination,
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(file, rule_line_terminator))
    }
}

impl<W: Write> StreamHandle for WriterDestination<W> {
    fn release(&mut self) -> io::Result<()> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| err_released(EnumStreamRole::Destination))?;
        // `into_inner` flushes once. On failure the writer is taken apart
        // without flushing, so the unwritten buffer is discarded.
        match writer.into_inner() {
            Ok(_) => Ok(()),
            Err(err_into_inner) => {
                let (err, writer) = err_into_inner.into_parts();
                drop(writer.into_parts());
                Err(err)
            }
        }
    }
}

impl<W: Write> DestinationStream for WriterDestination<W> {
    fn line_terminator(&self) -> &str {
        self.line_terminator
    }

    fn write_record(&mut self, record: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| err_released(EnumStreamRole::Destination))?;
        writer.write_all(record.as_bytes())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
