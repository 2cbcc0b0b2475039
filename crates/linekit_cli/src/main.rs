//! linekit CLI - copy a text file line by line, releasing both files on
//! every exit path.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use linekit_io_lines::{
    CopyLinesError, DestinationStream, EnumCopyFailureKind, EnumCopyFileConflictStrategy,
    EnumLineTerminator, FileSource, LineCopier, ReaderSource, ReportLineCopy, SourceStream,
    SpecLineCopyOptions, WriterDestination, copy_file_lines, open_file_destination,
    progress_from_options, report_skipped,
};
use tracing::{Level, debug, warn};

const C_STDIO_PATH: &str = "-";

#[derive(Parser)]
#[command(name = "linekit")]
#[command(about = "Copy a text file line by line with guaranteed release of both files")]
#[command(version)]
struct Cli {
    /// Source text file (`-` reads stdin)
    source: PathBuf,

    /// Destination text file (`-` writes stdout)
    destination: PathBuf,

    /// Existing destination policy: skip, overwrite, append, error
    #[arg(long, default_value = "overwrite", value_parser = parse_rule_conflict_file)]
    conflict: EnumCopyFileConflictStrategy,

    /// Destination line terminator: lf, crlf, native
    #[arg(long, default_value = "native", value_parser = parse_rule_line_terminator)]
    line_ending: EnumLineTerminator,

    /// Copy permissions and timestamps onto the destination
    #[arg(long)]
    preserve_metadata: bool,

    /// Do not print per-line progress markers
    #[arg(long)]
    no_progress: bool,

    /// Per-line progress marker
    #[arg(long, default_value_t = '.')]
    marker: char,

    /// Print the copy report to stderr
    #[arg(long)]
    report: bool,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,
}

fn parse_rule_conflict_file(value: &str) -> Result<EnumCopyFileConflictStrategy, String> {
    match value {
        "skip" => Ok(EnumCopyFileConflictStrategy::Skip),
        "overwrite" => Ok(EnumCopyFileConflictStrategy::Overwrite),
        "append" => Ok(EnumCopyFileConflictStrategy::Append),
        "error" => Ok(EnumCopyFileConflictStrategy::Error),
        _ => Err(format!(
            "Invalid conflict strategy: `{value}`. Expected one of: ['skip', 'overwrite', 'append', 'error']"
        )),
    }
}

fn parse_rule_line_terminator(value: &str) -> Result<EnumLineTerminator, String> {
    match value {
        "lf" => Ok(EnumLineTerminator::Lf),
        "crlf" => Ok(EnumLineTerminator::CrLf),
        "native" => Ok(EnumLineTerminator::Native),
        _ => Err(format!(
            "Invalid line ending: `{value}`. Expected one of: ['lf', 'crlf', 'native']"
        )),
    }
}

/// Exit code per failure kind. Code 2 stays with clap usage errors.
fn exit_code(kind: EnumCopyFailureKind) -> u8 {
    match kind {
        EnumCopyFailureKind::Setup => 1,
        EnumCopyFailureKind::Open => 3,
        EnumCopyFailureKind::Read => 4,
        EnumCopyFailureKind::Write => 5,
        EnumCopyFailureKind::Release => 6,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli.verbosity, &cli.log_format) {
        eprintln!("Error: {e}");
        return ExitCode::from(1);
    }

    let spec_options = SpecLineCopyOptions {
        rule_conflict_file: cli.conflict,
        rule_line_terminator: cli.line_ending,
        if_preserve_metadata: cli.preserve_metadata,
        if_progress: !cli.no_progress,
        char_progress_marker: cli.marker,
        ..SpecLineCopyOptions::default()
    };

    match run(&cli, &spec_options) {
        Ok(report) => {
            if cli.report {
                eprintln!("{report}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(exit_code(e.kind()))
        }
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == C_STDIO_PATH
}

fn run(cli: &Cli, spec_options: &SpecLineCopyOptions) -> Result<ReportLineCopy, CopyLinesError> {
    let if_stdin = is_stdio(&cli.source);
    let if_stdout = is_stdio(&cli.destination);
    debug!(source = %cli.source.display(), destination = %cli.destination.display(), "starting copy");

    if !if_stdin && !if_stdout {
        return copy_file_lines(&cli.source, &cli.destination, spec_options);
    }

    if spec_options.if_preserve_metadata {
        warn!("--preserve-metadata ignored when copying through stdin/stdout");
    }

    // stdout carries data, so markers move to stderr.
    let progress = if if_stdout {
        progress_from_options(io::stderr(), spec_options)
    } else {
        progress_from_options(io::stdout(), spec_options)
    };
    let mut line_copier = LineCopier::with_progress(progress);

    // At most one side is a real file here, and stdio needs no acquisition,
    // so a failed open never leaves the other handle behind.
    let source: Box<dyn SourceStream> = if if_stdin {
        Box::new(ReaderSource::new(io::stdin().lock()))
    } else {
        Box::new(FileSource::open(&cli.source)?)
    };
    let destination: Box<dyn DestinationStream> = if if_stdout {
        Box::new(WriterDestination::new(
            io::stdout(),
            spec_options.rule_line_terminator,
        ))
    } else {
        match open_file_destination(&cli.destination, spec_options)? {
            Some(v) => Box::new(v),
            None => return Ok(report_skipped()),
        }
    };

    line_copier.copy(source, destination)
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => return Err(format!("Invalid verbosity: `{verbosity}`")),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        _ => return Err(format!("Invalid log format: `{format}`")),
    }

    Ok(())
}
