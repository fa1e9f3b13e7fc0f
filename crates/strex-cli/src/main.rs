//! strex - Dump the strings of CBOR and MessagePack documents
//!
//! This tool runs the bulk string extractor over binary documents, either
//! one batch at a time (as a structural parser would see it) or across the
//! whole document.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use strex_core::{Extracted, Extractor, ExtractorConfig, Format, TokenFormat};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Dump the strings of CBOR and MessagePack documents in bulk
#[derive(Parser, Debug)]
#[command(name = "strex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Wire format (guessed from the file extension when omitted)
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Byte offset to start scanning at
    #[arg(long, default_value = "0")]
    start: usize,

    /// Byte offset to stop scanning at (default: end of file)
    #[arg(long)]
    end: Option<usize>,

    /// Length of a string body that begins exactly at --start
    #[arg(long)]
    first_string_len: Option<usize>,

    /// Strings after which a single batch stops
    #[arg(long, default_value = "255")]
    max_entries: usize,

    /// Walk the whole range and print one string per text token
    #[arg(long)]
    all: bool,

    /// Output style
    #[arg(long, value_enum, default_value = "lines")]
    output: OutputStyle,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single document
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of documents to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Wire format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// CBOR
    Cbor,
    /// MessagePack
    Msgpack,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Cbor => Format::Cbor,
            FormatArg::Msgpack => Format::MessagePack,
        }
    }
}

/// How extracted strings are printed
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputStyle {
    /// One string per line, as is
    Lines,
    /// One escaped string per line
    Debug,
    /// Only the number of strings
    Count,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file, &mut out)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory, &mut out)
    } else {
        bail!("Either --file or --directory must be specified")
    }
}

/// Pick the format for `path`: explicit flag first, then the extension.
fn resolve_format(cli_format: Option<FormatArg>, path: &Path) -> Option<Format> {
    cli_format.map(Format::from).or_else(|| {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension)
    })
}

/// Process a single document
fn process_single_file(cli: &Cli, file: &Path, out: &mut impl Write) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let format = resolve_format(cli.format, file).unwrap_or_default();
    let count = process_document(cli, file, format, out)?;
    info!("{}: {} strings", file.display(), count);
    Ok(())
}

/// Process a directory of documents recursively
fn process_directory(cli: &Cli, directory: &Path, out: &mut impl Write) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut documents = 0;
    let mut strings = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        let Some(format) = resolve_format(cli.format, path) else {
            trace!("Skipping unknown format: {}", path.display());
            continue;
        };

        debug!("Processing {} as {}", path.display(), format.name());
        match process_document(cli, path, format, out) {
            Ok(count) => strings += count,
            // Log error but continue with other files
            Err(e) => warn!("Error processing {}: {:#}", path.display(), e),
        }
        documents += 1;
    }

    info!("Processed {} documents, {} strings", documents, strings);
    Ok(())
}

/// Extract and print the strings of one document, returning how many
/// were printed.
fn process_document(
    cli: &Cli,
    path: &Path,
    format: Format,
    out: &mut impl Write,
) -> Result<usize> {
    trace!("Reading {}", path.display());
    let data =
        fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let end = cli.end.unwrap_or(data.len());
    if end > data.len() {
        bail!(
            "End offset {} is past the end of {} ({} bytes)",
            end,
            path.display(),
            data.len()
        );
    }

    let config = ExtractorConfig::new().max_entries(cli.max_entries);
    let mut extractor = Extractor::with_config(format, config);

    let strings: Vec<String> = if cli.all {
        extract_all(&mut extractor, &data, cli.start, end)
            .with_context(|| format!("Failed to walk {}", path.display()))?
    } else {
        let batch = extractor
            .extract_strings(&data, cli.start, end, cli.first_string_len)
            .with_context(|| format!("Failed to extract strings from {}", path.display()))?;
        if let Extracted::Single(_) = batch {
            debug!("Batch collapsed to a single string");
        }
        batch.into_vec()
    };

    print_strings(cli.output, path, &strings, out)?;
    Ok(strings.len())
}

/// Walk the range token by token, one string per text token.
fn extract_all(
    extractor: &mut Extractor<Format>,
    data: &[u8],
    start: usize,
    end: usize,
) -> strex_core::Result<Vec<String>> {
    let mut feed = extractor.feed(data, start, end);
    let strings = feed
        .by_ref()
        .map(|token| token.map(|t| t.text))
        .collect::<strex_core::Result<Vec<_>>>()?;
    debug!("Walked {} strings in {} batches", strings.len(), feed.batches());
    Ok(strings)
}

fn print_strings(
    style: OutputStyle,
    path: &Path,
    strings: &[String],
    out: &mut impl Write,
) -> Result<()> {
    match style {
        OutputStyle::Lines => {
            for s in strings {
                writeln!(out, "{}", s)?;
            }
        }
        OutputStyle::Debug => {
            for s in strings {
                writeln!(out, "{:?}", s)?;
            }
        }
        OutputStyle::Count => {
            writeln!(out, "{}: {}", path.display(), strings.len())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("strex").chain(args.iter().copied()))
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            resolve_format(None, Path::new("doc.msgpack")),
            Some(Format::MessagePack)
        );
        assert_eq!(resolve_format(None, Path::new("doc.cbor")), Some(Format::Cbor));
        assert_eq!(resolve_format(None, Path::new("doc.bin")), None);
        assert_eq!(
            resolve_format(Some(FormatArg::Cbor), Path::new("doc.msgpack")),
            Some(Format::Cbor)
        );
    }

    #[test]
    fn test_process_document_batch() {
        let dir = TempDir::new().unwrap();
        // ["é", "ü"]
        let path = write_doc(&dir, "doc.cbor", &[0x82, 0x62, 0xc3, 0xa9, 0x62, 0xc3, 0xbc]);
        let cli = parse(&["--file", path.to_str().unwrap()]);

        let mut out = Vec::new();
        let count = process_document(&cli, &path, Format::Cbor, &mut out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "é\nü\n");
    }

    #[test]
    fn test_process_document_all_splits_runs() {
        let dir = TempDir::new().unwrap();
        // {"a": "b"} as MessagePack
        let path = write_doc(&dir, "doc.msgpack", &[0x81, 0xa1, b'a', 0xa1, b'b']);
        let cli = parse(&["--file", path.to_str().unwrap(), "--all", "--output", "debug"]);

        let mut out = Vec::new();
        let count = process_document(&cli, &path, Format::MessagePack, &mut out).unwrap();
        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "\"a\"\n\"b\"\n");
    }

    #[test]
    fn test_process_document_reports_scan_errors() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "bad.cbor", &[0x7b, 0, 0, 0, 0, 0, 0, 0, 1]);
        let cli = parse(&["--file", path.to_str().unwrap()]);

        let mut out = Vec::new();
        let err = process_document(&cli, &path, Format::Cbor, &mut out).unwrap_err();
        assert!(format!("{:#}", err).contains("length too large"));
    }

    #[test]
    fn test_end_past_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_doc(&dir, "doc.cbor", &[0x61, b'a']);
        let cli = parse(&["--file", path.to_str().unwrap(), "--end", "10"]);

        let mut out = Vec::new();
        assert!(process_document(&cli, &path, Format::Cbor, &mut out).is_err());
    }

    #[test]
    fn test_process_directory_counts() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "one.cbor", &[0x61, b'a']);
        write_doc(&dir, "two.msgpack", &[0x92, 0xa1, b'x', 0xa2, 0xc3, 0xbc]);
        write_doc(&dir, "notes.txt", b"ignored");
        write_doc(&dir, ".hidden.cbor", &[0x61, b'h']);

        let cli = parse(&[
            "--directory",
            dir.path().to_str().unwrap(),
            "--output",
            "count",
        ]);
        let mut out = Vec::new();
        process_directory(&cli, dir.path(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("one.cbor: 1"));
        assert!(text.contains("two.msgpack: 2"));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
