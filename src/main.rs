#![forbid(unsafe_code)]

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use log::*;
use structopt::StructOpt;
use tempfile::NamedTempFile;

use bunzip::decompress;

////////////////////////////////////////////////////////////////////////////////

#[derive(StructOpt, Debug)]
#[structopt(name = "bunzip2", about = "Decompress bzip2 files.")]
struct Opts {
    /// Write to standard output and keep input files
    #[structopt(short = "c", long = "stdout")]
    stdout: bool,

    /// Overwrite existing output files, or the input when its suffix is unknown
    #[structopt(short, long)]
    force: bool,

    /// Check integrity without writing anything
    #[structopt(short, long)]
    test: bool,

    /// Keep input files
    #[structopt(short, long)]
    keep: bool,

    /// Suppress warnings
    #[structopt(short, long)]
    quiet: bool,

    /// Report each file; repeat for more detail
    #[structopt(short, long, parse(from_occurrences))]
    verbose: usize,

    /// Files to decompress, `-` for standard input
    #[structopt(parse(from_os_str))]
    files: Vec<PathBuf>,
}

impl Opts {
    fn keep_input(&self) -> bool {
        self.keep || self.stdout || self.test
    }

    /// Decompressed bytes for `path` are written to stdout.
    fn data_on_stdout(&self, path: &Path) -> bool {
        !self.test && (self.stdout || path == Path::new("-"))
    }
}

////////////////////////////////////////////////////////////////////////////////

fn invoked_as_bzcat() -> bool {
    std::env::args_os()
        .next()
        .map(PathBuf::from)
        .and_then(|path| path.file_stem().map(|stem| stem == "bzcat"))
        .unwrap_or(false)
}

/// Name of the decompressed file. Without a known suffix the input itself is
/// replaced, which `-f` has to allow.
fn output_path(path: &Path) -> PathBuf {
    match path.extension().and_then(OsStr::to_str) {
        Some("bz2") | Some("bz") => path.with_extension(""),
        Some("tbz2") | Some("tbz") => path.with_extension("tar"),
        _ => path.to_path_buf(),
    }
}

fn status_line(name: &str, result: &Result<()>) -> String {
    match result {
        Ok(()) => format!("{}: ok", name),
        Err(err) => format!("{}: {:#}", name, err),
    }
}

fn from_stdin(opts: &Opts) -> Result<()> {
    let stdin = io::stdin();
    let input = stdin.lock();
    if opts.test {
        decompress(input, io::sink())?;
    } else {
        let stdout = io::stdout();
        decompress(input, BufWriter::new(stdout.lock()))?;
    }
    Ok(())
}

fn from_file(opts: &Opts, path: &Path) -> Result<()> {
    let file = File::open(path).context("can't open input file")?;
    let permissions = file.metadata().context("can't stat input file")?.permissions();
    let input = BufReader::new(file);

    if opts.test {
        decompress(input, io::sink())?;
        return Ok(());
    }
    if opts.stdout {
        let stdout = io::stdout();
        decompress(input, BufWriter::new(stdout.lock()))?;
        return Ok(());
    }

    let target = output_path(path);
    let in_place = target == path;
    if in_place && opts.keep {
        bail!("{} exists", target.display());
    }
    if target.exists() && !opts.force {
        bail!("output file {} already exists", target.display());
    }

    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).context("can't create output file")?;
    tmp.as_file()
        .set_permissions(permissions)
        .context("can't set output permissions")?;
    let len = decompress(input, BufWriter::new(&mut tmp))?;
    tmp.persist(&target)
        .map_err(|err| err.error)
        .with_context(|| format!("can't write {}", target.display()))?;
    info!("{} -> {} ({} bytes)", path.display(), target.display(), len);

    if !opts.keep_input() && !in_place {
        fs::remove_file(path).context("can't remove input file")?;
    }
    Ok(())
}

fn process(opts: &Opts, path: &Path) -> Result<()> {
    if path == Path::new("-") {
        from_stdin(opts)
    } else {
        from_file(opts, path)
    }
}

fn main() {
    let mut opts = Opts::from_args();
    if invoked_as_bzcat() {
        opts.stdout = true;
    }

    if let Err(err) = stderrlog::new()
        .quiet(opts.quiet)
        .verbosity(opts.verbose + 1)
        .init()
    {
        eprintln!("bunzip2: {}", err);
        process::exit(1);
    }

    if opts.files.is_empty() {
        opts.files.push(PathBuf::from("-"));
    }

    let mut failed = false;
    for path in &opts.files {
        let name = if path == Path::new("-") {
            "(stdin)".to_string()
        } else {
            path.display().to_string()
        };
        let result = process(&opts, path);
        if let Err(err) = &result {
            failed = true;
            if opts.verbose == 0 {
                eprintln!("bunzip2: {}: {:#}", name, err);
            }
        }
        if opts.verbose > 0 {
            let line = status_line(&name, &result);
            if opts.data_on_stdout(path) {
                eprintln!("{}", line);
            } else {
                println!("{}", line);
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

////////////////////////////////////////////////////////////////////////////////
