//! Archive command: zips the run-data files of a run.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::Config;

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    /// Archive name without the `.zip` extension [default: <YYYY-MM-DD>-lockupload].
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Suppress output.
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &ArchiveArgs, config: &Config) -> Result<PathBuf> {
    let base = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}-lockupload",
            chrono::Local::now().format("%Y-%m-%d")
        ))
    });
    let output = available_path(&base);
    tracing::info!(output = %output.display(), "writing archive");

    let files = write_archive(&output, &config.rundata_dir)?;
    if !args.quiet {
        writeln!(writer, "Archived {files} files to {}", output.display())?;
    }
    Ok(output)
}

/// `<base>.zip`, or the first free `<base> (n).zip`.
fn available_path(base: &Path) -> PathBuf {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(base.as_os_str());
        name.push(suffix);
        name.push(".zip");
        PathBuf::from(name)
    };

    let mut path = with_suffix("");
    let mut version = 1;
    while path.exists() {
        path = with_suffix(&format!(" ({version})"));
        version += 1;
    }
    path
}

/// Writes every regular file in `rundata` to a deflated zip at `output`.
///
/// Entries are stored under the run-data directory's name, in name order.
fn write_archive(output: &Path, rundata: &Path) -> Result<usize> {
    let mut entries = fs::read_dir(rundata)
        .with_context(|| format!("failed to read {}", rundata.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read {}", rundata.display()))?;
    entries.retain(|path| path.is_file());
    entries.sort();

    let prefix = rundata
        .file_name()
        .map_or_else(|| "rundata".into(), |name| name.to_string_lossy());

    let file =
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    let mut archive = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in &entries {
        let Some(name) = path.file_name() else {
            continue;
        };
        let entry_name = format!("{prefix}/{}", name.to_string_lossy());
        tracing::info!(entry = %entry_name, "adding to archive");
        archive
            .start_file(entry_name.as_str(), options)
            .with_context(|| format!("failed to add {}", path.display()))?;
        let mut source =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        io::copy(&mut source, &mut archive)
            .with_context(|| format!("failed to add {}", path.display()))?;
    }

    archive
        .finish()
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(entries.len())
}
