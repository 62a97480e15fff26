use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::mem;
use std::path::{Path, PathBuf};

use ::zip::write::{FileOptions, SimpleFileOptions};
use ::zip::{AesMode, ZipWriter};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::error::SkipReason;
use crate::io::{
    PasswordPrompt, PatternSet, archive_name, canonicalize, entry_name, expand, get_password,
    resolve_absolute, resolve_base, walk,
};

use super::{Compression, Outcome, Report, lzma};

/// Entries at or above this size need ZIP64 headers.
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Parameters of a `zip` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipRequest {
    /// Glob patterns selecting what to archive, relative to `base`.
    pub inputs: Vec<String>,
    /// Glob patterns matched against absolute paths to leave out.
    pub excludes: Vec<String>,
    /// Single archive to write. Without it every top-level match gets its
    /// own archive next to it.
    pub output: Option<PathBuf>,
    pub base: String,
    /// Ask for a password and encrypt with AES-256.
    pub password: bool,
    pub compression: Compression,
}

impl Default for ZipRequest {
    fn default() -> Self {
        Self {
            inputs: vec!["*".to_string()],
            excludes: Vec::new(),
            output: None,
            base: ".".to_string(),
            password: false,
            compression: Compression::default(),
        }
    }
}

/// How files are written into one archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveSettings<'a> {
    /// Entry names are relative to this directory.
    pub base: &'a Path,
    /// Empty means unencrypted.
    pub password: &'a str,
    pub compression: Compression,
}

/// Archive the files selected by `request`.
///
/// Malformed patterns are rejected before the password prompt or any
/// filesystem access.
pub fn build<P>(request: &ZipRequest, prompt: &mut P) -> Result<Report>
where
    P: PasswordPrompt + ?Sized,
{
    debug!("Include patterns: {:?}", request.inputs);
    debug!("Exclude patterns: {:?}", request.excludes);

    PatternSet::compile(&request.inputs)?;
    let excludes = PatternSet::compile(&request.excludes)?;

    let base = canonicalize(&resolve_base(&request.base)?)?;
    let password = get_password(prompt, request.password).context("Failed to read password")?;
    let settings = ArchiveSettings {
        base: &base,
        password: &password,
        compression: request.compression,
    };

    let mut report = Report::default();
    let mut collected: BTreeSet<PathBuf> = BTreeSet::new();

    for pattern in &request.inputs {
        let pattern_path = resolve_absolute(pattern, &base)?;
        let pattern_str = pattern_path.to_string_lossy();
        debug!("Checking pattern: {}", pattern_str);

        let matches = expand(&pattern_str, true)?;
        if matches.is_empty() {
            error!("No such file or directory: {}", pattern_str);
            report.skip(&pattern_path, SkipReason::NotFound);
            continue;
        }

        for matched in matches {
            let full_path = canonicalize(&matched)?;
            if excludes.matches(&full_path) {
                debug!("Skipping {}", full_path.display());
                continue;
            }

            for file in walk(&full_path, &excludes) {
                let file = file.with_context(|| format!("Failed to walk {}", full_path.display()))?;
                collected.insert(file);
            }

            if request.output.is_some() {
                continue;
            }
            if collected.is_empty() {
                warn!("No files matched for {}", full_path.display());
                report.skip(full_path, SkipReason::NoMatch);
            } else {
                let output = archive_name(&full_path, false)?;
                let files = mem::take(&mut collected);
                report.push(write_archive(&files, &output, &settings)?);
            }
        }
    }

    if let Some(output) = &request.output {
        let output = archive_name(output, false)?;
        if collected.is_empty() {
            warn!("No files matched for {}", output.display());
            report.skip(output, SkipReason::NoMatch);
        } else {
            report.push(write_archive(&collected, &output, &settings)?);
        }
    }

    Ok(report)
}

/// Write `files` into a new archive at `output`.
///
/// An existing `output` is never replaced: the write is skipped with a
/// warning and reported as a collision. A partially written archive is
/// removed before the error is returned.
pub fn write_archive<I, F>(files: I, output: &Path, settings: &ArchiveSettings<'_>) -> Result<Outcome>
where
    I: IntoIterator<Item = F>,
    F: AsRef<Path>,
{
    let collision = || {
        warn!("Archive {} already exists. Skipping...", output.display());
        Outcome::Skipped {
            path: output.to_path_buf(),
            reason: SkipReason::Collision,
        }
    };

    if output.exists() {
        return Ok(collision());
    }

    let file = match OpenOptions::new().write(true).create_new(true).open(output) {
        Ok(file) => file,
        // Lost a race with another writer
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(collision()),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to create {}", output.display()));
        }
    };

    match write_entries(file, files, settings) {
        Ok(entries) => {
            let encrypted = !settings.password.is_empty();
            let kind = if encrypted { "AES encrypted zip" } else { "zip" };
            info!("Created {}: {}", kind, output.display());
            Ok(Outcome::Created {
                archive: output.to_path_buf(),
                entries,
                encrypted,
            })
        }
        Err(err) => {
            if let Err(cleanup) = fs::remove_file(output) {
                warn!("Could not remove partial archive {}: {}", output.display(), cleanup);
            }
            Err(err.context(format!("Failed to write {}", output.display())))
        }
    }
}

fn write_entries<I, F>(file: File, files: I, settings: &ArchiveSettings<'_>) -> Result<usize>
where
    I: IntoIterator<Item = F>,
    F: AsRef<Path>,
{
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        SimpleFileOptions::default().compression_method(settings.compression.method());
    let options = if settings.password.is_empty() {
        options
    } else {
        options.with_aes_encryption(AesMode::Aes256, settings.password)
    };

    let mut names: HashSet<String> = HashSet::new();
    for path in files {
        let path = path.as_ref();
        let name = entry_name(path, settings.base);
        if names.contains(&name) {
            warn!("Skipping {}: entry {} is already in the archive", path.display(), name);
            continue;
        }
        info!("[+] Adding: {} ({})", name, path.display());

        let mut source =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let metadata = source.metadata()?;

        match settings.compression {
            Compression::Lzma => {
                lzma::add_entry(&mut zip, &name, &mut source, file_mode(&metadata), settings.password)?;
            }
            _ => {
                zip.start_file(name.as_str(), entry_options(options.clone(), &metadata))?;
                io::copy(&mut source, &mut zip)?;
            }
        }
        names.insert(name);
    }

    zip.finish()?;
    Ok(names.len())
}

fn entry_options<'k>(options: FileOptions<'k, ()>, metadata: &fs::Metadata) -> FileOptions<'k, ()> {
    options
        .large_file(metadata.len() >= LARGE_FILE_THRESHOLD)
        .unix_permissions(file_mode(metadata))
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}
