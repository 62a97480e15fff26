use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Seek};
use std::path::{Path, PathBuf};

use ::zip::ZipArchive;
use ::zip::result::{ZipError, ZipResult};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::error::SkipReason;
use crate::io::{
    PasswordPrompt, PatternSet, canonicalize, expand, extraction_target, resolve_absolute,
    resolve_base,
};

use super::{Outcome, Report};

/// Passwords asked for before giving up on an encrypted archive.
pub const PASSWORD_ATTEMPTS: usize = 3;

/// Parameters of an `unzip` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnzipRequest {
    /// Glob patterns selecting archives, relative to `base`. `**` is not
    /// recursive here.
    pub inputs: Vec<String>,
    /// Extract everything into this directory instead of one directory per
    /// archive next to it.
    pub output: Option<PathBuf>,
    pub base: String,
}

impl Default for UnzipRequest {
    fn default() -> Self {
        Self {
            inputs: vec!["*".to_string()],
            output: None,
            base: ".".to_string(),
        }
    }
}

/// Extract every archive selected by `request`.
pub fn extract<P>(request: &UnzipRequest, prompt: &mut P) -> Result<Report>
where
    P: PasswordPrompt + ?Sized,
{
    PatternSet::compile(&request.inputs)?;
    let base = resolve_base(&request.base)?;
    let mut report = Report::default();

    for pattern in &request.inputs {
        let pattern_path = resolve_absolute(pattern, &base)?;
        let matches = expand(&pattern_path.to_string_lossy(), false)?;
        if matches.is_empty() {
            error!("Zip file not found: {}", pattern_path.display());
            report.skip(pattern_path, SkipReason::NotFound);
            continue;
        }

        for matched in matches {
            let archive_path = canonicalize(&matched)?;
            if !archive_path.exists() {
                error!("Zip file not found: {}", archive_path.display());
                report.skip(archive_path, SkipReason::NotFound);
                continue;
            }

            let file = File::open(&archive_path)
                .with_context(|| format!("Failed to open {}", archive_path.display()))?;
            let mut archive = match ZipArchive::new(file) {
                Ok(archive) => archive,
                Err(err) => {
                    warn!("Not a valid zip file: {} ({})", archive_path.display(), err);
                    report.skip(archive_path, SkipReason::InvalidFormat);
                    continue;
                }
            };

            let target = extraction_target(&archive_path, request.output.as_deref())?;
            info!("Extracting {} to {}", archive_path.display(), target.display());
            report.push(unzip_archive(&mut archive, &archive_path, &target, prompt)?);
        }
    }

    Ok(report)
}

/// Extract `archive`, prompting for a password if it turns out to be
/// encrypted. Anything other than a missing or wrong password is fatal.
fn unzip_archive<R, P>(
    archive: &mut ZipArchive<R>,
    archive_path: &Path,
    target: &Path,
    prompt: &mut P,
) -> Result<Outcome>
where
    R: Read + Seek,
    P: PasswordPrompt + ?Sized,
{
    let extracted = || {
        info!("Extracted to: {}", target.display());
        Outcome::Extracted {
            archive: archive_path.to_path_buf(),
            target: target.to_path_buf(),
        }
    };
    let failed = || format!("Failed to extract {}", archive_path.display());

    match extract_all(archive, target, None) {
        Ok(_) => return Ok(extracted()),
        Err(err) if is_password_required(&err) => {}
        Err(err) => return Err(err).with_context(failed),
    }

    for attempt in 1..=PASSWORD_ATTEMPTS {
        let password = prompt.read_password().context("Failed to read password")?;
        match verify_all(archive, password.as_bytes()) {
            Ok(()) => {
                extract_all(archive, target, Some(password.as_bytes())).with_context(failed)?;
                return Ok(extracted());
            }
            Err(err) if is_wrong_password(&err) => {
                debug!("Password rejected: {err}");
                warn!("Incorrect password. Try again. ({attempt}/{PASSWORD_ATTEMPTS})");
            }
            Err(err) => return Err(err).with_context(failed),
        }
    }

    error!(
        "Failed to extract {} after {} attempts",
        archive_path.display(),
        PASSWORD_ATTEMPTS
    );
    Ok(Outcome::Skipped {
        path: archive_path.to_path_buf(),
        reason: SkipReason::AuthFailure,
    })
}

fn is_password_required(err: &ZipError) -> bool {
    matches!(err, ZipError::UnsupportedArchive(msg) if *msg == ZipError::PASSWORD_REQUIRED)
}

/// Whether `err`, raised while reading entries with a candidate password,
/// means the password is wrong. ZipCrypto checks a single byte up front, so
/// some wrong passwords only show up as undecodable data.
fn is_wrong_password(err: &ZipError) -> bool {
    match err {
        ZipError::InvalidPassword => true,
        ZipError::Io(err) => matches!(
            err.kind(),
            ErrorKind::InvalidData | ErrorKind::InvalidInput | ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

/// Decrypt and decompress every entry without writing anything, so a
/// password that only looks right is caught before the first file is
/// created.
fn verify_all<R>(archive: &mut ZipArchive<R>, password: &[u8]) -> ZipResult<()>
where
    R: Read + Seek,
{
    for index in 0..archive.len() {
        let mut entry = archive.by_index_decrypt(index, password)?;
        io::copy(&mut entry, &mut io::sink())?;
    }
    Ok(())
}

/// Write every entry of `archive` under `target`, returning the number of
/// files written.
///
/// Entries whose names would escape `target` are skipped.
fn extract_all<R>(archive: &mut ZipArchive<R>, target: &Path, password: Option<&[u8]>) -> ZipResult<usize>
where
    R: Read + Seek,
{
    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = match password {
            Some(password) => archive.by_index_decrypt(index, password)?,
            None => archive.by_index(index)?,
        };

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }

        written += 1;
    }
    Ok(written)
}
