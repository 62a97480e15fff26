use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use log::debug;
use path_absolutize::Absolutize;

/// Format of the timestamp optionally appended to archive names.
const STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Absolute form of `path` with `.` and `..` resolved lexically.
///
/// Symlinks are not followed and the path does not need to exist.
pub fn canonicalize(path: &Path) -> io::Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}

/// Resolve `path` against `base` unless it is already absolute or `base` is
/// empty, in which case it is resolved against the working directory.
pub fn resolve_absolute(path: impl AsRef<Path>, base: impl AsRef<Path>) -> io::Result<PathBuf> {
    let (path, base) = (path.as_ref(), base.as_ref());
    if !base.as_os_str().is_empty() && !path.is_absolute() {
        canonicalize(&base.join(path))
    } else {
        canonicalize(path)
    }
}

/// Base directory for a run. An empty base stays the literal `.`.
pub fn resolve_base(path: &str) -> io::Result<PathBuf> {
    if path.is_empty() {
        return Ok(PathBuf::from("."));
    }
    let base = canonicalize(Path::new(path))?;
    debug!("Base path: {}", base.display());
    Ok(base)
}

/// Directory an archive is extracted into.
///
/// Without an explicit `output` this is a sibling of the archive named after
/// it with the last extension dropped, so `backup.2024.zip` extracts into
/// `backup.2024`. An archive without an extension gets an `_extracted`
/// suffix instead of colliding with itself.
pub fn extraction_target(archive: &Path, output: Option<&Path>) -> io::Result<PathBuf> {
    match output {
        Some(output) => canonicalize(output),
        None => {
            let name = archive
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            let dir_name = match name.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem.to_string(),
                _ => format!("{name}_extracted"),
            };
            canonicalize(&archive.with_file_name(dir_name))
        }
    }
}

/// Default archive path for `item`: one trailing `.zip` is dropped, an
/// optional `_YYYYMMDDHHMMSS` stamp appended and `.zip` put back.
pub fn archive_name(item: &Path, timestamp: bool) -> io::Result<PathBuf> {
    let stamp = timestamp.then(|| Local::now().naive_local());
    archive_name_with_stamp(item, stamp)
}

/// [`archive_name`] with an explicit stamp.
pub fn archive_name_with_stamp(item: &Path, stamp: Option<NaiveDateTime>) -> io::Result<PathBuf> {
    let text = item.to_string_lossy();
    let stem = text.strip_suffix(".zip").unwrap_or(text.as_ref());
    let stamp = stamp
        .map(|s| format!("_{}", s.format(STAMP_FORMAT)))
        .unwrap_or_default();
    canonicalize(Path::new(&format!("{stem}{stamp}.zip")))
}

/// Name under which `file` is stored in an archive rooted at `base`.
///
/// Always relative and `/`-separated. Files outside `base` keep their path
/// minus the root.
pub fn entry_name(file: &Path, base: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
