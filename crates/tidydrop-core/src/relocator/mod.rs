/// Relocator — collision-safe move of one file into `<root>/<category>/`.
///
/// # Move strategy
///
/// A free name is probed first, then claimed with `hard_link`, which fails
/// with `AlreadyExists` instead of replacing a file that another process
/// created in the meantime; the relocator then probes again. Once linked,
/// the source name is removed. Filesystems without hard links fall back to
/// `rename`.
///
/// When the OS reports a cross-device move the relocator falls back to:
///
/// 1. copy into a hidden `.<name>.tidydrop-partial` file in the destination
///    directory and `sync_all` it,
/// 2. claim a free destination name for the partial file the same way,
/// 3. remove the source.
///
/// If step 1 or 2 fails the partial file is deleted; if step 3 fails the
/// destination copy is deleted again. Success is only reported once the data
/// is durable at the destination and the source is gone, so a failure never
/// leaves two copies behind.
use crate::error::{Error, Result, MAX_COLLISION_PROBES};
use crate::model::{file_name_of, Category, RelocationOutcome, SkipReason};
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PARTIAL_SUFFIX: &str = ".tidydrop-partial";

/// How often a probed name may be taken by someone else before giving up.
const MAX_CLAIM_ATTEMPTS: u32 = 16;

/// Moves files into category folders under a fixed root.
#[derive(Debug, Clone)]
pub struct Relocator {
    root: PathBuf,
}

impl Relocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that files of `label` are moved into.
    pub fn category_dir(&self, label: &str) -> PathBuf {
        self.root.join(label)
    }

    /// Move `source` into the folder for `label` and describe what happened.
    ///
    /// `label` must be a concrete category; the sentinel is filtered out by
    /// the organizer before this is called. Errors are folded into a skipped
    /// outcome, a vanished source becomes [`SkipReason::Vanished`].
    pub fn relocate(&self, source: &Path, label: &str) -> RelocationOutcome {
        let name = file_name_of(source);
        let category = Category::from_label(label);
        match self.try_relocate(source, label) {
            Ok(destination) => {
                RelocationOutcome::moved(name, source.to_path_buf(), category, destination)
            }
            Err(err) => {
                if !err.is_not_found() {
                    warn!("Could not move {}: {err}", source.display());
                }
                RelocationOutcome::skipped(
                    name,
                    source.to_path_buf(),
                    category,
                    SkipReason::from_error(&err),
                )
            }
        }
    }

    /// Fallible core of [`relocate`](Self::relocate).
    pub fn try_relocate(&self, source: &Path, label: &str) -> Result<PathBuf> {
        // Re-check right before acting: the file may have been deleted or
        // replaced by something that is not a regular file.
        let meta = fs::symlink_metadata(source).map_err(|e| Error::from_io(source, e))?;
        if !meta.is_file() {
            return Err(Error::NotRegularFile(source.to_path_buf()));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| Error::NotFound(source.to_path_buf()))?;

        let dir = self.category_dir(label);
        fs::create_dir_all(&dir).map_err(|e| Error::from_io(&dir, e))?;

        let destination = move_into(source, &dir, file_name)?;
        debug!("Moved {} -> {}", source.display(), destination.display());
        Ok(destination)
    }
}

/// Find the first free name in `dir`: `name`, then `stem_1.ext`, `stem_2.ext`…
///
/// Linear probe bounded by [`MAX_COLLISION_PROBES`].
pub fn free_destination(dir: &Path, file_name: &OsStr) -> Result<PathBuf> {
    let candidate = dir.join(file_name);
    if !exists_no_follow(&candidate) {
        return Ok(candidate);
    }

    let as_path = Path::new(file_name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| file_name.to_os_string());
    let ext = as_path.extension().map(|e| e.to_os_string());

    for n in 1..=MAX_COLLISION_PROBES {
        let candidate = dir.join(suffixed_name(&stem, n, ext.as_deref()));
        if !exists_no_follow(&candidate) {
            return Ok(candidate);
        }
    }

    Err(Error::DestinationCollisionExhausted {
        dir: dir.to_path_buf(),
        name: file_name.to_string_lossy().into_owned(),
        probes: MAX_COLLISION_PROBES,
    })
}

fn suffixed_name(stem: &OsStr, n: u32, ext: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{n}"));
    if let Some(ext) = ext {
        name.push(".");
        name.push(ext);
    }
    name
}

/// A dangling symlink still occupies the name, so don't follow links.
fn exists_no_follow(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Move `source` to the first free `file_name` variant in `dir`.
fn move_into(source: &Path, dir: &Path, file_name: &OsStr) -> Result<PathBuf> {
    match claim_name(source, dir, file_name) {
        Err(Error::Io { source: err, .. }) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "Rename across volumes refused, copying {} instead",
                source.display()
            );
            copy_then_remove(source, dir, file_name)
        }
        other => other,
    }
}

/// Give `file` a free `file_name` variant in `dir`, probing again whenever
/// the chosen name is taken before it can be claimed.
fn claim_name(file: &Path, dir: &Path, file_name: &OsStr) -> Result<PathBuf> {
    for _ in 0..MAX_CLAIM_ATTEMPTS {
        let destination = free_destination(dir, file_name)?;
        match link_then_unlink(file, &destination) {
            Ok(()) => return Ok(destination),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!("{} was taken meanwhile, probing again", destination.display());
            }
            Err(err) => return Err(Error::from_io(file, err)),
        }
    }
    Err(Error::DestinationCollisionExhausted {
        dir: dir.to_path_buf(),
        name: file_name.to_string_lossy().into_owned(),
        probes: MAX_CLAIM_ATTEMPTS,
    })
}

/// Give `from` the new name `to` without ever replacing an existing `to`,
/// then drop the old name.
fn link_then_unlink(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {
            if let Err(err) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(err);
            }
            Ok(())
        }
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::AlreadyExists
                    | io::ErrorKind::CrossesDevices
                    | io::ErrorKind::NotFound
            ) =>
        {
            Err(err)
        }
        Err(err) => {
            debug!("Hard link refused ({err}), renaming instead");
            fs::rename(from, to)
        }
    }
}

fn copy_then_remove(source: &Path, dir: &Path, file_name: &OsStr) -> Result<PathBuf> {
    let failed = |reason: String| Error::CrossVolumeMoveFailed {
        from: source.to_path_buf(),
        to: dir.join(file_name),
        reason,
    };

    let partial = partial_path(dir, file_name);
    if let Err(err) = copy_durably(source, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(failed(format!("copy failed: {err}")));
    }

    let destination = match claim_name(&partial, dir, file_name) {
        Ok(destination) => destination,
        Err(err) => {
            let _ = fs::remove_file(&partial);
            return Err(failed(format!("could not finalise copy: {err}")));
        }
    };

    if let Err(err) = fs::remove_file(source) {
        // Leaving both copies would be a silent duplicate; undo the copy so
        // the source stays the only one.
        if let Err(undo) = fs::remove_file(&destination) {
            warn!(
                "Could not remove copied file {} after failed move: {undo}",
                destination.display()
            );
        }
        return Err(failed(format!("could not remove source: {err}")));
    }

    Ok(destination)
}

fn copy_durably(source: &Path, target: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut writer = File::create(target)?;
    io::copy(&mut reader, &mut writer)?;
    writer.sync_all()?;
    if let Ok(meta) = fs::metadata(source) {
        let _ = fs::set_permissions(target, meta.permissions());
    }
    Ok(())
}

fn partial_path(dir: &Path, file_name: &OsStr) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(file_name);
    name.push(PARTIAL_SUFFIX);
    dir.join(name)
}
