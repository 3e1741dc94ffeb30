//! Filesystem helpers: path resolution at the boundary (§6) and the
//! small atomic-write primitives the compiler needs (§4.7).
//!
//! Grounded in the teacher's `util.rs`, which wraps every filesystem
//! call behind a `Result<_, Error>`-returning helper rather than
//! letting `io::Error` leak un-contextualized.

use std::convert::{TryFrom, TryInto};
use std::fs;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Resolves a caller-supplied path the way the boundary contract in §6
/// demands: tilde expansion first, then absolute-path detection
/// (Unix `/...` or Windows drive-qualified `X:...`), and only then a
/// join against `cur_dir` for anything still relative.
///
/// This mirrors the original's `expandDir()` two-step order of
/// operations (`original_source/tests/test_windows_paths.py`): a path
/// is never both tilde-expanded *and* treated as relative to `cur_dir`.
pub fn expand_dir(cur_dir: &Path, path: &str) -> PathBuf {
    let expanded = expand_tilde(path);
    if is_absolute_path(&expanded) {
        PathBuf::from(expanded)
    } else {
        cur_dir.join(expanded)
    }
}

fn expand_tilde(path: &str) -> String {
    if path == "~" {
        return dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}

/// True for Unix-style `/...` paths and Windows drive-qualified
/// `X:...` paths, regardless of which OS we're compiled for — the
/// cache a corpus was compiled on need not match the one loading it.
fn is_absolute_path(path: &str) -> bool {
    if path.starts_with('/') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Opens `file` for writing, truncating/creating it and its parent
/// directories as needed.
pub(crate) fn create_file(file: &Path) -> Result<fs::File> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file)?)
}

/// Opens `file` for reading.
pub(crate) fn open_file_r(file: &Path) -> Result<fs::File> {
    Ok(fs::OpenOptions::new().read(true).open(file)?)
}

/// Reads exactly `n` bytes at `fpos`, failing loudly on a short read
/// rather than silently returning a truncated buffer.
pub(crate) fn read_buffer_at(fd: &mut fs::File, fpos: u64, n: u64) -> Result<Vec<u8>> {
    fd.seek(std::io::SeekFrom::Start(fpos))?;
    let mut buf = vec![0u8; n.try_into().unwrap()];
    fd.read_exact(&mut buf)?;
    Ok(buf)
}

/// Writes `bytes` to a temp file inside `dir` and atomically renames
/// it into place at `dst`, giving the compiler's write path (§4.7) the
/// "crashed compile leaves the previous good cache intact" guarantee.
pub(crate) fn atomic_write(dir: &Path, dst: &Path, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(".{}.tmp", uniq_suffix()));
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, dst)?;
    Ok(())
}

pub(crate) fn uniq_suffix() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    format!("{}-{}", pid, n)
}

/// Narrows a `u64` count into a smaller integer type used for array
/// lengths, surfacing a `CompilerFailure` rather than panicking if the
/// corpus genuinely overflows the target width.
pub(crate) fn try_narrow<T>(from: u64, what: &str) -> Result<T>
where
    T: TryFrom<u64>,
{
    T::try_from(from)
        .map_err(|_| Error::CompilerFailure(format!("{} does not fit the target width", what)))
}

#[cfg(test)]
#[path = "util_test.rs"]
mod util_test;
