//! Filesystem helpers shared by the store and the CLI.
//!
//! Every helper resolves paths through `cap-std` directories opened with
//! ambient authority, so callers never touch `std::fs` directly.
#![forbid(unsafe_code)]

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read};

/// Read a UTF-8 text file into memory.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be opened or does
/// not contain valid UTF-8.
pub fn read_utf8_file(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Report whether `path` exists and is a regular file.
///
/// # Errors
///
/// Returns the I/O error raised while inspecting the parent directory or the
/// entry itself, including `NotFound` for missing paths.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path.file_name().ok_or_else(|| io::Error::other("path has no file name"))?;
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|meta| meta.is_file())
}

/// Create every missing directory above `path`.
///
/// Paths without a parent, or whose parent is the filesystem root, are left
/// untouched.
///
/// # Errors
///
/// Returns the I/O error raised while opening the base directory or creating
/// the missing components.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() {
        return Ok(());
    }

    let (base_dir, relative) = split_base(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Split `parent` into an ambient base directory and the path below it.
fn split_base(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let mut base = Utf8PathBuf::new();
    let mut relative = Utf8PathBuf::new();
    for component in parent.components() {
        match component {
            Utf8Component::Prefix(_) | Utf8Component::RootDir if relative.as_str().is_empty() => {
                base.push(component.as_str());
            }
            other => relative.push(other.as_str()),
        }
    }
    if base.as_str().is_empty() {
        base.push(".");
    }

    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    Ok((dir, relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn utf8(dir: &TempDir, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(relative)).expect("utf-8 path")
    }

    #[rstest]
    fn creates_nested_parent_directories(temp_dir: TempDir) {
        let target = utf8(&temp_dir, "a/b/c/map.db");
        ensure_parent_dir(&target).expect("create parents");
        assert!(target.parent().is_some_and(Utf8Path::is_dir));
    }

    #[rstest]
    fn reads_document_contents(temp_dir: TempDir) {
        let target = utf8(&temp_dir, "way.osm");
        std::fs::write(target.as_std_path(), "<osm/>").expect("write document");
        assert_eq!(read_utf8_file(&target).expect("read document"), "<osm/>");
    }

    #[rstest]
    fn distinguishes_files_from_directories(temp_dir: TempDir) {
        let file = utf8(&temp_dir, "way.osm");
        std::fs::write(file.as_std_path(), "<osm/>").expect("write document");
        let dir = utf8(&temp_dir, "nested");
        std::fs::create_dir(dir.as_std_path()).expect("create dir");

        assert!(file_is_file(&file).expect("inspect file"));
        assert!(!file_is_file(&dir).expect("inspect dir"));
    }

    #[rstest]
    fn missing_file_reports_not_found(temp_dir: TempDir) {
        let missing = utf8(&temp_dir, "missing.osm");
        let err = file_is_file(&missing).expect_err("missing file should fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
