use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Indentation of written dictionaries
const INDENT: &[u8] = b"    ";

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("Directory not found: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Failed to read directory '{}': {source}", dir.display())]
    ReadDir { dir: PathBuf, source: io::Error },
    #[error("Failed to read file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Failed to parse JSON from '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize '{}': {source}", path.display())]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write file '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Path of the dictionary file for a locale: `<dir>/<locale>.json`
pub fn dictionary_path(dir: &Path, locale: &str) -> PathBuf {
    dir.join(format!("{}.json", locale))
}

/// Load one dictionary file
///
/// The root may be any JSON value; non-object roots simply have nothing to
/// translate.
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON
pub fn load_dictionary(path: &Path) -> Result<Value, LoaderError> {
    let content = fs::read_to_string(path).map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoaderError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Find the target locales staged next to the source dictionary
///
/// Scans the directory for `*.json` files. The filename (without extension)
/// is the locale code, e.g. `zh-CN.json` -> `"zh-CN"`. The source locale is
/// excluded, and the result is sorted so repeated scans agree. File contents
/// are not read: staging an empty `de.json` is enough to request German.
///
/// # Errors
/// - Directory not found
/// - Directory read errors
pub fn discover_target_locales(dir: &Path, source_locale: &str) -> Result<Vec<String>, LoaderError> {
    if !dir.is_dir() {
        return Err(LoaderError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir_error = |source: io::Error| LoaderError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    };

    let mut locales = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();

        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            tracing::warn!("Skipping non UTF-8 filename: {}", path.display());
            continue;
        };

        if locale != source_locale {
            locales.push(locale.to_string());
        }
    }

    locales.sort();
    Ok(locales)
}

/// Serialize a dictionary with four-space indentation and a trailing newline
pub fn render_dictionary(tree: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    tree.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Write a dictionary, replacing any previous file atomically
///
/// The content goes to a hidden sibling file first and is renamed over the
/// destination, so a failed write never leaves a truncated dictionary.
pub fn write_dictionary(path: &Path, tree: &Value) -> Result<(), LoaderError> {
    let content = render_dictionary(tree).map_err(|source| LoaderError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.tmp", file_name));

    let write_error = |source: io::Error| LoaderError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Err(source) = write_synced(&staging, &content) {
        let _ = fs::remove_file(&staging);
        return Err(write_error(source));
    }
    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(write_error(source));
    }

    Ok(())
}

/// Write `content` and flush it to disk before the caller renames the file
fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
