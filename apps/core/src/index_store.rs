use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

use crate::model::CatalogEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type StringMap = BTreeMap<String, String>;

pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, StoreError> {
    let Some(raw) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    let parsed: Vec<CatalogEntry> = json5::from_str(&raw).map_err(|error| StoreError::Parse {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;

    let entries = parsed
        .into_iter()
        .map(|entry| CatalogEntry::from_owned(entry.name, entry.path))
        .filter(CatalogEntry::is_complete)
        .collect();
    Ok(dedup_entries(entries))
}

pub fn save_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(entries)?;
    write_atomic(path, json.as_bytes())
}

pub fn load_map(path: &Path) -> Result<StringMap, StoreError> {
    let Some(raw) = read_optional(path)? else {
        return Ok(StringMap::new());
    };
    json5::from_str(&raw).map_err(|error| StoreError::Parse {
        path: path.to_path_buf(),
        message: error.to_string(),
    })
}

pub fn save_map(path: &Path, map: &StringMap) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(map)?;
    write_atomic(path, json.as_bytes())
}

pub fn load_catalog_or_empty(path: &Path) -> Vec<CatalogEntry> {
    load_catalog(path).unwrap_or_else(|error| {
        warn!(%error, "catalog unavailable; continuing with an empty catalog");
        Vec::new()
    })
}

pub fn load_map_or_empty(path: &Path) -> StringMap {
    load_map(path).unwrap_or_else(|error| {
        warn!(%error, "store unavailable; continuing with an empty map");
        StringMap::new()
    })
}

pub fn dedup_entries(entries: Vec<CatalogEntry>) -> Vec<CatalogEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert((entry.name.clone(), entry.path.clone())))
        .collect()
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => Ok(Some(raw)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_error = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_error)?;

    let mut temp = NamedTempFile::new_in(parent).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.persist(path)
        .map_err(|error| write_error(error.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{dedup_entries, load_catalog, load_map, save_catalog, save_map, StringMap};
    use crate::model::CatalogEntry;

    #[test]
    fn catalog_survives_round_trip_with_cyrillic_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app_index.json");
        let entries = vec![
            CatalogEntry::new("Телеграм", "C:\\Apps\\Telegram.exe"),
            CatalogEntry::new("steam", "C:\\Steam\\steam.exe"),
        ];

        save_catalog(&path, &entries).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("телеграм"));
        assert_eq!(load_catalog(&path).unwrap(), entries);
    }

    #[test]
    fn catalog_reader_tolerates_comments_and_drops_incomplete_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app_index.json");
        std::fs::write(
            &path,
            r#"[
                // hand-edited
                { "name": " Discord ", "path": "C:\\Discord\\Discord.exe" },
                { "name": "", "path": "C:\\Nameless.exe" },
                { "path": "C:\\Missing.exe" },
                { "name": "discord", "path": "C:\\Discord\\Discord.exe" },
            ]"#,
        )
        .unwrap();

        let entries = load_catalog(&path).unwrap();
        assert_eq!(entries, vec![CatalogEntry::new("discord", "C:\\Discord\\Discord.exe")]);
    }

    #[test]
    fn missing_and_blank_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let blank = dir.path().join("blank.json");
        std::fs::write(&blank, "  \n").unwrap();

        assert!(load_catalog(&dir.path().join("absent.json")).unwrap().is_empty());
        assert!(load_map(&blank).unwrap().is_empty());
    }

    #[test]
    fn unparsable_map_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_map(&path).is_err());
    }

    #[test]
    fn map_round_trip_overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apps.json");
        let mut map = StringMap::new();
        map.insert("obs".into(), "C:\\obs\\obs64.exe".into());
        save_map(&path, &map).unwrap();

        map.clear();
        map.insert("vlc".into(), "C:\\VLC\\vlc.exe".into());
        save_map(&path, &map).unwrap();

        assert_eq!(load_map(&path).unwrap(), map);
    }

    #[test]
    fn dedup_keeps_same_name_with_different_paths() {
        let entries = vec![
            CatalogEntry::new("code", "C:\\a\\Code.exe"),
            CatalogEntry::new("code", "C:\\b\\Code.exe"),
            CatalogEntry::new("code", "C:\\a\\Code.exe"),
        ];
        assert_eq!(dedup_entries(entries).len(), 2);
    }
}
