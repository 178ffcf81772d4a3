use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::index_store::{self, StringMap};
use crate::matcher::normalize;

pub const STATIC_ALIASES: &[(&str, &str)] = &[
    ("эскейп фромтарков", "escape from tarkov"),
    ("эскейп фром тарков", "escape from tarkov"),
    ("эскейп тарков", "escape from tarkov"),
    ("тарков", "escape from tarkov"),
    ("эскейп за бэкрумс", "escape the backrooms"),
    ("эскейп зэ бэкрумс", "escape the backrooms"),
    ("эскейп бэкрумс", "escape the backrooms"),
    ("эскейп за", "escape the backrooms"),
    ("вэлл пэпер энджин", "wallpaper engine"),
    ("вэлл пэпер энжен", "wallpaper engine"),
    ("валл пейпер энжин", "wallpaper engine"),
    ("валл пейпер", "wallpaper engine"),
    ("пей дей два", "payday 2"),
    ("пейдей два", "payday 2"),
    ("пей дей 2", "payday 2"),
    ("пейдей 2", "payday 2"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasTier {
    Static,
    Dynamic,
}

#[derive(Debug, Clone)]
pub struct AliasStore {
    static_aliases: StringMap,
    dynamic: StringMap,
    path: Option<PathBuf>,
}

impl Default for AliasStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AliasStore {
    pub fn in_memory() -> Self {
        Self {
            static_aliases: normalized_pairs(STATIC_ALIASES),
            dynamic: StringMap::new(),
            path: None,
        }
    }

    pub fn open(path: &Path) -> Self {
        Self {
            dynamic: normalize_map(index_store::load_map_or_empty(path)),
            path: Some(path.to_path_buf()),
            ..Self::in_memory()
        }
    }

    pub fn lookup(&self, phrase: &str) -> Option<&str> {
        self.lookup_with_tier(phrase).map(|(target, _)| target)
    }

    pub fn lookup_with_tier(&self, phrase: &str) -> Option<(&str, AliasTier)> {
        let key = normalize(phrase);
        if key.is_empty() {
            return None;
        }
        if let Some(target) = self.static_aliases.get(&key) {
            return Some((target.as_str(), AliasTier::Static));
        }
        self.dynamic
            .get(&key)
            .map(|target| (target.as_str(), AliasTier::Dynamic))
    }

    pub fn teach(&mut self, spoken: &str, canonical: &str) -> bool {
        let spoken = normalize(spoken);
        let canonical = normalize(canonical);
        if spoken.is_empty() || canonical.is_empty() {
            return false;
        }

        let mut merged = self.dynamic.clone();
        if let Some(path) = &self.path {
            merged.extend(normalize_map(index_store::load_map_or_empty(path)));
        }

        if merged.get(&spoken) == Some(&canonical) {
            self.dynamic = merged;
            return false;
        }

        merged.insert(spoken.clone(), canonical.clone());
        if let Some(path) = &self.path {
            match index_store::save_map(path, &merged) {
                Ok(()) => info!(spoken = %spoken, canonical = %canonical, "alias learned"),
                Err(error) => warn!(%error, "alias kept in memory only"),
            }
        }
        self.dynamic = merged;
        true
    }

    pub fn static_aliases(&self) -> &StringMap {
        &self.static_aliases
    }

    pub fn dynamic_aliases(&self) -> &StringMap {
        &self.dynamic
    }
}

fn normalized_pairs(pairs: &[(&str, &str)]) -> StringMap {
    pairs
        .iter()
        .map(|(spoken, canonical)| (normalize(spoken), normalize(canonical)))
        .filter(|(spoken, canonical)| !spoken.is_empty() && !canonical.is_empty())
        .collect()
}

fn normalize_map(map: StringMap) -> StringMap {
    map.into_iter()
        .map(|(spoken, canonical)| (normalize(&spoken), normalize(&canonical)))
        .filter(|(spoken, canonical)| !spoken.is_empty() && !canonical.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{AliasStore, AliasTier};
    use crate::index_store::load_map;

    #[test]
    fn static_table_is_normalized_and_preferred() {
        let mut store = AliasStore::in_memory();
        assert_eq!(store.lookup("Тарков!"), Some("escape from tarkov"));

        store.teach("тарков", "tarkov arena");
        assert_eq!(
            store.lookup_with_tier("тарков"),
            Some(("escape from tarkov", AliasTier::Static))
        );
    }

    #[test]
    fn teach_persists_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let mut store = AliasStore::open(&path);

        assert!(store.teach("Дискорд", "Discord"));
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(!store.teach("дискорд", "discord"));
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.lookup("дискорд"), Some("discord"));
        assert_eq!(load_map(&path).unwrap().len(), 1);
    }

    #[test]
    fn teach_ignores_empty_sides() {
        let mut store = AliasStore::in_memory();
        assert!(!store.teach("  ", "discord"));
        assert!(!store.teach("дискорд", "?!"));
        assert!(store.dynamic_aliases().is_empty());
    }

    #[test]
    fn teach_merges_entries_written_by_another_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        let mut first = AliasStore::open(&path);
        let mut second = AliasStore::open(&path);

        first.teach("телега", "telegram");
        second.teach("хром", "google chrome");

        let reopened = AliasStore::open(&path);
        assert_eq!(reopened.lookup("телега"), Some("telegram"));
        assert_eq!(reopened.lookup("хром"), Some("google chrome"));
    }

    #[test]
    fn unparsable_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, "[[[").unwrap();

        let store = AliasStore::open(&path);
        assert!(store.dynamic_aliases().is_empty());
    }
}
