use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::index_store::{self, StringMap};
use crate::matcher::normalize;
use crate::system_commands;
use crate::validator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedApp {
    pub name: String,
    pub path: String,
    pub valid: bool,
}

// Keyed by normalized name; the backing file is read on first use.
#[derive(Debug, Clone, Default)]
pub struct AppPathCache {
    path: Option<PathBuf>,
    entries: Option<StringMap>,
}

impl AppPathCache {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Some(StringMap::new()),
        }
    }

    pub fn open(path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            entries: None,
        }
    }

    pub fn get(&mut self, name: &str) -> Option<String> {
        let key = normalize(name);
        let target = self.entries().get(&key)?.clone();
        if is_trusted(&target) {
            Some(target)
        } else {
            debug!(name = %key, path = %target, "cached path no longer valid");
            None
        }
    }

    pub fn register(&mut self, name: &str, path: &str) -> bool {
        let key = normalize(name);
        let path = path.trim().to_string();
        if key.is_empty() || !validator::is_valid_str(&path) {
            return false;
        }

        let mut merged = self.entries().clone();
        if let Some(file) = &self.path {
            merged.extend(load_normalized(file));
        }
        if merged.get(&key) == Some(&path) {
            self.entries = Some(merged);
            return false;
        }

        merged.insert(key, path);
        if let Some(file) = &self.path {
            if let Err(error) = index_store::save_map(file, &merged) {
                warn!(%error, "cache entry kept in memory only");
            }
        }
        self.entries = Some(merged);
        true
    }

    pub fn list(&mut self) -> Vec<CachedApp> {
        self.entries()
            .iter()
            .map(|(name, path)| CachedApp {
                name: name.clone(),
                path: path.clone(),
                valid: is_trusted(path),
            })
            .collect()
    }

    fn entries(&mut self) -> &StringMap {
        let path = self.path.clone();
        self.entries.get_or_insert_with(|| {
            path.map(|path| load_normalized(&path)).unwrap_or_default()
        })
    }
}

// The file is hand-editable; keys get the same normalization lookups use.
fn load_normalized(path: &Path) -> StringMap {
    index_store::load_map_or_empty(path)
        .into_iter()
        .map(|(name, target)| (normalize(&name), target.trim().to_string()))
        .filter(|(name, target)| !name.is_empty() && !target.is_empty())
        .collect()
}

fn is_trusted(target: &str) -> bool {
    validator::is_valid_str(target) || system_commands::is_bare_token(target)
}
