use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ResolverPolicy;
use crate::exe_filter;
use crate::model::{canonical_name, CatalogEntry};
use crate::shortcut;
use crate::uninstall_registry::{self, UninstallSource};
use crate::validator;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("source i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Collected(Vec<CatalogEntry>),
    Skipped(String),
}

impl SourceOutcome {
    pub fn entries(&self) -> &[CatalogEntry] {
        match self {
            Self::Collected(entries) => entries,
            Self::Skipped(_) => &[],
        }
    }
}

pub trait DiscoverySource: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn discover(&self, policy: &ResolverPolicy) -> Result<Vec<CatalogEntry>, SourceError>;

    fn collect(&self, policy: &ResolverPolicy) -> SourceOutcome {
        match self.discover(policy) {
            Ok(entries) => SourceOutcome::Collected(entries),
            Err(error) => SourceOutcome::Skipped(error.to_string()),
        }
    }
}

pub struct RegistrySource {
    uninstall: Box<dyn UninstallSource>,
}

impl RegistrySource {
    pub fn new(uninstall: Box<dyn UninstallSource>) -> Self {
        Self { uninstall }
    }
}

impl DiscoverySource for RegistrySource {
    fn source_name(&self) -> &'static str {
        "registry"
    }

    fn discover(&self, policy: &ResolverPolicy) -> Result<Vec<CatalogEntry>, SourceError> {
        let records = self.uninstall.records()?;
        let entries = records
            .iter()
            .filter(|record| !record.display_name.trim().is_empty())
            .filter_map(|record| {
                let path = uninstall_registry::derive_executable(record, policy)?;
                Some(CatalogEntry::from_owned(
                    record.display_name.clone(),
                    path.to_string_lossy().into_owned(),
                ))
            })
            .collect();
        Ok(entries)
    }
}

pub struct StartMenuSource {
    roots: Vec<PathBuf>,
}

impl StartMenuSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl DiscoverySource for StartMenuSource {
    fn source_name(&self) -> &'static str {
        "start-menu"
    }

    fn discover(&self, policy: &ResolverPolicy) -> Result<Vec<CatalogEntry>, SourceError> {
        let roots = existing_roots(&self.roots, self.source_name())?;
        let mut entries = Vec::new();
        for link in roots.iter().flat_map(|root| shortcut_files(root)) {
            let Ok(target) = shortcut::resolve_target(&link) else {
                continue;
            };
            if !validator::is_valid(&target)
                || !exe_filter::is_main_executable(&target, policy.min_main_exe_bytes)
            {
                continue;
            }
            let name = link
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(CatalogEntry::from_owned(
                name,
                target.to_string_lossy().into_owned(),
            ));
        }
        Ok(entries)
    }
}

pub struct ProgramDirectorySource {
    roots: Vec<PathBuf>,
}

impl ProgramDirectorySource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

impl DiscoverySource for ProgramDirectorySource {
    fn source_name(&self) -> &'static str {
        "program-directories"
    }

    fn discover(&self, policy: &ResolverPolicy) -> Result<Vec<CatalogEntry>, SourceError> {
        let roots = existing_roots(&self.roots, self.source_name())?;
        let mut entries = Vec::new();
        for root in roots {
            let mut folders: Vec<PathBuf> = match std::fs::read_dir(root) {
                Ok(listing) => listing
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.path())
                    .filter(|path| path.is_dir())
                    .collect(),
                Err(error) => {
                    debug!(root = %root.display(), %error, "program root unreadable");
                    continue;
                }
            };
            folders.sort();

            for folder in folders {
                let candidates = WalkDir::new(&folder)
                    .follow_links(false)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
                    .filter(|path| {
                        exe_filter::is_real_candidate(path, policy)
                            && !exe_filter::is_non_app_name(path)
                    });
                let Some(best) = exe_filter::newest(candidates) else {
                    continue;
                };
                entries.push(CatalogEntry::from_owned(
                    folder_display_name(&folder),
                    best.to_string_lossy().into_owned(),
                ));
            }
        }
        Ok(entries)
    }
}

pub fn folder_display_name(folder: &Path) -> String {
    let raw = folder
        .file_name()
        .map(|name| name.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default();
    canonical_name(&raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn find_shortcut_target(roots: &[PathBuf], spoken: &str) -> Option<PathBuf> {
    let needle = spoken.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| shortcut_files(root))
        .filter(|link| exe_filter::file_stem_lower(link).contains(&needle))
        .filter_map(|link| shortcut::resolve_target(&link).ok())
        .find(|target| validator::is_valid(target))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub inspected: usize,
    pub found: Option<PathBuf>,
}

pub fn search_filesystem(roots: &[PathBuf], spoken: &str, policy: &ResolverPolicy) -> WalkOutcome {
    let needle = spoken.trim().to_lowercase();
    let compact = needle.replace(' ', "");
    let mut outcome = WalkOutcome::default();
    if needle.is_empty() {
        return outcome;
    }

    for root in roots.iter().filter(|root| root.is_dir()) {
        let mut inspected_here = 0_usize;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file());

        for entry in walker {
            if inspected_here >= policy.max_walk_inspected {
                debug!(root = %root.display(), inspected_here, "walk cap reached");
                break;
            }
            let path = entry.path();
            if !exe_filter::has_exe_extension(path) {
                continue;
            }
            inspected_here += 1;
            outcome.inspected += 1;

            let stem = exe_filter::file_stem_lower(path);
            if !stem.contains(&needle) && !stem.contains(&compact) {
                continue;
            }
            let big_enough = entry
                .metadata()
                .map(|meta| meta.len() > policy.min_walk_exe_bytes)
                .unwrap_or(false);
            if big_enough && validator::is_valid(path) {
                outcome.found = Some(path.to_path_buf());
                return outcome;
            }
        }
    }
    outcome
}

fn shortcut_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| shortcut::is_shortcut(path))
}

fn existing_roots<'a>(roots: &'a [PathBuf], source: &str) -> Result<Vec<&'a PathBuf>, SourceError> {
    let existing: Vec<&PathBuf> = roots.iter().filter(|root| root.exists()).collect();
    if !existing.iter().any(|root| root.is_dir()) {
        return Err(SourceError::Unavailable(format!("{source}: no root directory exists")));
    }
    Ok(existing)
}
