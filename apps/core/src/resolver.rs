use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::aliases::AliasStore;
use crate::app_cache::AppPathCache;
use crate::config::{Config, ResolverPolicy};
use crate::discovery;
use crate::index_store;
use crate::matcher::{match_score, normalize, transliterate, PreparedQuery};
use crate::model::{CatalogEntry, Resolution, ResolutionSource};
use crate::system_commands;
use crate::uninstall_registry::{self, RegistryUninstallSource, UninstallSource};
use crate::validator;

const LOGGED_CANDIDATES: usize = 5;

#[derive(Default)]
pub struct LiveSources {
    pub uninstall: Option<Box<dyn UninstallSource>>,
    pub start_menu_roots: Vec<PathBuf>,
    pub search_roots: Vec<PathBuf>,
}

impl LiveSources {
    pub fn from_config(config: &Config) -> Self {
        Self {
            uninstall: Some(Box::new(RegistryUninstallSource)),
            start_menu_roots: config.start_menu_roots.clone(),
            search_roots: config.search_roots.clone(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

pub struct Resolver {
    catalog: Vec<CatalogEntry>,
    aliases: AliasStore,
    cache: AppPathCache,
    live: LiveSources,
    policy: ResolverPolicy,
}

impl Resolver {
    pub fn new(
        catalog: Vec<CatalogEntry>,
        aliases: AliasStore,
        cache: AppPathCache,
        live: LiveSources,
        policy: ResolverPolicy,
    ) -> Self {
        Self {
            catalog,
            aliases,
            cache,
            live,
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            index_store::load_catalog_or_empty(&config.catalog_path),
            AliasStore::open(&config.aliases_path),
            AppPathCache::open(&config.cache_path),
            LiveSources::from_config(config),
            config.policy.clone(),
        )
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn replace_catalog(&mut self, catalog: Vec<CatalogEntry>) {
        self.catalog = catalog;
    }

    pub fn aliases(&self) -> &AliasStore {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasStore {
        &mut self.aliases
    }

    pub fn cache_mut(&mut self) -> &mut AppPathCache {
        &mut self.cache
    }

    pub fn resolve_path(&mut self, spoken: &str) -> Option<String> {
        self.resolve(spoken).map(|resolution| resolution.target)
    }

    pub fn resolve(&mut self, spoken: &str) -> Option<Resolution> {
        let spoken = normalize(spoken);
        if spoken.is_empty() {
            return None;
        }

        let query = match self.aliases.lookup_with_tier(&spoken) {
            Some((target, tier)) => {
                debug!(spoken = %spoken, alias = target, ?tier, "alias substituted");
                target.to_string()
            }
            None => spoken.clone(),
        };
        let transliterated = transliterate(&query);

        if let Some(resolution) = self.match_catalog(&spoken, &query, &transliterated) {
            return Some(resolution);
        }

        if let Some(token) = system_commands::lookup(&query) {
            info!(query = %query, token, "system command");
            return Some(Resolution::new(token, ResolutionSource::SystemCommand));
        }

        if let Some(target) = self.cache.get(&query) {
            info!(query = %query, path = %target, "cache hit");
            return Some(Resolution::new(target, ResolutionSource::Cache));
        }

        let live = self
            .search_registry(&spoken)
            .map(|path| (path, ResolutionSource::Registry))
            .or_else(|| {
                discovery::find_shortcut_target(&self.live.start_menu_roots, &spoken)
                    .map(|path| (path, ResolutionSource::StartMenu))
            })
            .or_else(|| {
                discovery::search_filesystem(&self.live.search_roots, &spoken, &self.policy)
                    .found
                    .map(|path| (path, ResolutionSource::FileSystem))
            });

        match live {
            Some((path, source)) => Some(self.remember(&query, &path, source)),
            None => {
                info!(spoken = %spoken, "application not found");
                None
            }
        }
    }

    fn match_catalog(
        &mut self,
        spoken: &str,
        query: &str,
        transliterated: &str,
    ) -> Option<Resolution> {
        let ranked = rank_candidates(&self.catalog, query, transliterated, &self.policy);
        for (entry, score) in ranked.iter().take(LOGGED_CANDIDATES) {
            debug!(name = %entry.name, path = %entry.path, score, "catalog candidate");
        }

        let (entry, score) = ranked
            .into_iter()
            .find(|(entry, _)| validator::is_valid_str(&entry.path))?;
        if score < self.policy.acceptance_threshold {
            debug!(name = %entry.name, score, "best catalog match below threshold");
            return None;
        }

        let name = entry.name.clone();
        let path = entry.path.clone();
        info!(name = %name, path = %path, score, "catalog match");
        self.auto_teach(spoken, &name);
        Some(Resolution::new(path, ResolutionSource::Catalog).with_score(score))
    }

    fn auto_teach(&mut self, spoken: &str, canonical: &str) {
        let canonical = normalize(canonical);
        if canonical.is_empty() || canonical == spoken {
            return;
        }
        if self.aliases.lookup(spoken) == Some(canonical.as_str()) {
            return;
        }
        self.aliases.teach(spoken, &canonical);
    }

    fn search_registry(&self, spoken: &str) -> Option<PathBuf> {
        let source = self.live.uninstall.as_ref()?;
        let records = match source.records() {
            Ok(records) => records,
            Err(error) => {
                debug!(source = source.source_name(), %error, "live registry search skipped");
                return None;
            }
        };
        let found = uninstall_registry::records_matching(&records, spoken)
            .find_map(|record| uninstall_registry::derive_executable(record, &self.policy));
        found
    }

    fn remember(&mut self, query: &str, path: &Path, source: ResolutionSource) -> Resolution {
        let target = path.to_string_lossy().into_owned();
        info!(query = %query, path = %target, source = source.label(), "fallback hit");
        self.cache.register(query, &target);
        Resolution::new(target, source)
    }
}

pub fn rank_candidates<'a>(
    catalog: &'a [CatalogEntry],
    query: &str,
    transliterated: &str,
    policy: &ResolverPolicy,
) -> Vec<(&'a CatalogEntry, f64)> {
    let prepared = PreparedQuery::new(query, transliterated);
    let mut ranked: Vec<(&CatalogEntry, f64)> = catalog
        .iter()
        .map(|entry| (entry, match_score(&prepared, &entry.name, policy)))
        .filter(|(_, score)| *score > 0.0)
        .collect();
    ranked.sort_by(|left, right| right.1.total_cmp(&left.1));
    ranked
}
