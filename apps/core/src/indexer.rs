use std::path::Path;

use tracing::{info, warn};

use crate::config::{Config, ResolverPolicy};
use crate::discovery::{
    DiscoverySource, ProgramDirectorySource, RegistrySource, SourceOutcome, StartMenuSource,
};
use crate::index_store;
use crate::model::CatalogEntry;
use crate::uninstall_registry::RegistryUninstallSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: &'static str,
    pub outcome: SourceOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    pub sources: Vec<SourceReport>,
    pub entries: Vec<CatalogEntry>,
    pub persisted: bool,
}

impl IndexReport {
    pub fn collected(&self) -> usize {
        self.sources
            .iter()
            .map(|report| report.outcome.entries().len())
            .sum()
    }
}

pub struct Indexer {
    sources: Vec<Box<dyn DiscoverySource>>,
    policy: ResolverPolicy,
}

impl Indexer {
    pub fn from_config(config: &Config) -> Self {
        Self::with_sources(
            vec![
                Box::new(RegistrySource::new(Box::new(RegistryUninstallSource))),
                Box::new(StartMenuSource::new(config.start_menu_roots.clone())),
                Box::new(ProgramDirectorySource::new(config.program_roots.clone())),
            ],
            config.policy.clone(),
        )
    }

    pub fn with_sources(sources: Vec<Box<dyn DiscoverySource>>, policy: ResolverPolicy) -> Self {
        Self { sources, policy }
    }

    pub fn collect(&self) -> (Vec<SourceReport>, Vec<CatalogEntry>) {
        let mut reports = Vec::with_capacity(self.sources.len());
        let mut all = Vec::new();
        for source in &self.sources {
            let outcome = source.collect(&self.policy);
            match &outcome {
                SourceOutcome::Collected(entries) => {
                    info!(source = source.source_name(), count = entries.len(), "source indexed")
                }
                SourceOutcome::Skipped(reason) => {
                    warn!(source = source.source_name(), %reason, "source skipped")
                }
            }
            all.extend(outcome.entries().iter().cloned());
            reports.push(SourceReport {
                source: source.source_name(),
                outcome,
            });
        }
        (reports, index_store::dedup_entries(all))
    }

    pub fn build_index(&self, catalog_path: &Path) -> IndexReport {
        let (sources, entries) = self.collect();
        let persisted = match index_store::save_catalog(catalog_path, &entries) {
            Ok(()) => true,
            Err(error) => {
                warn!(%error, "catalog not written");
                false
            }
        };
        info!(
            entries = entries.len(),
            path = %catalog_path.display(),
            "index built"
        );
        IndexReport {
            sources,
            entries,
            persisted,
        }
    }
}
