use thiserror::Error;
use tracing::info;

use crate::action_executor::{self, LaunchError};
use crate::aliases::AliasTier;
use crate::app_cache::CachedApp;
use crate::config::{validate, Config, ConfigError};
use crate::indexer::{IndexReport, Indexer};
use crate::model::Resolution;
use crate::resolver::Resolver;
use crate::validator;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error("not a valid executable: {0}")]
    RejectedPath(String),
    #[error("unsupported action tag: {0}")]
    UnsupportedAction(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTag {
    OpenApp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasListing {
    pub spoken: String,
    pub canonical: String,
    pub tier: AliasTier,
}

pub fn parse_action_tag(payload: &str) -> Result<ActionTag, ServiceError> {
    let unsupported = || ServiceError::UnsupportedAction(payload.trim().to_string());
    let inner = payload
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    let (kind, argument) = inner.split_once(':').ok_or_else(unsupported)?;
    let argument = argument.trim();
    if !kind.trim().eq_ignore_ascii_case("open_app") || argument.is_empty() {
        return Err(unsupported());
    }
    Ok(ActionTag::OpenApp(argument.to_string()))
}

pub struct CoreService {
    config: Config,
    resolver: Resolver,
    indexer: Indexer,
}

impl CoreService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        validate(&config)?;
        let resolver = Resolver::from_config(&config);
        let indexer = Indexer::from_config(&config);
        Ok(Self {
            config,
            resolver,
            indexer,
        })
    }

    pub fn with_parts(
        config: Config,
        resolver: Resolver,
        indexer: Indexer,
    ) -> Result<Self, ServiceError> {
        validate(&config)?;
        Ok(Self {
            config,
            resolver,
            indexer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolve(&mut self, name: &str) -> Option<Resolution> {
        self.resolver.resolve(name)
    }

    pub fn launch(&mut self, name: &str, args: &[String]) -> Result<Resolution, ServiceError> {
        Ok(action_executor::launch(&mut self.resolver, name, args)?)
    }

    pub fn open_app(&mut self, name: &str) -> bool {
        action_executor::open_app(&mut self.resolver, name)
    }

    pub fn rebuild_index(&mut self) -> IndexReport {
        let report = self.indexer.build_index(&self.config.catalog_path);
        self.resolver.replace_catalog(report.entries.clone());
        report
    }

    pub fn teach_alias(&mut self, spoken: &str, canonical: &str) -> bool {
        self.resolver.aliases_mut().teach(spoken, canonical)
    }

    pub fn list_aliases(&self) -> Vec<AliasListing> {
        let aliases = self.resolver.aliases();
        let rows = |map: &crate::index_store::StringMap, tier: AliasTier| {
            map.iter()
                .map(|(spoken, canonical)| AliasListing {
                    spoken: spoken.clone(),
                    canonical: canonical.clone(),
                    tier,
                })
                .collect::<Vec<_>>()
        };
        let mut listing = rows(aliases.static_aliases(), AliasTier::Static);
        listing.extend(rows(aliases.dynamic_aliases(), AliasTier::Dynamic));
        listing
    }

    pub fn register_app(&mut self, name: &str, path: &str) -> Result<bool, ServiceError> {
        if !validator::is_valid_str(path.trim()) {
            return Err(ServiceError::RejectedPath(path.trim().to_string()));
        }
        let changed = self.resolver.cache_mut().register(name, path);
        if changed {
            info!(name, path, "application registered");
        }
        Ok(changed)
    }

    pub fn registered_apps(&mut self) -> Vec<CachedApp> {
        self.resolver.cache_mut().list()
    }

    pub fn execute_action_tag(&mut self, payload: &str) -> Result<Resolution, ServiceError> {
        match parse_action_tag(payload)? {
            ActionTag::OpenApp(name) => self.launch(&name, &[]),
        }
    }
}
