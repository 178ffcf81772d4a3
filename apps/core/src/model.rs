use serde::{Deserialize, Serialize};

use crate::system_commands;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

impl CatalogEntry {
    pub fn new(name: &str, path: &str) -> Self {
        Self::from_owned(name.to_string(), path.to_string())
    }

    pub fn from_owned(name: String, path: String) -> Self {
        Self {
            name: canonical_name(&name),
            path: path.trim().to_string(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.path.is_empty()
    }
}

pub fn canonical_name(display_name: &str) -> String {
    display_name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Catalog,
    SystemCommand,
    Cache,
    Registry,
    StartMenu,
    FileSystem,
}

impl ResolutionSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::SystemCommand => "system-command",
            Self::Cache => "cache",
            Self::Registry => "registry",
            Self::StartMenu => "start-menu",
            Self::FileSystem => "filesystem",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target: String,
    pub source: ResolutionSource,
    pub score: Option<f64>,
}

impl Resolution {
    pub fn new(target: impl Into<String>, source: ResolutionSource) -> Self {
        Self {
            target: target.into(),
            source,
            score: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn is_system_command(&self) -> bool {
        system_commands::is_bare_token(&self.target)
    }
}
