//! # Config Module
//!
//! TOML configuration of the heading convention, the semantic resolver backend
//! and the query service. Every section and key is optional.
//!
//! ```toml
//! [document]
//! heading_pattern = "(?i)^heading"
//!
//! [resolver]
//! backend = "ollama"
//! endpoint = "http://localhost:11434"
//! model = "mistral"
//!
//! [query]
//! database = "actuarial.duckdb"
//! ```
use crate::document::styles::StylePatternDetector;
use crate::error::ResultMessage;
use crate::error::RustyReportError;
use crate::query::DuckDbQueryService;
use crate::query::SqlSource;
use crate::resolver::CommandResolver;
use crate::resolver::OllamaResolver;
use crate::resolver::SemanticResolver;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Errors raised while validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'{0}' must name a command")]
    EmptyCommand(&'static str),

    #[error("'{0}' must be greater than zero")]
    ZeroTimeout(&'static str),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub document: DocumentConfig,
    pub resolver: ResolverConfig,
    pub query: QueryConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    /// Regular expression matched against paragraph style names to find headings
    pub heading_pattern: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            heading_pattern: StylePatternDetector::DEFAULT_PATTERN.to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolverBackend {
    /// Prompt piped to a local command
    #[default]
    Command,
    /// Ollama HTTP API
    Ollama,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub backend: ResolverBackend,
    pub command: Vec<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            backend: ResolverBackend::Command,
            command: vec![String::from("ollama"), String::from("run"), String::from("mistral")],
            endpoint: String::from("http://localhost:11434"),
            model: String::from("mistral"),
            timeout_secs: 120,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// DuckDB database file, or `:memory:`
    pub database: String,
    /// Statements run once after connecting, e.g. `ATTACH` or `CREATE VIEW`
    pub init_sql: Vec<String>,
    /// Command turning a prompt into SQL; prompts are SQL when empty
    pub sql_command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: String::from(":memory:"),
            init_sql: Vec::new(),
            sql_command: Vec::new(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Loads and validates a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RustyReportError> {
        let path = path.as_ref();
        fs::read_to_string(path)
            .map_err(RustyReportError::from)
            .and_then(|text| Self::from_toml(&text))
            .with_prefix(&format!("Load config '{}'", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self, RustyReportError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        debug!(backend = ?config.resolver.backend, database = %config.query.database, "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RustyReportError> {
        self.heading_detector()?;
        if self.resolver.timeout_secs == 0 {
            Err(ConfigError::ZeroTimeout("resolver.timeout_secs"))?
        }
        if self.query.timeout_secs == 0 {
            Err(ConfigError::ZeroTimeout("query.timeout_secs"))?
        }
        match self.resolver.backend {
            ResolverBackend::Command if self.resolver.command.is_empty() => Err(ConfigError::EmptyCommand("resolver.command"))?,
            ResolverBackend::Command => (),
            ResolverBackend::Ollama => {
                self.endpoint()?;
            }
        }
        Ok(())
    }

    pub fn heading_detector(&self) -> Result<StylePatternDetector, RustyReportError> {
        StylePatternDetector::new(&self.document.heading_pattern)
            .map_err(RustyReportError::from)
            .with_prefix("Invalid 'document.heading_pattern'")
    }

    fn endpoint(&self) -> Result<Url, RustyReportError> {
        Url::parse(&self.resolver.endpoint)
            .map_err(RustyReportError::from)
            .with_prefix(&format!("Invalid 'resolver.endpoint' '{}'", self.resolver.endpoint))
    }

    pub fn semantic_resolver(&self) -> Result<Box<dyn SemanticResolver>, RustyReportError> {
        let timeout = Duration::from_secs(self.resolver.timeout_secs);
        let resolver: Box<dyn SemanticResolver> = match self.resolver.backend {
            ResolverBackend::Command => Box::new(CommandResolver::new(self.resolver.command.clone(), timeout)),
            ResolverBackend::Ollama => Box::new(OllamaResolver::new(&self.endpoint()?, &self.resolver.model, timeout)?),
        };
        Ok(resolver)
    }

    pub fn query_service(&self) -> Result<DuckDbQueryService, RustyReportError> {
        let source = if self.query.sql_command.is_empty() {
            SqlSource::Literal
        } else {
            SqlSource::Command {
                command: self.query.sql_command.clone(),
                timeout: Duration::from_secs(self.query.timeout_secs),
            }
        };
        DuckDbQueryService::open(&self.query.database, &self.query.init_sql, source)
    }
}
