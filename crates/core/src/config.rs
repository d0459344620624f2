//! Configuration management for the Agentic RAG system.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.agentic/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. The configuration is workspace-centric: relative
//! directories resolve against the workspace root and runtime state lives
//! under `.agentic/`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const AGENTIC_DIR: &str = ".agentic";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .agentic/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat LLM provider ("groq", "openai", "ollama")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Default sampling temperature for the chat model
    pub temperature: f32,

    /// Explicit API key for the chat provider
    pub api_key: Option<String>,

    /// Optional endpoint override for the chat provider
    pub endpoint: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub json_logs: bool,

    pub rag: RagSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,

    /// Named provider configurations from config.yaml
    pub providers: HashMap<String, ProviderConfig>,
}

/// Retrieval and workflow tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RagSettings {
    /// Upper bound on rewrite/generate/evaluate rounds
    pub max_iterations: u32,
    pub retrieval_top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Cosine similarity floor for retrieved chunks; 0.0 disables the cutoff
    pub min_relevance_score: f32,
    pub documents_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            retrieval_top_k: 5,
            chunk_size: 1000,
            chunk_overlap: 200,
            min_relevance_score: 0.0,
            documents_dir: PathBuf::from("data/documents"),
            data_dir: PathBuf::from(AGENTIC_DIR).join("data"),
        }
    }
}

/// Embedding provider selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "trigram" (offline, deterministic) or "ollama"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Web search provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    pub tavily_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            serpapi_api_key: None,
            max_results: 5,
        }
    }
}

/// Conversation session limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSettings {
    pub ttl_hours: u64,
    /// Messages kept per thread in storage
    pub max_session_messages: usize,
    /// Messages sent to the LLM as conversation context
    pub max_context_messages: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            max_session_messages: 50,
            max_context_messages: 10,
        }
    }
}

/// REST server binding and access control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Accepted `X-API-Key` values; empty means development mode
    pub api_keys: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_keys: Vec::new(),
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// Hosted OpenAI-compatible API (Groq, OpenAI)
    Hosted {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    rag: Option<RagSettings>,
    embedding: Option<EmbeddingSettings>,
    search: Option<SearchSettings>,
    session: Option<SessionSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmSection {
    active_provider: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    #[serde(default)]
    providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "groq".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.4,
            api_key: None,
            endpoint: None,
            log_level: None,
            verbose: false,
            no_color: false,
            json_logs: false,
            rag: RagSettings::default(),
            embedding: EmbeddingSettings::default(),
            search: SearchSettings::default(),
            session: SessionSettings::default(),
            server: ServerSettings::default(),
            providers: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and the process environment.
    ///
    /// Environment variables:
    /// - `AGENTIC_WORKSPACE`, `AGENTIC_CONFIG`: where to look
    /// - `AGENTIC_PROVIDER`, `AGENTIC_MODEL`, `AGENTIC_TEMPERATURE`: chat model
    /// - `AGENTIC_API_KEY`: explicit key for the chat provider
    /// - `AGENTIC_LOG_LEVEL`: log level
    /// - `AGENTIC_MAX_ITERATIONS`, `AGENTIC_TOP_K`, `AGENTIC_CHUNK_SIZE`,
    ///   `AGENTIC_CHUNK_OVERLAP`, `AGENTIC_DOCUMENTS_DIR`: retrieval tuning
    /// - `TAVILY_API_KEY`, `SERPAPI_API_KEY`: web search providers
    /// - `NO_COLOR`: disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use agentic_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with_env(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] but reads variables through `env`.
    pub fn load_with_env<F>(env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = env("AGENTIC_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = env("AGENTIC_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.agentic_dir().join("config.yaml"));

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        config.apply_env(&env)?;

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            self.workspace = PathBuf::from(path);
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.json_logs = json;
            }
        }

        if let Some(llm) = file.llm {
            if let Some(active) = llm.active_provider {
                self.provider = active;
            }

            // Model from the active provider entry, unless set explicitly
            if let Some(provider_config) = llm.providers.get(&self.provider) {
                match provider_config {
                    ProviderConfig::Hosted {
                        model, endpoint, ..
                    } => {
                        self.model = model.clone();
                        if endpoint.is_some() {
                            self.endpoint = endpoint.clone();
                        }
                    }
                    ProviderConfig::Ollama {
                        model, endpoint, ..
                    } => {
                        self.model = model.clone();
                        self.endpoint = Some(endpoint.clone());
                    }
                }
            }

            if let Some(model) = llm.model {
                self.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.temperature = temperature;
            }

            self.providers = llm.providers;
        }

        if let Some(rag) = file.rag {
            self.rag = rag;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(search) = file.search {
            self.search = search;
        }
        if let Some(session) = file.session {
            self.session = session;
        }
        if let Some(server) = file.server {
            self.server = server;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Apply environment variable overrides.
    fn apply_env<F>(&mut self, env: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = env("AGENTIC_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = env("AGENTIC_MODEL") {
            self.model = model;
        }
        if let Some(value) = env("AGENTIC_TEMPERATURE") {
            self.temperature = parse_env("AGENTIC_TEMPERATURE", &value)?;
        }
        if let Some(key) = env("AGENTIC_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(level) = env("AGENTIC_LOG_LEVEL") {
            self.log_level = Some(level);
        }
        if let Some(value) = env("AGENTIC_MAX_ITERATIONS") {
            self.rag.max_iterations = parse_env("AGENTIC_MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = env("AGENTIC_TOP_K") {
            self.rag.retrieval_top_k = parse_env("AGENTIC_TOP_K", &value)?;
        }
        if let Some(value) = env("AGENTIC_CHUNK_SIZE") {
            self.rag.chunk_size = parse_env("AGENTIC_CHUNK_SIZE", &value)?;
        }
        if let Some(value) = env("AGENTIC_CHUNK_OVERLAP") {
            self.rag.chunk_overlap = parse_env("AGENTIC_CHUNK_OVERLAP", &value)?;
        }
        if let Some(dir) = env("AGENTIC_DOCUMENTS_DIR") {
            self.rag.documents_dir = PathBuf::from(dir);
        }
        if let Some(key) = env("TAVILY_API_KEY").filter(|k| !k.is_empty()) {
            self.search.tavily_api_key = Some(key);
        }
        if let Some(key) = env("SERPAPI_API_KEY").filter(|k| !k.is_empty()) {
            self.search.serpapi_api_key = Some(key);
        }
        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }
        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        json_logs: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if json_logs {
            self.json_logs = true;
        }

        self
    }

    /// Get the path to the .agentic directory.
    pub fn agentic_dir(&self) -> PathBuf {
        self.workspace.join(AGENTIC_DIR)
    }

    /// Ensure the .agentic directory exists.
    pub fn ensure_agentic_dir(&self) -> AppResult<()> {
        let dir = self.agentic_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", AGENTIC_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Directory scanned for documents to index.
    pub fn documents_dir(&self) -> PathBuf {
        self.resolve(&self.rag.documents_dir)
    }

    /// Directory holding the vector index, manifest and session database.
    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.rag.data_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir().join("index.sqlite")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir().join("indexed_files.json")
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir().join("sessions.sqlite")
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get a named provider configuration.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }

    /// Resolve the API key for a provider.
    ///
    /// Order: explicit key, the provider's configured `apiKeyEnv`, then the
    /// conventional variable for known hosted providers.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        self.resolve_api_key_with_env(provider, |key| std::env::var(key).ok())
    }

    fn resolve_api_key_with_env<F>(&self, provider: &str, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        if let Some(ProviderConfig::Hosted { api_key_env, .. }) = self.get_provider_config(provider)
        {
            if let Some(key) = env(api_key_env).filter(|k| !k.is_empty()) {
                return Some(key);
            }
        }

        default_key_env(provider)
            .and_then(|var| env(var))
            .filter(|k| !k.is_empty())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["groq", "openai", "ollama"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.rag.max_iterations == 0 {
            return Err(AppError::Config(
                "maxIterations must be at least 1".to_string(),
            ));
        }

        if self.rag.retrieval_top_k == 0 {
            return Err(AppError::Config(
                "retrievalTopK must be at least 1".to_string(),
            ));
        }

        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }

        Ok(())
    }
}

/// Conventional API key variable for hosted providers.
fn default_key_env(provider: &str) -> Option<&'static str> {
    match provider {
        "groq" => Some("GROQ_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid value for {}: {:?}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.rag.max_iterations, 3);
        assert_eq!(config.rag.retrieval_top_k, 5);
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.session.max_context_messages, 10);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_agentic_dir_and_paths() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/ws");
        assert!(config.agentic_dir().ends_with(".agentic"));
        assert_eq!(
            config.documents_dir(),
            PathBuf::from("/ws/data/documents")
        );
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("/ws/.agentic/data/indexed_files.json")
        );

        config.rag.documents_dir = PathBuf::from("/abs/docs");
        assert_eq!(config.documents_dir(), PathBuf::from("/abs/docs"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
            true,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert!(overridden.json_logs);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_load_merges_yaml_then_env() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".agentic");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            r#"
llm:
  activeProvider: ollama
  temperature: 0.2
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.2
    groq:
      apiKeyEnv: MY_GROQ_KEY
      model: llama-3.1-8b-instant
rag:
  maxIterations: 5
  chunkSize: 500
  chunkOverlap: 50
session:
  maxContextMessages: 4
logging:
  level: warn
"#,
        )
        .unwrap();

        let workspace = temp.path().to_string_lossy().to_string();
        let env = env_from(&[
            ("AGENTIC_WORKSPACE", workspace.as_str()),
            ("AGENTIC_TOP_K", "7"),
            ("TAVILY_API_KEY", "tvly-123"),
        ]);

        let config = AppConfig::load_with_env(env).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.rag.max_iterations, 5);
        assert_eq!(config.rag.chunk_size, 500);
        // Unset keys in a section keep their defaults
        assert_eq!(config.rag.retrieval_top_k, 7);
        assert_eq!(config.session.max_context_messages, 4);
        assert_eq!(config.session.max_session_messages, 50);
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.search.tavily_api_key.as_deref(), Some("tvly-123"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_missing_workspace() {
        let env = env_from(&[("AGENTIC_WORKSPACE", "/definitely/not/here")]);
        assert!(matches!(
            AppConfig::load_with_env(env),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_load_rejects_bad_env_number() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let env = env_from(&[
            ("AGENTIC_WORKSPACE", workspace.as_str()),
            ("AGENTIC_MAX_ITERATIONS", "three"),
        ]);
        assert!(AppConfig::load_with_env(env).is_err());
    }

    #[test]
    fn test_resolve_api_key_order() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "groq".to_string(),
            ProviderConfig::Hosted {
                api_key_env: "CUSTOM_GROQ".to_string(),
                model: "m".to_string(),
                endpoint: None,
            },
        );

        let env = env_from(&[("CUSTOM_GROQ", "custom"), ("GROQ_API_KEY", "conventional")]);
        assert_eq!(
            config.resolve_api_key_with_env("groq", &env),
            Some("custom".to_string())
        );

        let env = env_from(&[("GROQ_API_KEY", "conventional")]);
        assert_eq!(
            config.resolve_api_key_with_env("groq", &env),
            Some("conventional".to_string())
        );
        assert_eq!(config.resolve_api_key_with_env("ollama", &env), None);

        config.api_key = Some("explicit".to_string());
        assert_eq!(
            config.resolve_api_key_with_env("groq", &env),
            Some("explicit".to_string())
        );
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rag_bounds() {
        let mut config = AppConfig::default();
        config.rag.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rag.chunk_overlap = config.rag.chunk_size;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());

        assert!(AppConfig::default().validate().is_ok());
    }
}
