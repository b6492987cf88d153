//! TOML run configuration.
//!
//! ```toml
//! output_dir = "./reports"
//! filter_pages = true
//!
//! [rag]
//! chunk_size = 1000
//! chunk_overlap = 20
//! top_k = 2
//!
//! [index]
//! kind = "ivf"
//! lists = 16
//! probes = 4
//!
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//!
//! [model]
//! provider = "openai"
//! model = "gpt-4o-mini"
//!
//! [[clients]]
//! name = "advent"
//! input_path = "./docs/advent"
//! question_path = "./questions/advent.xlsx"
//!
//! [clients.placeholders]
//! FUND = "Advent International GPE X-A SCSp"
//! MANAGER_OR_ADVISOR = "Advent International Fund Manager Sarl"
//! ```
//!
//! API keys are never read from this file; they come from `OPENAI_API_KEY`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use docqa_eval::Placeholders;
use docqa_rag::{IndexKind, RagConfig};
use serde::{Deserialize, Serialize};

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Offline feature hashing.
    #[default]
    Hash,
    /// OpenAI or a compatible embeddings server.
    Openai,
}

/// `[embedding]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Backend.
    pub provider: EmbeddingProviderKind,
    /// Model name for the `openai` provider.
    pub model: Option<String>,
    /// Base URL of a compatible server; no key is sent when set.
    pub base_url: Option<String>,
    /// Vector size. Required for compatible servers and the hash provider.
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hash,
            model: None,
            base_url: None,
            dimensions: None,
        }
    }
}

/// Which language model backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProviderKind {
    /// OpenAI or a compatible chat server.
    #[default]
    Openai,
    /// Offline echo model.
    Mock,
}

/// `[model]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend.
    pub provider: ModelProviderKind,
    /// Model name.
    pub model: String,
    /// Base URL of a compatible server.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Completion token limit.
    pub max_tokens: Option<u32>,
    /// Prompt template with `{context}` and `{question}` placeholders.
    pub prompt_template: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProviderKind::Openai,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            temperature: 0.0,
            max_tokens: None,
            prompt_template: None,
        }
    }
}

/// One `[[clients]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client name; also the report file prefix.
    pub name: String,
    /// Folder of policy documents.
    pub input_path: PathBuf,
    /// Question spreadsheet.
    pub question_path: PathBuf,
    /// Tokens substituted into every question.
    #[serde(default)]
    pub placeholders: Placeholders,
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that receives the CSV reports.
    pub output_dir: PathBuf,
    /// Drop short and table-of-contents pages from PDFs.
    pub filter_pages: bool,
    /// Chunking, retrieval and context settings.
    pub rag: RagConfig,
    /// Vector index variant.
    pub index: IndexKind,
    /// Embedding backend.
    pub embedding: EmbeddingConfig,
    /// Language model backend.
    pub model: ModelConfig,
    /// Clients to evaluate, in order.
    pub clients: Vec<ClientConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filter_pages: false,
            rag: RagConfig::default(),
            index: IndexKind::default(),
            embedding: EmbeddingConfig::default(),
            model: ModelConfig::default(),
            clients: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.rag.validate()?;
        self.index.validate()?;

        let mut names = HashSet::new();
        for client in &self.clients {
            if client.name.trim().is_empty() {
                bail!("client names must not be empty");
            }
            if !names.insert(client.name.as_str()) {
                bail!("duplicate client name '{}'", client.name);
            }
        }
        if self.embedding.dimensions == Some(0) {
            bail!("embedding dimensions must be greater than zero");
        }
        Ok(())
    }

    /// The clients selected by name, in config order. An empty filter selects all.
    pub fn select_clients(&self, names: &[String]) -> anyhow::Result<Vec<&ClientConfig>> {
        let known = |name: &String| self.clients.iter().any(|c| &c.name == name);
        if let Some(unknown) = names.iter().find(|n| !known(n)) {
            bail!("unknown client '{unknown}'");
        }
        Ok(self
            .clients
            .iter()
            .filter(|c| names.is_empty() || names.contains(&c.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
output_dir = "reports"

[rag]
chunk_size = 500
top_k = 3

[index]
kind = "ivf"
lists = 8
probes = 2

[embedding]
provider = "openai"
base_url = "http://localhost:8080/v1"
model = "all-MiniLM-L6-v2"
dimensions = 384

[model]
provider = "mock"

[[clients]]
name = "advent"
input_path = "docs/advent"
question_path = "questions/advent.xlsx"
placeholders = { FUND = "Advent International GPE X-A SCSp" }

[[clients]]
name = "chorus"
input_path = "docs/chorus"
question_path = "questions/chorus.csv"
"#;

    #[test]
    fn test_parses_full_config() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 20);
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.index, IndexKind::Ivf { lists: 8, probes: 2 });
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Openai);
        assert_eq!(config.embedding.dimensions, Some(384));
        assert_eq!(config.model.provider, ModelProviderKind::Mock);
        assert_eq!(config.clients.len(), 2);
        assert_eq!(
            config.clients[0].placeholders.apply("FUND"),
            "Advent International GPE X-A SCSp"
        );
        assert!(config.clients[1].placeholders.is_empty());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.rag, RagConfig::default());
        assert_eq!(config.index, IndexKind::Flat);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
        assert!(config.clients.is_empty());
        assert!(!config.filter_pages);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(AppConfig::from_toml("[rag]\nchunk_size = 10\nchunk_overlap = 10\n").is_err());
        let duplicate = "[[clients]]\nname = \"a\"\ninput_path = \"x\"\nquestion_path = \"y\"\n\
                         [[clients]]\nname = \"a\"\ninput_path = \"x\"\nquestion_path = \"y\"\n";
        assert!(AppConfig::from_toml(duplicate).is_err());
    }

    #[test]
    fn test_select_clients() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.select_clients(&[]).unwrap().len(), 2);
        let picked = config.select_clients(&["chorus".to_string()]).unwrap();
        assert_eq!(picked[0].name, "chorus");
        assert!(config.select_clients(&["nobody".to_string()]).is_err());
    }
}
