//! Turns configuration sections into live components.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use docqa_model::{MockModel, OpenAIChatConfig, OpenAIChatModel};
use docqa_rag::{
    DirectoryLoader, DocumentLoader, DocumentPreprocessor, EmbeddingProvider,
    HashEmbeddingProvider, OpenAIEmbeddingProvider, PageFilter, PromptReader, RagError,
    RagOrchestrator, RecursiveChunker, TextGenerator, build_index,
};
use tracing::info;

use crate::config::{
    API_KEY_ENV, AppConfig, EmbeddingConfig, EmbeddingProviderKind, ModelConfig, ModelProviderKind,
};

/// Vector size of the hash embedder when none is configured.
pub const DEFAULT_HASH_DIMENSIONS: usize = 384;

/// Build the embedding provider. A dry run always uses the hash embedder.
pub fn build_embedder(
    config: &EmbeddingConfig,
    dry_run: bool,
) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    if dry_run || config.provider == EmbeddingProviderKind::Hash {
        let dimensions = config.dimensions.unwrap_or(DEFAULT_HASH_DIMENSIONS);
        return Ok(Arc::new(HashEmbeddingProvider::new(dimensions)?));
    }

    let provider = match &config.base_url {
        Some(base_url) => OpenAIEmbeddingProvider::compatible(
            base_url.clone(),
            config.model.clone().unwrap_or_default(),
            config.dimensions.unwrap_or(0),
        )?,
        None => {
            let mut provider = OpenAIEmbeddingProvider::from_env()?;
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(dimensions) = config.dimensions {
                provider = provider.with_dimensions(dimensions);
            }
            provider
        }
    };
    Ok(Arc::new(provider))
}

/// Build the language model. A dry run always uses the echo mock.
pub fn build_generator(
    config: &ModelConfig,
    dry_run: bool,
) -> anyhow::Result<Arc<dyn TextGenerator>> {
    if dry_run || config.provider == ModelProviderKind::Mock {
        return Ok(Arc::new(MockModel::echo()));
    }

    let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
    let mut chat = match &config.base_url {
        Some(base_url) => {
            OpenAIChatConfig::compatible(api_key, base_url.clone(), config.model.clone())
        }
        None => OpenAIChatConfig::new(api_key, config.model.clone()),
    }
    .with_temperature(config.temperature);
    if let Some(max_tokens) = config.max_tokens {
        chat = chat.with_max_tokens(max_tokens);
    }
    Ok(Arc::new(OpenAIChatModel::new(chat)?))
}

/// Load `folder`, build an index over it and wire the orchestrator.
///
/// # Errors
///
/// Fails with [`RagError::CorpusLoadFailure`] when the folder is unreadable or
/// holds no loadable document, and with [`RagError::ModelUnavailable`] when a
/// backend cannot be constructed or reached during the build.
pub async fn build_orchestrator(
    config: &AppConfig,
    folder: &Path,
    dry_run: bool,
) -> anyhow::Result<RagOrchestrator> {
    let mut loader = DirectoryLoader::new();
    if config.filter_pages {
        loader = loader.with_page_filter(PageFilter::default());
    }
    let documents = loader.load(folder)?;
    if documents.is_empty() {
        return Err(RagError::CorpusLoadFailure {
            path: folder.display().to_string(),
            message: "no loadable documents".to_string(),
        }
        .into());
    }

    let embedder =
        build_embedder(&config.embedding, dry_run).context("embedding model unavailable")?;
    let generator =
        build_generator(&config.model, dry_run).context("language model unavailable")?;
    info!(embedder = embedder.model_id(), model = generator.name(), dry_run, "models ready");

    let chunker = Arc::new(RecursiveChunker::new(config.rag.chunk_size, config.rag.chunk_overlap));
    let preprocessor = Arc::new(DocumentPreprocessor::new(chunker, embedder));
    let index = build_index(config.index, preprocessor)?;
    index.add(&documents).await?;

    let mut reader = PromptReader::new(generator);
    if let Some(template) = &config.model.prompt_template {
        reader = reader.with_template(template.clone())?;
    }

    let orchestrator = RagOrchestrator::builder()
        .config(config.rag.clone())
        .index(index)
        .reader(Arc::new(reader))
        .build()?;
    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_forces_offline_backends() {
        let embedding =
            EmbeddingConfig { provider: EmbeddingProviderKind::Openai, ..Default::default() };
        let embedder = build_embedder(&embedding, true).unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_HASH_DIMENSIONS);

        let generator = build_generator(&ModelConfig::default(), true).unwrap();
        assert_eq!(generator.name(), "mock");
    }

    #[test]
    fn test_compatible_embedder_requires_dimensions() {
        let embedding = EmbeddingConfig {
            provider: EmbeddingProviderKind::Openai,
            model: Some("all-MiniLM-L6-v2".to_string()),
            base_url: Some("http://localhost:8080/v1".to_string()),
            dimensions: None,
        };
        assert!(build_embedder(&embedding, false).is_err());

        let embedding = EmbeddingConfig { dimensions: Some(384), ..embedding };
        assert_eq!(build_embedder(&embedding, false).unwrap().dimensions(), 384);
    }

    #[tokio::test]
    async fn test_empty_folder_is_a_corpus_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_orchestrator(&AppConfig::default(), dir.path(), true).await.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<RagError>(),
            Some(RagError::CorpusLoadFailure { .. })
        ));
    }
}
