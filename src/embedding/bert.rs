//! BERT sentence-embedding backend.
//!
//! Fetches `config.json`, `tokenizer.json` and `model.safetensors` through the
//! Hugging Face hub cache and runs the model with Candle on the CPU. Token
//! states are mean-pooled over the attention mask and L2-normalized, matching
//! sentence-transformers output.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};

use super::models::ModelType;
use super::traits::{EmbeddingError, EmbeddingModel, EmbeddingResult, ModelHandle, ModelLoader};
use crate::config::EmbeddingSettings;

/// Sequence length used for hub ids outside [`ModelType`].
const DEFAULT_MAX_SEQ_LENGTH: usize = 256;

/// Loads a sentence-transformer BERT model from the Hugging Face hub.
#[derive(Debug, Clone)]
pub struct BertLoader {
    model_id: String,
    revision: String,
    max_seq_length: usize,
    query_prefix: Option<&'static str>,
    cache_dir: Option<PathBuf>,
}

impl BertLoader {
    /// Creates a loader for a hub model id at the given revision.
    pub fn new(model_id: impl Into<String>, revision: impl Into<String>) -> Self {
        let model_id = model_id.into();
        let known = ModelType::from_hf_id(&model_id);

        Self {
            max_seq_length: known
                .map(|m| m.max_seq_length())
                .unwrap_or(DEFAULT_MAX_SEQ_LENGTH),
            query_prefix: known.and_then(|m| m.query_prefix()),
            model_id,
            revision: revision.into(),
            cache_dir: None,
        }
    }

    /// Creates a loader from the embedding section of the settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> Self {
        let mut loader = Self::new(&settings.model, &settings.revision);
        if let Some(len) = settings.max_seq_length {
            loader.max_seq_length = len;
        }
        loader.cache_dir = settings.cache_dir.clone();
        loader
    }

    /// Overrides the hub cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    fn load_blocking(&self) -> EmbeddingResult<BertEmbedder> {
        let fail = |message: String| EmbeddingError::model_load(&self.model_id, message);

        let mut builder = ApiBuilder::new().with_progress(false);
        if let Some(ref dir) = self.cache_dir {
            builder = builder.with_cache_dir(dir.clone());
        }
        let api = builder
            .build()
            .map_err(|e| fail(format!("hub client: {}", e)))?;
        let repo = api.repo(Repo::with_revision(
            self.model_id.clone(),
            RepoType::Model,
            self.revision.clone(),
        ));

        let fetch = |file: &str| {
            repo.get(file)
                .map_err(|e| fail(format!("fetching {}: {}", file, e)))
        };
        let config_path = fetch("config.json")?;
        let tokenizer_path = fetch("tokenizer.json")?;
        let weights_path = fetch("model.safetensors")?;

        let raw_config = std::fs::read_to_string(&config_path)
            .map_err(|e| fail(format!("reading {}: {}", config_path.display(), e)))?;
        let config: Config = serde_json::from_str(&raw_config)
            .map_err(|e| fail(format!("parsing config.json: {}", e)))?;
        let HiddenSize { hidden_size } = serde_json::from_str(&raw_config)
            .map_err(|e| fail(format!("parsing config.json: {}", e)))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| fail(format!("loading tokenizer: {}", e)))?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length: self.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| fail(format!("configuring tokenizer: {}", e)))?;

        let device = Device::Cpu;
        // SAFETY: the weights file lives in the hub cache and is not modified
        // while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device) }
            .map_err(|e| fail(format!("mapping weights: {}", e)))?;
        let model =
            BertModel::load(vb, &config).map_err(|e| fail(format!("building model: {}", e)))?;

        Ok(BertEmbedder {
            model,
            tokenizer,
            device,
            dimension: hidden_size,
            query_prefix: self.query_prefix,
        })
    }
}

#[derive(Deserialize)]
struct HiddenSize {
    hidden_size: usize,
}

#[async_trait]
impl ModelLoader for BertLoader {
    fn model_name(&self) -> &str {
        &self.model_id
    }

    async fn load(&self) -> EmbeddingResult<ModelHandle> {
        tracing::info!(
            model_id = %self.model_id,
            revision = %self.revision,
            "Loading embedding model"
        );

        let loader = self.clone();
        let embedder = tokio::task::spawn_blocking(move || loader.load_blocking())
            .await
            .map_err(|e| EmbeddingError::model_load(&self.model_id, e))??;

        tracing::info!(
            model_id = %self.model_id,
            dimension = embedder.dimension,
            "Embedding model loaded"
        );
        Ok(Arc::new(embedder))
    }
}

/// A loaded BERT model with its tokenizer.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimension: usize,
    query_prefix: Option<&'static str>,
}

impl EmbeddingModel for BertEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let input = match self.query_prefix {
            Some(prefix) => format!("{}{}", prefix, text),
            None => text.to_owned(),
        };

        let encoding = self
            .tokenizer
            .encode(input, true)
            .map_err(EmbeddingError::inference)?;

        let ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self.model.forward(&ids, &type_ids, Some(&mask))?;
        let pooled = l2_normalize(&mean_pool(&hidden, &mask)?)?;

        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Averages token states `[batch, seq, hidden]` over positions where `mask`
/// `[batch, seq]` is non-zero.
pub fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = mask.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed.broadcast_div(&counts)
}

/// Scales each row of `[batch, hidden]` to unit length.
pub fn l2_normalize(pooled: &Tensor) -> candle_core::Result<Tensor> {
    let norm = pooled
        .sqr()?
        .sum_keepdim(1)?
        .sqrt()?
        .clamp(1e-12f32, f32::MAX)?;
    pooled.broadcast_div(&norm)
}
