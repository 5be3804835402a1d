// src/models/llama.rs
use super::generation::TextGenerator;
use crate::error::ModelError;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::llama::{Cache, Config, Llama, LlamaConfig, LlamaEosToks};
use hf_hub::api::sync::{Api, ApiRepo};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

const SHARD_INDEX: &str = "model.safetensors.index.json";
const SINGLE_WEIGHTS: &str = "model.safetensors";

#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// `None` samples greedily.
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub seed: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: None,
            top_p: None,
            seed: 299792458,
        }
    }
}

/// Llama-architecture causal LM running on the CPU.
pub struct LlamaGenerator {
    model: Llama,
    config: Config,
    tokenizer: Tokenizer,
    device: Device,
    dtype: DType,
    sampling: SamplingConfig,
}

impl LlamaGenerator {
    /// Resolve `model_id` on the Hugging Face hub (cached locally) and load it.
    pub fn from_hub(model_id: &str, sampling: SamplingConfig) -> Result<Self, ModelError> {
        info!("Resolving model {} on the hub", model_id);
        let api = Api::new()?;
        let repo = api.model(model_id.to_string());

        let tokenizer_path = repo.get("tokenizer.json")?;
        let config_path = repo.get("config.json")?;
        let weights = weight_files(&repo)?;

        Self::load(&tokenizer_path, &config_path, &weights, sampling)
    }

    pub fn load(
        tokenizer_path: &Path,
        config_path: &Path,
        weights: &[PathBuf],
        sampling: SamplingConfig,
    ) -> Result<Self, ModelError> {
        let device = Device::Cpu;
        let dtype = DType::F32;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;

        let raw = read(config_path)?;
        let config = parse_config(&raw)?.into_config(false);

        info!("Loading {} weight file(s)", weights.len());
        // Safety: the safetensors files are not modified while mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(weights, dtype, &device)? };
        let model = Llama::load(vb, &config)?;

        Ok(Self {
            model,
            config,
            tokenizer,
            device,
            dtype,
            sampling,
        })
    }

    fn encode(&self, prompt: &str) -> Result<Vec<u32>, ModelError> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))?;
        let mut tokens = encoding.get_ids().to_vec();

        if tokens.is_empty() {
            let bos = self.config.bos_token_id.ok_or_else(|| {
                ModelError::InvalidInput("prompt encodes to no tokens".to_string())
            })?;
            tokens.push(bos);
        }
        Ok(tokens)
    }
}

impl TextGenerator for LlamaGenerator {
    fn generate(&mut self, prompt: &str, max_length: usize) -> Result<String, ModelError> {
        let mut tokens = self.encode(prompt)?;
        let limit = max_length.min(self.config.max_position_embeddings);
        let budget = new_token_budget(tokens.len(), limit);
        debug!("Prompt is {} tokens, generating up to {}", tokens.len(), budget);

        let mut cache = Cache::new(true, self.dtype, &self.config, &self.device)?;
        let mut sampler = LogitsProcessor::new(
            self.sampling.seed,
            self.sampling.temperature,
            self.sampling.top_p,
        );

        let mut index_pos = 0;
        for step in 0..budget {
            // After the first pass the KV cache holds the prefix.
            let start = if step == 0 { 0 } else { tokens.len() - 1 };
            let context = &tokens[start..];
            let input = Tensor::new(context, &self.device)?.unsqueeze(0)?;
            let logits = self.model.forward(&input, index_pos, &mut cache)?;
            let logits = logits.squeeze(0)?;
            index_pos += context.len();

            let next = sampler.sample(&logits)?;
            tokens.push(next);
            if is_eos(self.config.eos_token_id.as_ref(), next) {
                break;
            }
        }

        self.tokenizer
            .decode(&tokens, true)
            .map_err(|e| ModelError::Tokenizer(e.to_string()))
    }
}

/// Number of tokens that may be appended to a prompt of `prompt_len`.
fn new_token_budget(prompt_len: usize, max_length: usize) -> usize {
    max_length.saturating_sub(prompt_len)
}

fn is_eos(eos: Option<&LlamaEosToks>, token: u32) -> bool {
    match eos {
        Some(LlamaEosToks::Single(id)) => *id == token,
        Some(LlamaEosToks::Multiple(ids)) => ids.contains(&token),
        None => false,
    }
}

/// Parse a hub `config.json`, dropping rope scaling schemes candle's llama
/// does not implement (only "llama3" is supported).
fn parse_config(raw: &[u8]) -> Result<LlamaConfig, ModelError> {
    let mut value: serde_json::Value = serde_json::from_slice(raw)?;

    if let Some(object) = value.as_object_mut() {
        let unsupported = object
            .get("rope_scaling")
            .filter(|scaling| !scaling.is_null())
            .map(|scaling| {
                scaling.get("rope_type").or_else(|| scaling.get("type"))
                    != Some(&serde_json::Value::from("llama3"))
            })
            .unwrap_or(false);
        if unsupported {
            warn!("Ignoring unsupported rope_scaling: {}", object["rope_scaling"]);
            object.remove("rope_scaling");
        }
    }

    Ok(serde_json::from_value(value)?)
}

#[derive(Deserialize)]
struct ShardIndex {
    weight_map: HashMap<String, String>,
}

fn shard_names(index: &[u8]) -> Result<Vec<String>, ModelError> {
    let index: ShardIndex = serde_json::from_slice(index)?;
    let names: BTreeSet<String> = index.weight_map.into_values().collect();
    if names.is_empty() {
        return Err(ModelError::InvalidInput(
            "weight index lists no shards".to_string(),
        ));
    }
    Ok(names.into_iter().collect())
}

fn weight_files(repo: &ApiRepo) -> Result<Vec<PathBuf>, ModelError> {
    match repo.get(SHARD_INDEX) {
        Ok(index_path) => {
            let shards = shard_names(&read(&index_path)?)?;
            shards
                .iter()
                .map(|name| repo.get(name).map_err(ModelError::from))
                .collect()
        }
        Err(e) => {
            debug!("No shard index ({}), using {}", e, SINGLE_WEIGHTS);
            Ok(vec![repo.get(SINGLE_WEIGHTS)?])
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ModelError> {
    std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "hidden_size": 64,
        "intermediate_size": 128,
        "vocab_size": 100,
        "num_hidden_layers": 2,
        "num_attention_heads": 4,
        "num_key_value_heads": 4,
        "rms_norm_eps": 1e-6,
        "rope_theta": 10000.0,
        "max_position_embeddings": 256,
        "bos_token_id": 1,
        "eos_token_id": 2,
        "rope_scaling": {"type": "linear", "factor": 4.0}
    }"#;

    #[test]
    fn test_budget_counts_prompt_tokens() {
        assert_eq!(new_token_budget(10, 100), 90);
        assert_eq!(new_token_budget(100, 100), 0);
        assert_eq!(new_token_budget(150, 100), 0);
    }

    #[test]
    fn test_eos_variants() {
        assert!(is_eos(Some(&LlamaEosToks::Single(2)), 2));
        assert!(!is_eos(Some(&LlamaEosToks::Single(2)), 3));
        assert!(is_eos(Some(&LlamaEosToks::Multiple(vec![7, 9])), 9));
        assert!(!is_eos(None, 2));
    }

    #[test]
    fn test_linear_rope_scaling_is_dropped() {
        let config = parse_config(CONFIG.as_bytes()).unwrap().into_config(false);
        assert_eq!(config.max_position_embeddings, 256);
        assert_eq!(config.bos_token_id, Some(1));
        assert!(config.rope_scaling.is_none());
    }

    #[test]
    fn test_shard_names_are_unique_and_sorted() {
        let index = br#"{"metadata": {}, "weight_map": {
            "a": "model-00002-of-00002.safetensors",
            "b": "model-00001-of-00002.safetensors",
            "c": "model-00001-of-00002.safetensors"
        }}"#;
        assert_eq!(
            shard_names(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors",
                "model-00002-of-00002.safetensors"
            ]
        );
    }

    #[test]
    fn test_empty_shard_index_rejected() {
        let err = shard_names(br#"{"weight_map": {}}"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let err = LlamaGenerator::load(
            Path::new("/nonexistent/tokenizer.json"),
            Path::new("/nonexistent/config.json"),
            &[],
            SamplingConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ModelError::Tokenizer(_)));
    }
}
