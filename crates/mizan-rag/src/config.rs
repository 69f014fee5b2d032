use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub fusion: FusionConfig,
    pub rerank: RerankConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Weight on the lexical (position-based) component score.
    pub lexical_weight: f32,
    /// Weight on the semantic (cosine) component score. Must sum to 1.0
    /// with `lexical_weight`.
    pub semantic_weight: f32,
    /// Fused candidates below this score are dropped, not zero-padded.
    pub min_score_threshold: f32,
    pub default_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankConfig {
    /// At most this many fused candidates go into the rerank prompt.
    pub max_candidates: usize,
    /// Seconds to wait for the rerank call before keeping the fused order.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub model: String,
    pub dimension: usize,
    /// Name of the environment variable holding the service credential.
    /// Absence is a fatal error at call time, not at construction.
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: usize,
}

impl RetrievalConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        let weight_sum = self.fusion.lexical_weight + self.fusion.semantic_weight;
        if (weight_sum - 1.0).abs() > 1e-4 {
            return Err(format!(
                "fusion weights must sum to 1.0 (got {} + {})",
                self.fusion.lexical_weight, self.fusion.semantic_weight
            ));
        }
        if self.fusion.lexical_weight < 0.0 || self.fusion.semantic_weight < 0.0 {
            return Err("fusion weights must be non-negative".into());
        }
        if !(0.0..=1.0).contains(&self.fusion.min_score_threshold) {
            return Err("fusion.min_score_threshold must be in [0.0, 1.0]".into());
        }
        if self.fusion.default_top_k == 0 {
            return Err("fusion.default_top_k must be > 0".into());
        }
        if self.rerank.max_candidates == 0 {
            return Err("rerank.max_candidates must be > 0".into());
        }
        if self.embedding.dimension == 0 {
            return Err("embedding.dimension must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fusion: FusionConfig {
                lexical_weight: 0.3,
                semantic_weight: 0.7,
                min_score_threshold: 0.1,
                default_top_k: 10,
            },
            rerank: RerankConfig {
                max_candidates: 20,
                timeout_secs: 20,
            },
            embedding: EmbeddingConfig {
                endpoint: "https://api.openai.com/v1/embeddings".to_string(),
                model: "text-embedding-3-small".to_string(),
                dimension: 768,
                api_key_env: "EMBEDDING_API_KEY".to_string(),
            },
            chat: ChatConfig {
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: "LLM_API_KEY".to_string(),
                max_tokens: 512,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RetrievalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = RetrievalConfig::default();
        config.fusion.lexical_weight = 0.5;
        config.fusion.semantic_weight = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_range_checked() {
        let mut config = RetrievalConfig::default();
        config.fusion.min_score_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = RetrievalConfig::default();
        config.embedding.dimension = 0;
        assert!(config.validate().is_err());
    }
}
