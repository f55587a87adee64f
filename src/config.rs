use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Coherence metric used to rank candidate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoherenceMeasure {
    #[default]
    #[serde(rename = "c_v")]
    CV,
    #[serde(rename = "u_mass")]
    UMass,
    #[serde(rename = "c_npmi")]
    CNpmi,
}

impl CoherenceMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoherenceMeasure::CV => "c_v",
            CoherenceMeasure::UMass => "u_mass",
            CoherenceMeasure::CNpmi => "c_npmi",
        }
    }

    /// Sliding window size for window-based measures.
    pub fn window_size(&self) -> Option<usize> {
        match self {
            CoherenceMeasure::CV => Some(110),
            CoherenceMeasure::CNpmi => Some(10),
            CoherenceMeasure::UMass => None,
        }
    }
}

impl FromStr for CoherenceMeasure {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c_v" | "cv" => Ok(CoherenceMeasure::CV),
            "u_mass" | "umass" => Ok(CoherenceMeasure::UMass),
            "c_npmi" | "npmi" => Ok(CoherenceMeasure::CNpmi),
            other => Err(ConfigError::UnknownCoherence(other.to_string())),
        }
    }
}

impl fmt::Display for CoherenceMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyper-parameters of the variational LDA trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdaConfig {
    pub alpha: Option<f64>, // Document-topic concentration, 1/k when unset
    pub eta: Option<f64>,   // Topic-word concentration, 1/k when unset
    pub passes: usize,
    pub iterations: usize,
    pub gamma_threshold: f64,
    pub convergence_tolerance: f64,
    pub random_seed: Option<u64>,
}

impl Default for LdaConfig {
    fn default() -> Self {
        LdaConfig {
            alpha: None,
            eta: None,
            passes: 20,
            iterations: 50,
            gamma_threshold: 1e-3,
            convergence_tolerance: 1e-4,
            random_seed: None,
        }
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub min_topic_count: usize,
    pub max_topic_count: usize,
    pub top_n_terms: usize,
    pub coherence_top_n: usize,
    pub worker_count: usize,
    pub coherence_measure: CoherenceMeasure,
    pub lda: LdaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            min_topic_count: 1,
            max_topic_count: 10,
            top_n_terms: 20,
            coherence_top_n: 20,
            worker_count: default_worker_count(),
            coherence_measure: CoherenceMeasure::default(),
            lda: LdaConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_topic_count == 0 {
            return Err(ConfigError::ZeroMaxTopics);
        }
        if self.min_topic_count == 0 || self.min_topic_count > self.max_topic_count {
            return Err(ConfigError::InvalidTopicRange {
                min: self.min_topic_count,
                max: self.max_topic_count,
            });
        }
        if self.top_n_terms == 0 || self.coherence_top_n == 0 {
            return Err(ConfigError::ZeroTopTerms);
        }
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.lda.passes == 0 {
            return Err(ConfigError::ZeroIterations("passes"));
        }
        if self.lda.iterations == 0 {
            return Err(ConfigError::ZeroIterations("iterations"));
        }
        for (name, prior) in [("alpha", self.lda.alpha), ("eta", self.lda.eta)] {
            match prior {
                Some(value) if !(value.is_finite() && value > 0.0) => {
                    return Err(ConfigError::InvalidPrior { name, value });
                }
                _ => {}
            }
        }
        for (name, value) in [
            ("gamma_threshold", self.lda.gamma_threshold),
            ("convergence_tolerance", self.lda.convergence_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        Ok(())
    }
}

/// Available compute units minus one reserved unit, at least one.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}
