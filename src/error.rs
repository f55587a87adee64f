//! Error types for the topic pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration or run request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("max_topic_count must be at least 1")]
    ZeroMaxTopics,

    #[error("topic range {min}..={max} is empty")]
    InvalidTopicRange { min: usize, max: usize },

    #[error("top_n_terms must be at least 1")]
    ZeroTopTerms,

    #[error("worker_count must be at least 1")]
    ZeroWorkers,

    #[error("LDA {0} must be at least 1")]
    ZeroIterations(&'static str),

    #[error("LDA {name} must be a positive finite number, got {value}")]
    InvalidPrior { name: &'static str, value: f64 },

    #[error("LDA {name} must be a non-negative finite number, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },

    #[error("unknown coherence measure: {0}")]
    UnknownCoherence(String),

    #[error("invalid period {year}-{month}")]
    InvalidPeriod { year: i32, month: u32 },
}

/// Failure reading the message history.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("message history directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("malformed message history {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Failure writing topic records.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store rejected record: {0}")]
    Rejected(String),
}

/// Failure training a candidate model.
#[derive(Error, Debug)]
pub enum TrainError {
    #[error("cannot train on an empty corpus")]
    EmptyCorpus,

    #[error("topic count must be at least 1, got {0}")]
    InvalidTopicCount(usize),

    #[error("Dirichlet prior {name} must be positive and finite, got {value}")]
    InvalidPrior { name: &'static str, value: f64 },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Failure selecting a winning model.
#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("candidate range {min}..={max} is empty")]
    EmptyRange { min: usize, max: usize },

    #[error("no viable model: all {evaluated} candidates were rejected")]
    NoViableModel { evaluated: usize },

    #[error("training k={topic_count} failed: {source}")]
    Train {
        topic_count: usize,
        #[source]
        source: TrainError,
    },
}

/// Failure of a whole pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("failed to prepare topic store: {0}")]
    Store(#[from] StoreError),

    #[error("{failed} of {total} topic records failed to persist")]
    Persistence { failed: usize, total: usize },
}
