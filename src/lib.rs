//! Topic discovery over a month of merchant chat history.
//!
//! A run fetches the messages of one period, cleans them, builds a TF-IDF
//! weighted bag-of-words corpus, trains one LDA model per candidate topic
//! count, keeps the most coherent model and persists its top terms.

pub mod cleaning;
pub mod coherence;
pub mod config;
pub mod corpus;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod selection;
pub mod source;
pub mod store;
pub mod tfidf;
pub mod topic_modeling;

pub use cleaning::{PassthroughCleaner, RegexCleaner, TextCleaner};
pub use coherence::{CoherenceModel, CoherenceScorer};
pub use config::{CoherenceMeasure, LdaConfig, PipelineConfig};
pub use corpus::{BowVector, Corpus, Document, Vocabulary};
pub use error::{
    ConfigError, PipelineError, SelectionError, SourceError, StoreError, TrainError,
};
pub use models::{Message, Period, TopicTerm, TopicTermRecord};
pub use pipeline::{Pipeline, RunOutcome, RunRequest, RunSummary};
pub use selection::{CandidateEvaluation, ModelSelector, Selection};
pub use source::{CsvMessageSource, MessageSource};
pub use store::{JsonlTopicStore, MemoryTopicStore, TopicStore};
pub use tfidf::{TfIdf, WeightedCorpus, WeightedVector};
pub use topic_modeling::{extract_topics, CandidateModel, LdaTrainer, TopicTrainer};
