//! One batch run: fetch, clean, build the corpus, select a model, persist.

use log::{error, info, warn};
use serde::Serialize;

use crate::cleaning::TextCleaner;
use crate::coherence::{CoherenceModel, CoherenceScorer};
use crate::config::PipelineConfig;
use crate::corpus::Corpus;
use crate::error::PipelineError;
use crate::models::{Period, TopicTermRecord};
use crate::selection::ModelSelector;
use crate::source::MessageSource;
use crate::store::TopicStore;
use crate::topic_modeling::{extract_topics, LdaTrainer, TopicTrainer};

/// What to run: the period and, optionally, the merchant.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub period: Period,
    /// Falls back to the sender name of the first message when unset.
    pub merchant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub merchant_name: String,
    pub year: i32,
    pub month: u32,
    pub messages: usize,
    pub vocabulary_size: usize,
    pub candidates: usize,
    pub topic_count: usize,
    pub coherence: f64,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    NoMessages { year: i32, month: u32 },
    NoTokens { year: i32, month: u32, messages: usize },
    Persisted(RunSummary),
}

pub struct Pipeline<S, C, T> {
    source: S,
    cleaner: C,
    store: T,
    config: PipelineConfig,
}

impl<S: MessageSource, C: TextCleaner, T: TopicStore> Pipeline<S, C, T> {
    pub fn new(source: S, cleaner: C, store: T, config: PipelineConfig) -> Self {
        Pipeline {
            source,
            cleaner,
            store,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &T {
        &self.store
    }

    pub fn into_store(self) -> T {
        self.store
    }

    /// Runs with the variational LDA trainer and the configured coherence measure.
    pub fn run(&mut self, request: &RunRequest) -> Result<RunOutcome, PipelineError> {
        self.config.validate()?;
        let trainer = LdaTrainer::new(self.config.lda.clone(), self.config.worker_count)?;
        let scorer = CoherenceModel::new(self.config.coherence_measure, self.config.coherence_top_n);
        let selector = ModelSelector::new(
            trainer,
            scorer,
            self.config.min_topic_count,
            self.config.max_topic_count,
        );
        info!(
            "Run {} with k in {}..={}, coherence {}, {} workers",
            request.period,
            self.config.min_topic_count,
            self.config.max_topic_count,
            self.config.coherence_measure,
            self.config.worker_count
        );
        self.run_with(request, &selector)
    }

    pub fn run_with<Tr: TopicTrainer, Sc: CoherenceScorer>(
        &mut self,
        request: &RunRequest,
        selector: &ModelSelector<Tr, Sc>,
    ) -> Result<RunOutcome, PipelineError> {
        let period = request.period;
        let messages = self.source.fetch(period)?;
        if messages.is_empty() {
            info!("No chat message for {}, nothing to train", period);
            return Ok(RunOutcome::NoMessages {
                year: period.year,
                month: period.month,
            });
        }

        let merchant_name = request
            .merchant
            .clone()
            .filter(|merchant| !merchant.is_empty())
            .unwrap_or_else(|| messages[0].name.clone());

        let cleaned = self.cleaner.clean(messages);
        info!("Preprocessing result size: {}", cleaned.len());

        let corpus = Corpus::build(&cleaned);
        info!("Preprocessing unique tokens: {}", corpus.vocabulary.len());
        if corpus.is_empty() {
            warn!(
                "No tokens left after cleaning {} messages for {}, nothing to train",
                cleaned.len(),
                period
            );
            return Ok(RunOutcome::NoTokens {
                year: period.year,
                month: period.month,
                messages: cleaned.len(),
            });
        }

        let selection = selector.select(&corpus)?;
        let winner = selection.winner();
        let terms = extract_topics(&winner.model, &corpus.vocabulary, self.config.top_n_terms);

        self.store.prepare()?;
        let total = terms.len();
        let mut failed = 0;
        for term in terms {
            let record = TopicTermRecord::new(term, &merchant_name, period);
            match self.store.insert(&record) {
                Ok(()) => info!("{}", record),
                Err(err) => {
                    failed += 1;
                    error!("Failed to persist {}: {}", record, err);
                }
            }
        }
        if failed > 0 {
            return Err(PipelineError::Persistence { failed, total });
        }

        info!(
            "Persisted {} topic terms for merchant {} ({})",
            total, merchant_name, period
        );
        Ok(RunOutcome::Persisted(RunSummary {
            merchant_name,
            year: period.year,
            month: period.month,
            messages: corpus.num_documents(),
            vocabulary_size: corpus.vocabulary.len(),
            candidates: selection.evaluations.len(),
            topic_count: winner.topic_count,
            coherence: selection.winner_score(),
            records: total,
        }))
    }
}
