use log::{info, warn};

use crate::coherence::CoherenceScorer;
use crate::corpus::Corpus;
use crate::error::SelectionError;
use crate::topic_modeling::{CandidateModel, TopicTrainer};

/// One trained and scored candidate. `score` is `None` when rejected.
#[derive(Debug, Clone)]
pub struct CandidateEvaluation {
    pub topic_count: usize,
    pub model: CandidateModel,
    pub score: Option<f64>,
}

/// Every evaluated candidate, in range order, plus the winner's position.
#[derive(Debug, Clone)]
pub struct Selection {
    pub evaluations: Vec<CandidateEvaluation>,
    winner_index: usize,
}

impl Selection {
    pub fn winner(&self) -> &CandidateEvaluation {
        &self.evaluations[self.winner_index]
    }

    pub fn winner_score(&self) -> f64 {
        self.winner().score.unwrap_or(f64::NAN)
    }
}

/// Trains and scores one model per topic count and keeps the most coherent.
pub struct ModelSelector<T, S> {
    trainer: T,
    scorer: S,
    min_topic_count: usize,
    max_topic_count: usize,
}

impl<T: TopicTrainer, S: CoherenceScorer> ModelSelector<T, S> {
    pub fn new(trainer: T, scorer: S, min_topic_count: usize, max_topic_count: usize) -> Self {
        ModelSelector {
            trainer,
            scorer,
            min_topic_count,
            max_topic_count,
        }
    }

    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn select(&self, corpus: &Corpus) -> Result<Selection, SelectionError> {
        let (min, max) = (self.min_topic_count, self.max_topic_count);
        if min == 0 || min > max {
            return Err(SelectionError::EmptyRange { min, max });
        }

        info!(
            "Evaluating candidate topic counts {}..={} over {} documents",
            min,
            max,
            corpus.num_documents()
        );

        // No early exit: coherence is not monotonic in k.
        let mut evaluations = Vec::new();
        for topic_count in min..=max {
            let model = self
                .trainer
                .train(corpus, topic_count)
                .map_err(|source| SelectionError::Train {
                    topic_count,
                    source,
                })?;
            let score = self.scorer.score(&model, corpus);
            match score {
                Some(score) => info!("Coherence score: {} (k={})", score, topic_count),
                None => warn!("Rejected k={}: coherence is undefined", topic_count),
            }
            evaluations.push(CandidateEvaluation {
                topic_count,
                model,
                score,
            });
        }

        let Some(winner_index) = best_candidate(&evaluations) else {
            return Err(SelectionError::NoViableModel {
                evaluated: evaluations.len(),
            });
        };

        let winner = &evaluations[winner_index];
        info!(
            "Selected k={} with coherence {} out of {} candidates",
            winner.topic_count,
            winner.score.unwrap_or(f64::NAN),
            evaluations.len()
        );

        Ok(Selection {
            evaluations,
            winner_index,
        })
    }
}

// Highest score wins; equal scores go to the lower topic count.
fn best_candidate(evaluations: &[CandidateEvaluation]) -> Option<usize> {
    evaluations
        .iter()
        .enumerate()
        .filter_map(|(index, eval)| eval.score.map(|score| (index, score, eval.topic_count)))
        .reduce(|best, next| {
            if next.1 > best.1 || (next.1 == best.1 && next.2 < best.2) {
                next
            } else {
                best
            }
        })
        .map(|(index, _, _)| index)
}
