use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::LdaConfig;
use crate::corpus::{Corpus, Vocabulary};
use crate::error::TrainError;
use crate::models::TopicTerm;
use crate::tfidf::WeightedVector;

/// A trained topic model for one topic count.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateModel {
    pub num_topics: usize,
    pub topic_word_matrix: Vec<Vec<f64>>, // Topics x Words, rows sum to 1
    pub doc_topic_matrix: Vec<Vec<f64>>,  // Documents x Topics, rows sum to 1
    pub passes: usize,
    pub converged: bool,
}

impl CandidateModel {
    pub fn vocab_size(&self) -> usize {
        self.topic_word_matrix.first().map_or(0, |row| row.len())
    }

    /// Highest-weighted term ids of a topic, by descending weight then ascending id.
    pub fn top_term_ids(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let Some(row) = self.topic_word_matrix.get(topic) else {
            return Vec::new();
        };
        let mut ranked: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n.min(row.len()));
        ranked
    }
}

/// Trains one candidate model for a given topic count.
pub trait TopicTrainer {
    fn train(&self, corpus: &Corpus, num_topics: usize) -> Result<CandidateModel, TrainError>;
}

/// Variational Bayes LDA over the TF-IDF weighted corpus.
///
/// Each pass runs the per-document E-step on a dedicated worker pool and
/// folds the sufficient statistics back in document order, so the result
/// only depends on the seed and never on the number of workers.
pub struct LdaTrainer {
    config: LdaConfig,
    pool: rayon::ThreadPool,
}

struct DocumentState {
    gamma: Vec<f64>,
    exp_elog_theta: Vec<f64>,
    phi_norm: Vec<f64>,
}

impl LdaTrainer {
    pub fn new(config: LdaConfig, worker_count: usize) -> Result<Self, TrainError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count.max(1))
            .thread_name(|index| format!("lda-worker-{index}"))
            .build()?;
        Ok(LdaTrainer { config, pool })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn infer_document(
        &self,
        doc: &WeightedVector,
        exp_elog_beta: &[Vec<f64>],
        alpha: f64,
    ) -> DocumentState {
        let num_topics = exp_elog_beta.len();
        let total: f64 = doc.iter().map(|&(_, weight)| weight).sum();

        let mut gamma = vec![alpha + total / num_topics as f64; num_topics];
        let mut exp_elog_theta = exp_dirichlet_expectation(&gamma);
        let mut phi_norm = phi_normalizer(doc, &exp_elog_theta, exp_elog_beta);

        for _ in 0..self.config.iterations {
            let last_gamma = gamma.clone();
            for (topic, value) in gamma.iter_mut().enumerate() {
                let expected: f64 = doc
                    .iter()
                    .zip(&phi_norm)
                    .map(|(&(id, weight), norm)| weight * exp_elog_beta[topic][id] / norm)
                    .sum();
                *value = alpha + exp_elog_theta[topic] * expected;
            }
            exp_elog_theta = exp_dirichlet_expectation(&gamma);
            phi_norm = phi_normalizer(doc, &exp_elog_theta, exp_elog_beta);

            if mean_abs_change(&last_gamma, &gamma) < self.config.gamma_threshold {
                break;
            }
        }

        DocumentState {
            gamma,
            exp_elog_theta,
            phi_norm,
        }
    }
}

impl TopicTrainer for LdaTrainer {
    fn train(&self, corpus: &Corpus, num_topics: usize) -> Result<CandidateModel, TrainError> {
        if num_topics == 0 {
            return Err(TrainError::InvalidTopicCount(num_topics));
        }
        if corpus.is_empty() {
            return Err(TrainError::EmptyCorpus);
        }

        let vocab_size = corpus.vocabulary.len();
        let alpha = self.config.alpha.unwrap_or(1.0 / num_topics as f64);
        let eta = self.config.eta.unwrap_or(1.0 / num_topics as f64);
        for (name, value) in [("alpha", alpha), ("eta", eta)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrainError::InvalidPrior { name, value });
            }
        }
        let documents = corpus.weighted.vectors();

        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut lambda: Vec<Vec<f64>> = (0..num_topics)
            .map(|_| (0..vocab_size).map(|_| rng.gen_range(0.9..1.1)).collect())
            .collect();

        let mut gammas: Vec<Vec<f64>> = Vec::new();
        let mut passes = 0;
        let mut converged = false;

        for pass in 0..self.config.passes {
            let exp_elog_beta: Vec<Vec<f64>> =
                lambda.iter().map(|row| exp_dirichlet_expectation(row)).collect();

            let states: Vec<DocumentState> = self.pool.install(|| {
                documents
                    .par_iter()
                    .map(|doc| self.infer_document(doc, &exp_elog_beta, alpha))
                    .collect()
            });

            let mut sstats = vec![vec![0.0; vocab_size]; num_topics];
            for (doc, state) in documents.iter().zip(&states) {
                for (&(id, weight), norm) in doc.iter().zip(&state.phi_norm) {
                    for topic in 0..num_topics {
                        sstats[topic][id] += state.exp_elog_theta[topic] * weight / norm;
                    }
                }
            }

            let new_lambda: Vec<Vec<f64>> = sstats
                .iter()
                .zip(&exp_elog_beta)
                .map(|(stats, beta)| {
                    stats
                        .iter()
                        .zip(beta)
                        .map(|(s, b)| eta + s * b)
                        .collect()
                })
                .collect();

            let change = lambda
                .iter()
                .zip(&new_lambda)
                .map(|(old, new)| mean_abs_change(old, new))
                .sum::<f64>()
                / num_topics as f64;

            lambda = new_lambda;
            gammas = states.into_iter().map(|state| state.gamma).collect();
            passes = pass + 1;
            debug!("k={} pass {} mean topic change {:.6}", num_topics, passes, change);

            if change < self.config.convergence_tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            debug!(
                "k={} stopped at the {}-pass cap without converging",
                num_topics, passes
            );
        }

        Ok(CandidateModel {
            num_topics,
            topic_word_matrix: normalize_rows(&lambda),
            doc_topic_matrix: normalize_rows(&gammas),
            passes,
            converged,
        })
    }
}

/// Emits the `top_n` terms of every cluster, clusters numbered from 1.
pub fn extract_topics(
    model: &CandidateModel,
    vocabulary: &Vocabulary,
    top_n: usize,
) -> Vec<TopicTerm> {
    let mut terms = Vec::new();
    for topic in 0..model.num_topics {
        for (id, score) in model.top_term_ids(topic, top_n) {
            if let Some(word) = vocabulary.token(id) {
                terms.push(TopicTerm {
                    topic_cluster: topic + 1,
                    word: word.to_string(),
                    score,
                });
            }
        }
    }
    terms
}

fn phi_normalizer(
    doc: &WeightedVector,
    exp_elog_theta: &[f64],
    exp_elog_beta: &[Vec<f64>],
) -> Vec<f64> {
    doc.iter()
        .map(|&(id, _)| {
            exp_elog_theta
                .iter()
                .zip(exp_elog_beta)
                .map(|(theta, beta)| theta * beta[id])
                .sum::<f64>()
                + 1e-100
        })
        .collect()
}

/// exp(E[log x]) for x ~ Dirichlet(params).
fn exp_dirichlet_expectation(params: &[f64]) -> Vec<f64> {
    let psi_total = digamma(params.iter().sum());
    params
        .iter()
        .map(|&p| (digamma(p) - psi_total).exp())
        .collect()
}

fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

fn mean_abs_change(old: &[f64], new: &[f64]) -> f64 {
    if old.is_empty() {
        return 0.0;
    }
    old.iter().zip(new).map(|(a, b)| (a - b).abs()).sum::<f64>() / old.len() as f64
}

fn normalize_rows(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|row| {
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter().map(|value| value / total).collect()
            } else {
                vec![1.0 / row.len().max(1) as f64; row.len()]
            }
        })
        .collect()
}
