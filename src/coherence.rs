//! Topic coherence measures used to rank candidate models.
//!
//! All measures look at the top terms of every topic and how often those
//! terms occur together, either inside sliding windows over the original
//! documents (`c_v`, `c_npmi`) or inside whole weighted documents (`u_mass`).
//! A model's score is the mean over its topics; anything non-finite means the
//! model cannot be ranked.

use std::collections::{HashMap, HashSet};

use crate::config::CoherenceMeasure;
use crate::corpus::Corpus;
use crate::topic_modeling::CandidateModel;

const EPSILON: f64 = 1e-12;

/// Scores a trained model. `None` rejects the candidate.
pub trait CoherenceScorer {
    fn score(&self, model: &CandidateModel, corpus: &Corpus) -> Option<f64>;
}

#[derive(Debug, Clone)]
pub struct CoherenceModel {
    measure: CoherenceMeasure,
    top_n: usize,
}

/// Occurrence counts of the relevant terms over a set of contexts.
#[derive(Debug, Default)]
struct Cooccurrence {
    num_contexts: usize,
    occurrences: HashMap<usize, usize>,
    pairs: HashMap<(usize, usize), usize>,
}

impl Cooccurrence {
    fn add_context(&mut self, ids: impl Iterator<Item = usize>, relevant: &HashSet<usize>) {
        self.num_contexts += 1;

        let mut present: Vec<usize> = ids.filter(|id| relevant.contains(id)).collect();
        present.sort_unstable();
        present.dedup();

        for (i, &a) in present.iter().enumerate() {
            *self.occurrences.entry(a).or_insert(0) += 1;
            for &b in &present[i + 1..] {
                *self.pairs.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    fn count(&self, id: usize) -> f64 {
        self.occurrences.get(&id).copied().unwrap_or(0) as f64
    }

    fn joint(&self, a: usize, b: usize) -> f64 {
        if a == b {
            return self.count(a);
        }
        let key = if a < b { (a, b) } else { (b, a) };
        self.pairs.get(&key).copied().unwrap_or(0) as f64
    }

    fn npmi(&self, a: usize, b: usize) -> f64 {
        let n = self.num_contexts as f64;
        let p_ab = self.joint(a, b) / n;
        let p_a = self.count(a) / n;
        let p_b = self.count(b) / n;
        let pmi = ((p_ab + EPSILON) / (p_a * p_b)).ln();
        pmi / -(p_ab + EPSILON).ln()
    }
}

impl CoherenceModel {
    pub fn new(measure: CoherenceMeasure, top_n: usize) -> Self {
        CoherenceModel { measure, top_n }
    }

    pub fn measure(&self) -> CoherenceMeasure {
        self.measure
    }

    /// Coherence of every topic of the model, NaN where undefined.
    pub fn topic_coherences(&self, model: &CandidateModel, corpus: &Corpus) -> Vec<f64> {
        let topics: Vec<Vec<usize>> = (0..model.num_topics)
            .map(|topic| {
                model
                    .top_term_ids(topic, self.top_n)
                    .into_iter()
                    .map(|(id, _)| id)
                    .collect()
            })
            .collect();
        let relevant: HashSet<usize> = topics.iter().flatten().copied().collect();

        let stats = match self.measure.window_size() {
            Some(window) => window_cooccurrence(corpus, window, &relevant),
            None => document_cooccurrence(corpus, &relevant),
        };

        topics
            .iter()
            .map(|topic| {
                if topic.len() < 2 {
                    return f64::NAN;
                }
                match self.measure {
                    CoherenceMeasure::CV => cv(topic, &stats),
                    CoherenceMeasure::UMass => umass(topic, &stats),
                    CoherenceMeasure::CNpmi => direct_npmi(topic, &stats),
                }
            })
            .collect()
    }
}

impl CoherenceScorer for CoherenceModel {
    fn score(&self, model: &CandidateModel, corpus: &Corpus) -> Option<f64> {
        let per_topic = self.topic_coherences(model, corpus);
        if per_topic.is_empty() {
            return None;
        }
        let mean = per_topic.iter().sum::<f64>() / per_topic.len() as f64;
        mean.is_finite().then_some(mean)
    }
}

// Boolean sliding windows; a document shorter than the window is one window.
fn window_cooccurrence(corpus: &Corpus, window: usize, relevant: &HashSet<usize>) -> Cooccurrence {
    let mut stats = Cooccurrence::default();
    for document in &corpus.documents {
        let ids = corpus.vocabulary.encode(document);
        if ids.len() <= window {
            stats.add_context(ids.iter().copied(), relevant);
        } else {
            for slice in ids.windows(window) {
                stats.add_context(slice.iter().copied(), relevant);
            }
        }
    }
    stats
}

fn document_cooccurrence(corpus: &Corpus, relevant: &HashSet<usize>) -> Cooccurrence {
    let mut stats = Cooccurrence::default();
    for vector in corpus.weighted.iter() {
        let present = vector
            .iter()
            .filter(|&&(_, weight)| weight > 0.0)
            .map(|&(id, _)| id);
        stats.add_context(present, relevant);
    }
    stats
}

// One-set segmentation: each term against the whole topic, compared through
// NPMI context vectors with cosine similarity.
fn cv(topic: &[usize], stats: &Cooccurrence) -> f64 {
    let vectors: Vec<Vec<f64>> = topic
        .iter()
        .map(|&w| topic.iter().map(|&t| stats.npmi(w, t)).collect())
        .collect();
    let topic_vector: Vec<f64> = (0..topic.len())
        .map(|j| vectors.iter().map(|v| v[j]).sum())
        .collect();

    let total: f64 = vectors
        .iter()
        .map(|vector| cosine_similarity(vector, &topic_vector))
        .sum();
    total / vectors.len() as f64
}

// One-preceding segmentation over document co-occurrence.
fn umass(topic: &[usize], stats: &Cooccurrence) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0;
    for i in 1..topic.len() {
        for j in 0..i {
            total += ((stats.joint(topic[i], topic[j]) + EPSILON) / stats.count(topic[j])).ln();
            pairs += 1;
        }
    }
    total / pairs as f64
}

fn direct_npmi(topic: &[usize], stats: &Cooccurrence) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0;
    for (i, &a) in topic.iter().enumerate() {
        for (j, &b) in topic.iter().enumerate() {
            if i != j {
                total += stats.npmi(a, b);
                pairs += 1;
            }
        }
    }
    total / pairs as f64
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    dot / (norm_a * norm_b)
}
