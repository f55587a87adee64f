use crate::corpus::BowVector;

/// Sparse (term id, weight) pairs, sorted by id.
pub type WeightedVector = Vec<(usize, f64)>;

/// TF-IDF weighted vectors for a whole batch, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedCorpus {
    vectors: Vec<WeightedVector>,
}

impl WeightedCorpus {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WeightedVector> {
        self.vectors.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedVector> {
        self.vectors.iter()
    }

    pub fn vectors(&self) -> &[WeightedVector] {
        &self.vectors
    }
}

/// Document frequencies for a batch, from which term weights are derived.
#[derive(Debug, Clone)]
pub struct TfIdf {
    num_docs: usize,
    idf: Vec<f64>,
}

impl TfIdf {
    /// Counts document frequency of every term across the full batch.
    pub fn fit(corpus: &[BowVector], vocab_size: usize) -> Self {
        let mut doc_freq = vec![0usize; vocab_size];
        for bow in corpus {
            for &(id, _) in bow {
                if id < vocab_size {
                    doc_freq[id] += 1;
                }
            }
        }

        let num_docs = corpus.len();
        let idf = doc_freq
            .iter()
            .map(|&df| smoothed_idf(df, num_docs))
            .collect();

        TfIdf { num_docs, idf }
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub fn idf(&self, id: usize) -> Option<f64> {
        self.idf.get(id).copied()
    }

    /// Weights one vector and scales it to unit length.
    pub fn transform(&self, bow: &BowVector) -> WeightedVector {
        let mut weighted: WeightedVector = bow
            .iter()
            .filter_map(|&(id, count)| self.idf(id).map(|idf| (id, count as f64 * idf)))
            .collect();

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in weighted.iter_mut() {
                *weight /= norm;
            }
        }
        weighted
    }

    pub fn weight_corpus(&self, corpus: &[BowVector]) -> WeightedCorpus {
        WeightedCorpus {
            vectors: corpus.iter().map(|bow| self.transform(bow)).collect(),
        }
    }
}

// ln((1 + N) / (1 + df)) + 1: positive for every df <= N, non-increasing in df.
fn smoothed_idf(doc_freq: usize, num_docs: usize) -> f64 {
    ((1.0 + num_docs as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<BowVector> {
        vec![
            vec![(0, 2), (1, 1)],
            vec![(0, 1), (2, 3)],
            vec![(0, 1), (1, 1), (3, 1)],
        ]
    }

    #[test]
    fn idf_is_monotonic_in_document_frequency() {
        let tfidf = TfIdf::fit(&sample(), 4);
        let everywhere = tfidf.idf(0).unwrap(); // df = 3
        let twice = tfidf.idf(1).unwrap(); // df = 2
        let once = tfidf.idf(2).unwrap(); // df = 1
        assert!(everywhere > 0.0);
        assert!(everywhere <= twice);
        assert!(twice <= once);
        assert_eq!(tfidf.idf(2), tfidf.idf(3));
    }

    #[test]
    fn vectors_are_unit_length_and_ordered() {
        let corpus = sample();
        let weighted = TfIdf::fit(&corpus, 4).weight_corpus(&corpus);
        assert_eq!(weighted.len(), corpus.len());

        for (bow, vector) in corpus.iter().zip(weighted.iter()) {
            let ids: Vec<usize> = vector.iter().map(|&(id, _)| id).collect();
            let expected: Vec<usize> = bow.iter().map(|&(id, _)| id).collect();
            assert_eq!(ids, expected);
            let norm: f64 = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn term_in_every_document_keeps_weight() {
        let corpus = vec![vec![(0, 1)], vec![(0, 4)]];
        let weighted = TfIdf::fit(&corpus, 1).weight_corpus(&corpus);
        assert!(weighted.iter().all(|v| v[0].1.is_finite() && v[0].1 > 0.0));
    }

    #[test]
    fn weighting_is_deterministic() {
        let corpus = sample();
        let first = TfIdf::fit(&corpus, 4).weight_corpus(&corpus);
        let second = TfIdf::fit(&corpus, 4).weight_corpus(&corpus);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_vector_stays_empty() {
        let corpus = vec![vec![], vec![(0, 1)]];
        let weighted = TfIdf::fit(&corpus, 1).weight_corpus(&corpus);
        assert!(weighted.get(0).unwrap().is_empty());
    }
}
