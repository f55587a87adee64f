//! Corpus construction: documents, vocabulary and bag-of-words vectors.

use std::collections::HashMap;

use counter::Counter;

use crate::models::Message;
use crate::tfidf::{TfIdf, WeightedCorpus};

/// Whitespace tokens of one message, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub tokens: Vec<String>,
}

impl Document {
    pub fn from_text(text: &str) -> Self {
        Document {
            tokens: text.split_whitespace().map(|token| token.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Sparse (term id, count) pairs, sorted by id.
pub type BowVector = Vec<(usize, usize)>;

/// Token <-> id mapping. Ids follow first occurrence and are contiguous from 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    id_to_token: Vec<String>,
    token_to_id: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary::default()
    }

    pub fn from_documents(documents: &[Document]) -> Self {
        let mut vocabulary = Vocabulary::new();
        for document in documents {
            vocabulary.add_document(document);
        }
        vocabulary
    }

    pub fn add_document(&mut self, document: &Document) {
        for token in &document.tokens {
            if !self.token_to_id.contains_key(token) {
                let id = self.id_to_token.len();
                self.id_to_token.push(token.clone());
                self.token_to_id.insert(token.clone(), id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.id_to_token.get(id).map(|token| token.as_str())
    }

    pub fn tokens(&self) -> &[String] {
        &self.id_to_token
    }

    /// Maps a document to its term ids, keeping order. Unknown tokens are skipped.
    pub fn encode(&self, document: &Document) -> Vec<usize> {
        document
            .tokens
            .iter()
            .filter_map(|token| self.id(token))
            .collect()
    }

    pub fn doc2bow(&self, document: &Document) -> BowVector {
        let counts: Counter<usize> = self.encode(document).into_iter().collect();
        let mut bow: BowVector = counts.into_iter().collect();
        bow.sort_unstable_by_key(|&(id, _)| id);
        bow
    }

    /// Expands a bag-of-words vector back into its token multiset.
    pub fn decode(&self, bow: &BowVector) -> Vec<String> {
        bow.iter()
            .filter_map(|&(id, count)| self.token(id).map(|token| (token, count)))
            .flat_map(|(token, count)| std::iter::repeat(token.to_string()).take(count))
            .collect()
    }
}

/// Everything the trainer and scorer need for one batch.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub vocabulary: Vocabulary,
    pub bow: Vec<BowVector>,
    pub weighted: WeightedCorpus,
}

impl Corpus {
    pub fn build(messages: &[Message]) -> Self {
        let documents: Vec<Document> = messages
            .iter()
            .map(|message| Document::from_text(&message.content))
            .collect();
        Corpus::from_documents(documents)
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        let vocabulary = Vocabulary::from_documents(&documents);
        let bow: Vec<BowVector> = documents
            .iter()
            .map(|document| vocabulary.doc2bow(document))
            .collect();
        let weighted = TfIdf::fit(&bow, vocabulary.len()).weight_corpus(&bow);

        Corpus {
            documents,
            vocabulary,
            bow,
            weighted,
        }
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    /// True when there is nothing to train on.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() || self.vocabulary.is_empty()
    }
}
