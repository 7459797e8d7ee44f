//! Pairwise document similarity over TF-IDF vectors
//!
//! Terms are lower-cased runs of two or more word characters with English
//! stop words removed. Weights use raw term counts and smoothed inverse
//! document frequency, `ln((1 + n) / (1 + df)) + 1`, and every vector is
//! L2-normalised so the cosine reduces to a dot product.

use crate::stop_words::is_stop_word;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// Symmetric n x n similarity matrix with 1.0 on the diagonal
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    fn identity(size: usize) -> Self {
        let mut values = vec![0.0; size * size];
        for i in 0..size {
            values[i * size + i] = 1.0;
        }
        Self { size, values }
    }

    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.size + j] = value;
        self.values[j * self.size + i] = value;
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Score between documents `i` and `j`, `None` if out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i < self.size && j < self.size {
            Some(self.values[i * self.size + j])
        } else {
            None
        }
    }

    /// Every unordered pair once, as `(i, j, score)` with `i < j`
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.size).flat_map(move |i| {
            (i + 1..self.size).map(move |j| (i, j, self.values[i * self.size + j]))
        })
    }
}

/// Lower-cased vocabulary terms of `text`, stop words removed
fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

/// L2-normalised TF-IDF vectors, one sparse map per document
fn tfidf_vectors<S: AsRef<str>>(texts: &[S]) -> Vec<HashMap<String, f64>> {
    let counts: Vec<HashMap<String, usize>> = texts
        .iter()
        .map(|text| {
            let mut tf = HashMap::new();
            for term in tokenize(text.as_ref()) {
                *tf.entry(term).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for tf in &counts {
        for term in tf.keys() {
            *doc_freq.entry(term.as_str()).or_insert(0) += 1;
        }
    }

    let n = texts.len() as f64;
    let idf = |term: &str| {
        let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
        ((1.0 + n) / (1.0 + df)).ln() + 1.0
    };

    counts
        .iter()
        .map(|tf| {
            let mut vector: HashMap<String, f64> = tf
                .iter()
                .map(|(term, &count)| (term.clone(), count as f64 * idf(term)))
                .collect();

            let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                for weight in vector.values_mut() {
                    *weight /= norm;
                }
            }
            vector
        })
        .collect()
}

/// Cosine of two normalised sparse vectors; 0.0 when either is empty
fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum();
    dot.clamp(0.0, 1.0)
}

/// Pairwise TF-IDF cosine similarity of `texts`.
///
/// Returns `None` for fewer than two texts. Texts with no vocabulary left
/// after stop-word removal score 0.0 against everything else.
pub fn score<S: AsRef<str>>(texts: &[S]) -> Option<SimilarityMatrix> {
    if texts.len() < 2 {
        return None;
    }

    let vectors = tfidf_vectors(texts);
    let mut matrix = SimilarityMatrix::identity(texts.len());
    for i in 0..vectors.len() {
        for j in i + 1..vectors.len() {
            matrix.set(i, j, cosine(&vectors[i], &vectors[j]));
        }
    }

    log::debug!("scored {} document pair(s)", matrix.pairs().count());
    Some(matrix)
}
