//! Batch analysis report returned to the caller

use crate::classifier::Classification;
use crate::similarity::SimilarityMatrix;
use serde::Serialize;

/// Classification of one processed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentResult {
    pub filename: String,
    /// Format label, e.g. "IEEE Format"
    pub format: String,
    /// Integer percentage, e.g. "90%"
    pub confidence: String,
}

impl DocumentResult {
    pub fn new(filename: impl Into<String>, classification: Classification) -> Self {
        Self {
            filename: filename.into(),
            format: classification.format.label().to_string(),
            confidence: format!("{}%", classification.confidence),
        }
    }
}

/// Similarity between two distinct documents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityEntry {
    pub file1: String,
    pub file2: String,
    /// Percentage with two decimals, e.g. "42.17%"
    pub similarity: String,
}

impl SimilarityEntry {
    pub fn new(file1: impl Into<String>, file2: impl Into<String>, score: f64) -> Self {
        Self {
            file1: file1.into(),
            file2: file2.into(),
            similarity: format!("{:.2}%", score * 100.0),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub results: Vec<DocumentResult>,
    pub similarity: Vec<SimilarityEntry>,
}

impl AnalysisReport {
    /// One entry per unordered pair of `filenames`, in `i < j` order
    pub(crate) fn similarity_entries(
        filenames: &[String],
        matrix: Option<&SimilarityMatrix>,
    ) -> Vec<SimilarityEntry> {
        let Some(matrix) = matrix else {
            return Vec::new();
        };
        matrix
            .pairs()
            .filter_map(|(i, j, s)| {
                Some(SimilarityEntry::new(
                    filenames.get(i)?.clone(),
                    filenames.get(j)?.clone(),
                    s,
                ))
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
