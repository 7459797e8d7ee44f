//! Publisher / venue format detection
//!
//! A fixed, ordered rule list evaluated first-match-wins over the extracted
//! text. DOI rules come first, keyword rules second, and anything else is
//! reported as an unknown format with zero confidence.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// DOI prefix `10.` + registrant code + `/` + suffix
static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,9}/\S+").unwrap());

/// Closed set of format labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    Ieee,
    Springer,
    Elsevier,
    Acm,
    EngineeringAndScience,
    PhysicaeOrganum,
    Unknown,
}

impl FormatTag {
    pub fn label(&self) -> &'static str {
        match self {
            FormatTag::Ieee => "IEEE Format",
            FormatTag::Springer => "Springer Format",
            FormatTag::Elsevier => "Elsevier Format",
            FormatTag::Acm => "ACM Format",
            FormatTag::EngineeringAndScience => "E&S Format",
            FormatTag::PhysicaeOrganum => "Physicae Organum Format",
            FormatTag::Unknown => "Unknown / Custom Format",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Detected format and a fixed per-rule confidence (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub format: FormatTag,
    pub confidence: u8,
}

impl Classification {
    pub const UNKNOWN: Classification = Classification {
        format: FormatTag::Unknown,
        confidence: 0,
    };
}

/// Inputs shared by every rule predicate
struct Evidence<'a> {
    lower: &'a str,
    doi: Option<&'a str>,
}

impl Evidence<'_> {
    fn mentions_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.lower.contains(k))
    }
}

struct Rule {
    tag: FormatTag,
    confidence: u8,
    matches: fn(&Evidence<'_>) -> bool,
}

/// DOI tier: the DOI starts with the publisher prefix, or the text names
/// the publisher. Only evaluated when a DOI was found.
const DOI_RULES: &[Rule] = &[
    Rule {
        tag: FormatTag::Ieee,
        confidence: 90,
        matches: |e| e.doi.is_some_and(|d| d.starts_with("10.1109")) || e.mentions_any(&["ieee"]),
    },
    Rule {
        tag: FormatTag::Springer,
        confidence: 90,
        matches: |e| {
            e.doi.is_some_and(|d| d.starts_with("10.1007")) || e.mentions_any(&["springer"])
        },
    },
    Rule {
        tag: FormatTag::Elsevier,
        confidence: 90,
        matches: |e| {
            e.doi.is_some_and(|d| d.starts_with("10.1016")) || e.mentions_any(&["elsevier"])
        },
    },
    Rule {
        tag: FormatTag::Acm,
        confidence: 90,
        matches: |e| e.doi.is_some_and(|d| d.starts_with("10.1145")) || e.mentions_any(&["acm"]),
    },
];

const KEYWORD_RULES: &[Rule] = &[
    Rule {
        tag: FormatTag::Ieee,
        confidence: 80,
        matches: |e| e.mentions_any(&["ieee", "digital object identifier"]),
    },
    Rule {
        tag: FormatTag::Springer,
        confidence: 80,
        matches: |e| e.mentions_any(&["springer", "springer nature"]),
    },
    Rule {
        tag: FormatTag::Elsevier,
        confidence: 80,
        matches: |e| e.mentions_any(&["elsevier", "journal homepage"]),
    },
    Rule {
        tag: FormatTag::Acm,
        confidence: 80,
        matches: |e| e.mentions_any(&["acm", "association for computing machinery"]),
    },
    Rule {
        tag: FormatTag::EngineeringAndScience,
        confidence: 70,
        matches: |e| e.mentions_any(&["engineering and science", "e&s"]),
    },
    Rule {
        tag: FormatTag::PhysicaeOrganum,
        confidence: 85,
        matches: |e| e.mentions_any(&["physicae organum", "universidade de brasília"]),
    },
];

/// First DOI in `text`, searched with line breaks removed so DOIs wrapped
/// across lines are still found
fn find_doi(text: &str) -> Option<String> {
    let joined: String = text.chars().filter(|&c| c != '\n').collect();
    DOI_RE.find(&joined).map(|m| m.as_str().to_string())
}

/// Classify extracted text into a publisher format.
///
/// Pure and deterministic. DOI rules strictly precede keyword rules; within
/// a tier the listed order decides.
pub fn classify(text: &str) -> Classification {
    let lower = text.to_lowercase();
    let doi = find_doi(text);
    let evidence = Evidence {
        lower: &lower,
        doi: doi.as_deref(),
    };

    let doi_tier: &[Rule] = if evidence.doi.is_some() { DOI_RULES } else { &[] };

    doi_tier
        .iter()
        .chain(KEYWORD_RULES)
        .find(|rule| (rule.matches)(&evidence))
        .map(|rule| Classification {
            format: rule.tag,
            confidence: rule.confidence,
        })
        .unwrap_or(Classification::UNKNOWN)
}
