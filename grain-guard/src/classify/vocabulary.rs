//! Keyword vocabularies behind the column role heuristics.
//!
//! The defaults cover Portuguese and English business spreadsheets. A
//! vocabulary can be replaced wholesale from JSON; missing fields fall back to
//! the defaults.
//!
//! ```json
//! {
//!   "date_words": ["fecha", "date"],
//!   "metric_terms": ["precio", "price"],
//!   "grouping_synonyms": ["clave", "key"],
//!   "dimension_words": ["sku", "tienda", "store"],
//!   "min_dimension_hits": 2
//! }
//! ```

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, GrainError, Result};

/// Word lists used by the date, metric and aggregated-key heuristics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierVocabulary {
    /// Whole-word, case-insensitive matches mark a column as a date.
    pub date_words: Vec<String>,
    /// Case-insensitive substrings that mark a column as a metric.
    pub metric_terms: Vec<String>,
    /// Normalized names that are, on their own, a composite grouping key.
    pub grouping_synonyms: Vec<String>,
    /// Dimension words; a name containing several reads as an aggregate label.
    pub dimension_words: Vec<String>,
    /// How many dimension words a name needs to count as aggregated.
    pub min_dimension_hits: usize,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

impl Default for ClassifierVocabulary {
    fn default() -> Self {
        Self {
            date_words: words(&["data", "início", "inicio", "fim", "validade", "date"]),
            metric_terms: words(&[
                // pt
                "preço",
                "preco",
                "valor",
                "média",
                "media",
                "mediana",
                "movel",
                "margem",
                "volume",
                "quantidade",
                "qtd",
                "custo",
                "venda",
                "ranking",
                "desvio",
                "desempenho",
                "percentual",
                "estat",
                "frequência",
                "frequencia",
                // en
                "price",
                "value",
                "avg",
                "average",
                "median",
                "margin",
                "quantity",
                "cost",
                "sale",
                "score",
                "deviation",
                "percentage",
                "frequency",
                "rank",
                "min",
                "max",
                "wholesale",
                "retail",
                "unit",
            ]),
            grouping_synonyms: words(&[
                "chave",
                "agrupamento",
                "combinação",
                "agrup",
                "combina",
                "key",
                "grouping",
                "combination",
            ]),
            dimension_words: words(&[
                "sku", "uf", "produto", "estado", "regiao", "product", "state", "region",
            ]),
            min_dimension_hits: 2,
        }
    }
}

impl ClassifierVocabulary {
    /// Parses a vocabulary from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let vocabulary: Self = serde_json::from_str(json)?;
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// Reads a vocabulary from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Rejects settings that would make every column match.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_dimension_hits == 0 {
            return Err(GrainError::Configuration(
                "min_dimension_hits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the whole-word date-name pattern, `None` when there are no words.
    pub(crate) fn date_pattern(&self) -> Result<Option<Regex>> {
        alternation(&self.date_words, r"\b(?:", r")\b")
    }

    /// Builds the metric substring pattern, `None` when there are no terms.
    pub(crate) fn metric_pattern(&self) -> Result<Option<Regex>> {
        alternation(&self.metric_terms, "(?:", ")")
    }
}

fn alternation(terms: &[String], prefix: &str, suffix: &str) -> Result<Option<Regex>> {
    let escaped: Vec<String> = terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }

    let pattern = format!("{prefix}{}{suffix}", escaped.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| GrainError::Configuration(format!("Invalid vocabulary pattern: {e}")))
}
