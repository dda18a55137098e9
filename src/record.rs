//! Per-sample result rows
//!
//! Every parser returns a flat, ordered `Record` (column name -> JSON value).
//! A `SampleRecord` accumulates those records for one sample, joined on the
//! `sample` column, until the rank classifier finalizes it into a `RankedSample`.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;

use crate::rank::Rank;

/// Ordered column name -> value mapping produced by a single parser
pub type Record = IndexMap<String, Value>;

/// Join column shared by every parser output
pub const SAMPLE_KEY: &str = "sample";

/// A sample whose per-tool results are still being merged
#[derive(Debug, Clone)]
pub struct SampleRecord {
    pub sample_id: String,
    pub metrics: Record,
}

/// A sample after ranking; never mutated again
#[derive(Debug, Clone)]
pub struct RankedSample {
    pub sample_id: String,
    pub metrics: Record,
    pub rank: Rank,
    pub reason: String,
}

impl SampleRecord {
    pub fn new(sample_id: &str) -> Self {
        let mut metrics = Record::new();
        metrics.insert(SAMPLE_KEY.to_string(), Value::String(sample_id.to_string()));
        Self {
            sample_id: sample_id.to_string(),
            metrics,
        }
    }

    /// Merge one parser's output into this sample.
    ///
    /// The `sample` column must match the sample being built. Any other column
    /// that is already present is an error; parser outputs are namespaced so
    /// a collision means two parsers disagree about a field.
    pub fn merge(&mut self, other: Record) -> Result<()> {
        for (key, val) in other {
            if key == SAMPLE_KEY {
                let joined = val.as_str().unwrap_or_default();
                if joined != self.sample_id {
                    anyhow::bail!(
                        "Cannot join results for '{}' with results for '{}'",
                        self.sample_id,
                        render_field(&val)
                    );
                }
                continue;
            }

            if self.metrics.contains_key(&key) {
                anyhow::bail!("Duplicate column '{}' while merging sample '{}'", key, self.sample_id);
            }
            self.metrics.insert(key, val);
        }
        Ok(())
    }

    /// Look up a metric that the classifier needs
    pub fn require(&self, key: &str) -> Result<&Value> {
        self.metrics
            .get(key)
            .with_context(|| format!("Sample '{}' is missing required metric '{}'", self.sample_id, key))
    }

    pub fn finalize(self, rank: Rank, reason: String) -> RankedSample {
        RankedSample {
            sample_id: self.sample_id,
            metrics: self.metrics,
            rank,
            reason,
        }
    }
}

/// Interpret a value as a float, accepting numeric strings
pub fn value_as_f64(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("Cannot represent {} as a float", n)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .with_context(|| format!("Expected a number, found '{}'", s)),
        other => anyhow::bail!("Expected a number, found {}", other),
    }
}

/// Interpret a value as an integer; floats are truncated, strings must be integral
pub fn value_as_i64(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else {
                n.as_f64()
                    .map(|f| f.trunc() as i64)
                    .with_context(|| format!("Cannot represent {} as an integer", n))
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("Expected an integer, found '{}'", s)),
        other => anyhow::bail!("Expected an integer, found {}", other),
    }
}

pub fn value_as_bool(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim() {
            "True" | "true" => Ok(true),
            "False" | "false" => Ok(false),
            _ => anyhow::bail!("Expected a boolean, found '{}'", s),
        },
        other => anyhow::bail!("Expected a boolean, found {}", other),
    }
}

/// Render a value as a single TSV field
pub fn render_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        nested => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_merge_keeps_insertion_order() {
        let mut sample = SampleRecord::new("S1");
        sample
            .merge(record(&[("sample", json!("S1")), ("assembler_total_contig", json!("42"))]))
            .unwrap();
        sample
            .merge(record(&[("sample", json!("S1")), ("mlst_st", json!("8"))]))
            .unwrap();

        let keys: Vec<&str> = sample.metrics.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["sample", "assembler_total_contig", "mlst_st"]);
    }

    #[test]
    fn test_merge_rejects_duplicate_column() {
        let mut sample = SampleRecord::new("S1");
        sample.merge(record(&[("mlst_st", json!("8"))])).unwrap();
        assert!(sample.merge(record(&[("mlst_st", json!("9"))])).is_err());
    }

    #[test]
    fn test_merge_rejects_other_sample() {
        let mut sample = SampleRecord::new("S1");
        assert!(sample.merge(record(&[("sample", json!("S2"))])).is_err());
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(value_as_f64(&json!("30.25")).unwrap(), 30.25);
        assert_eq!(value_as_f64(&json!(12)).unwrap(), 12.0);
        assert_eq!(value_as_i64(&json!("150")).unwrap(), 150);
        assert_eq!(value_as_i64(&json!(99.9)).unwrap(), 99);
        assert!(value_as_i64(&json!("12.5")).is_err());
        assert!(value_as_f64(&json!("abc")).is_err());
        assert!(value_as_bool(&json!(true)).unwrap());
        assert!(!value_as_bool(&json!("False")).unwrap());
    }

    #[test]
    fn test_render_field() {
        assert_eq!(render_field(&json!(null)), "");
        assert_eq!(render_field(&json!(true)), "True");
        assert_eq!(render_field(&json!(1500)), "1500");
        assert_eq!(render_field(&json!("Staphylococcus aureus")), "Staphylococcus aureus");
        assert_eq!(render_field(&json!([1, 2])), "[1,2]");
    }
}
