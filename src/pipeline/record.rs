//! Row representation shared by the single-record and batch paths.
//!
//! A [`Record`] is one applicant row keyed by column name. Batch files are
//! loaded with polars and converted row by row, so both entry points feed
//! the same transform code.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Numeric view of the cell. Text is accepted when it parses as a number,
    /// since delimited files type a whole column as text if any cell is not
    /// numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Null => None,
        }
    }

    /// Canonical spelling for categorical lookups, `None` for null.
    ///
    /// Numbers and numeric text share one spelling (`1`, `1.0` and `"1.0"`
    /// all give `"1"`), so a cell keys the same whether its column was typed
    /// numeric or text.
    pub fn level_key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(float_key(*f)),
            Value::Text(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Some(float_key(f)),
                    _ => Some(trimmed.to_string()),
                }
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short description used in flag messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", s),
        }
    }
}

fn float_key(f: f64) -> String {
    // -0 and 0 are the same level
    if f == 0.0 {
        "0".to_string()
    } else {
        f.to_string()
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<AnyValue<'_>> for Value {
    fn from(av: AnyValue<'_>) -> Self {
        match av {
            AnyValue::Null => Value::Null,
            AnyValue::Boolean(b) => Value::Int(b as i64),
            AnyValue::Int8(n) => Value::Int(n as i64),
            AnyValue::Int16(n) => Value::Int(n as i64),
            AnyValue::Int32(n) => Value::Int(n as i64),
            AnyValue::Int64(n) => Value::Int(n),
            AnyValue::UInt8(n) => Value::Int(n as i64),
            AnyValue::UInt16(n) => Value::Int(n as i64),
            AnyValue::UInt32(n) => Value::Int(n as i64),
            AnyValue::UInt64(n) => Value::Int(n as i64),
            AnyValue::Float32(f) => Value::Float(f as f64),
            AnyValue::Float64(f) => Value::Float(f),
            AnyValue::String(s) => Value::Text(s.to_string()),
            AnyValue::StringOwned(s) => Value::Text(s.to_string()),
            other => Value::Text(other.to_string()),
        }
    }
}

/// One input row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Convert every row of a DataFrame into a [`Record`].
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<Record>> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut records = vec![Record::new(); df.height()];
    for name in &names {
        let series = df.column(name)?.as_materialized_series();
        for (record, av) in records.iter_mut().zip(series.iter()) {
            record.insert(name.clone(), Value::from(av));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_coerces() {
        assert_eq!(Value::Text(" 1200 ".to_string()).as_f64(), Some(1200.0));
        assert_eq!(Value::Text("n/a".to_string()).as_f64(), None);
        assert_eq!(Value::Int(5).as_f64(), Some(5.0));
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_level_key_ignores_column_typing() {
        assert_eq!(Value::Float(1.0).level_key().as_deref(), Some("1"));
        assert_eq!(Value::Int(1).level_key().as_deref(), Some("1"));
        assert_eq!(Value::from("1.0").level_key().as_deref(), Some("1"));
        assert_eq!(Value::from(" 0.25 ").level_key().as_deref(), Some("0.25"));
        assert_eq!(Value::Float(-0.0).level_key().as_deref(), Some("0"));
        assert_eq!(Value::from(" Own ").level_key().as_deref(), Some("Own"));
        assert_eq!(Value::Null.level_key(), None);
    }

    #[test]
    fn test_record_deserializes_typed_fields() {
        let record: Record =
            serde_json::from_str(r#"{"Income": 54000, "DTI_Ratio": 0.31, "State": "TX", "Gap": null}"#)
                .unwrap();

        assert_eq!(record.get("Income"), Some(&Value::Int(54000)));
        assert_eq!(record.get("DTI_Ratio"), Some(&Value::Float(0.31)));
        assert_eq!(record.get("State"), Some(&Value::Text("TX".to_string())));
        assert_eq!(record.get("Gap"), Some(&Value::Null));
    }

    #[test]
    fn test_records_from_dataframe() {
        let df = df! {
            "Income" => [54000i64, 61000],
            "Utilization_Ratio" => [Some(0.42f64), None],
            "State" => ["TX", "CA"],
        }
        .unwrap();

        let records = records_from_dataframe(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Utilization_Ratio"), Some(&Value::Float(0.42)));
        assert_eq!(records[1].get("Utilization_Ratio"), Some(&Value::Null));
        assert_eq!(records[1].get("State"), Some(&Value::Text("CA".to_string())));
        assert_eq!(records[1].get("Income"), Some(&Value::Int(61000)));
    }
}
