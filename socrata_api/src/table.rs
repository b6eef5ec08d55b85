//! Tabular results and the JSON/CSV decoders.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// Response body format, selected from the endpoint suffix before any
/// network call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Csv,
}

impl ResponseFormat {
    /// Picks the decoder for an endpoint. Any suffix other than `.json`
    /// or `.csv` fails with [`Error::UnsupportedFormat`]; the response
    /// content type is never sniffed as a fallback.
    pub fn from_endpoint(endpoint: &str) -> Result<Self, Error> {
        if endpoint.ends_with(".json") {
            Ok(ResponseFormat::Json)
        } else if endpoint.ends_with(".csv") {
            Ok(ResponseFormat::Csv)
        } else {
            Err(Error::UnsupportedFormat {
                endpoint: endpoint.to_string(),
            })
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl DataValue {
    fn from_json(value: &JsonValue) -> DataValue {
        match value {
            JsonValue::Null => DataValue::Null,
            JsonValue::Bool(b) => DataValue::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DataValue::Integer(i)
                } else if let Some(x) = n.as_f64() {
                    DataValue::Float(x)
                } else {
                    DataValue::Text(n.to_string())
                }
            }
            JsonValue::String(s) => DataValue::Text(s.clone()),
            // Cells are scalar-only; nested values are kept as serialized text.
            other => DataValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => Ok(()),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Integer(n) => write!(f, "{}", n),
            DataValue::Float(x) => write!(f, "{}", x),
            DataValue::Text(s) => f.write_str(s),
        }
    }
}

/// An in-memory table: ordered column names plus rows of scalar cells.
///
/// JSON records with differing key sets are aligned by column union,
/// padding missing cells with [`DataValue::Null`]. Row order is
/// preserved within and across appended pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<DataValue>>,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<DataValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&DataValue> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col)
    }

    /// Index of `name`, adding the column (and null-padding existing
    /// rows) if it is new.
    fn column_index(&mut self, name: &str) -> usize {
        match self.columns.iter().position(|c| c == name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(DataValue::Null);
                }
                self.columns.len() - 1
            }
        }
    }

    /// Decodes a response body with the given decoder.
    pub fn decode(format: ResponseFormat, body: &str) -> Result<Self, Error> {
        match format {
            ResponseFormat::Json => Self::from_json_records(body),
            ResponseFormat::Csv => Self::from_csv(body),
        }
    }

    /// Decodes a JSON body in records orientation (an array of objects).
    pub fn from_json_records(body: &str) -> Result<Self, Error> {
        let parsed: JsonValue =
            serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
        let records = parsed
            .as_array()
            .ok_or_else(|| Error::Decode("expected a JSON array of records".to_string()))?;

        let mut table = DataTable::new();
        for record in records {
            let object = record.as_object().ok_or_else(|| {
                Error::Decode("expected each record to be a JSON object".to_string())
            })?;
            let mut row = vec![DataValue::Null; table.columns.len()];
            for (key, value) in object {
                let idx = table.column_index(key);
                if idx == row.len() {
                    row.push(DataValue::from_json(value));
                } else {
                    row[idx] = DataValue::from_json(value);
                }
            }
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Decodes a CSV body with a header row. Empty fields become null.
    pub fn from_csv(body: &str) -> Result<Self, Error> {
        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| Error::Decode(e.to_string()))?
            .clone();

        let mut table = DataTable::new();
        table.columns = headers.iter().map(|h| h.to_string()).collect();
        for record in reader.records() {
            let record = record.map_err(|e| Error::Decode(e.to_string()))?;
            let row = record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        DataValue::Null
                    } else {
                        DataValue::Text(field.to_string())
                    }
                })
                .collect();
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Appends all rows of `other`, aligning columns by name. Columns
    /// present in only one side are null-padded on the other.
    pub fn append(&mut self, other: DataTable) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.column_index(name))
            .collect();
        for row in other.rows {
            let mut aligned = vec![DataValue::Null; self.columns.len()];
            for (value, &idx) in row.into_iter().zip(&mapping) {
                aligned[idx] = value;
            }
            self.rows.push(aligned);
        }
    }
}
