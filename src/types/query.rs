use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::MarketCategory;

/// Comparison applied by the upstream to a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equal,
    Greater,
    NotEmpty,
}

/// A single `left <op> right` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Equal,
            value: value.into(),
        }
    }

    pub fn greater(field: impl Into<String>, value: f64) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Greater,
            value: Value::from(value),
        }
    }

    pub fn not_empty(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::NotEmpty,
            value: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// One batched upstream request: every column a scan needs, in one round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenerQuery {
    /// Lower-case exchange name as registered.
    pub exchange: String,
    pub market: MarketCategory,
    pub fields: Vec<String>,
    pub filters: Vec<FieldFilter>,
    /// Restrict to these tickers instead of filtering by exchange column.
    pub tickers: Vec<String>,
    pub sort: Option<SortSpec>,
    pub limit: usize,
    /// An empty answer to this query means the upstream failed, not that
    /// nothing matched. Universe scans always expect rows.
    pub expect_rows: bool,
}

impl ScreenerQuery {
    pub fn new(exchange: impl Into<String>, market: MarketCategory) -> Self {
        Self {
            exchange: exchange.into(),
            market,
            fields: Vec::new(),
            filters: Vec::new(),
            tickers: Vec::new(),
            sort: None,
            limit: 50,
            expect_rows: true,
        }
    }

    /// Add columns, skipping duplicates while keeping first-seen order.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = tickers;
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn expect_rows(mut self, expect_rows: bool) -> Self {
        self.expect_rows = expect_rows;
        self
    }
}

/// One upstream record: the ticker plus its field-keyed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub ticker: String,
    pub values: HashMap<String, Value>,
}

impl RawRow {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            values: HashMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// Numeric value of a field. Null, non-numeric and non-finite values are
    /// treated as absent so they never masquerade as zero.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.values
            .get(field)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(Value::as_str)
    }
}
