//! Table query parameters in the service's URL syntax.
//!
//! Supported: `col=eq.value`, `col=neq.value`, `col=ilike.pattern` (`*` for
//! any run, `_` for one character), `order=col.asc|desc`, `select=a,b`,
//! `limit=n`. Anything else is rejected with a `400`.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// One column predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Neq(String, String),
    Ilike(String, String),
}

impl Filter {
    fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(col, v) => row.get(col).is_some_and(|c| cell_text(c) == *v),
            Filter::Neq(col, v) => row.get(col).is_some_and(|c| cell_text(c) != *v),
            Filter::Ilike(col, pattern) => row
                .get(col)
                .and_then(Value::as_str)
                .is_some_and(|s| ilike(s, pattern)),
        }
    }
}

/// Parsed query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableQuery {
    pub filters: Vec<Filter>,
    pub order: Option<(String, bool)>,
    pub columns: Option<Vec<String>>,
    pub limit: Option<usize>,
}

impl TableQuery {
    pub fn parse(params: &[(String, String)]) -> Result<Self, String> {
        let mut query = TableQuery::default();
        for (key, value) in params {
            match key.as_str() {
                "select" => {
                    if value != "*" {
                        query.columns =
                            Some(value.split(',').map(|c| c.trim().to_string()).collect());
                    }
                }
                "order" => {
                    let (col, dir) = value.split_once('.').unwrap_or((value.as_str(), "asc"));
                    let ascending = match dir {
                        "asc" => true,
                        "desc" => false,
                        other => return Err(format!("unknown order direction \"{other}\"")),
                    };
                    query.order = Some((col.to_string(), ascending));
                }
                "limit" => {
                    let n = value
                        .parse()
                        .map_err(|_| format!("invalid limit \"{value}\""))?;
                    query.limit = Some(n);
                }
                column => {
                    let (op, operand) = value
                        .split_once('.')
                        .ok_or_else(|| format!("malformed filter \"{column}={value}\""))?;
                    let filter = match op {
                        "eq" => Filter::Eq(column.to_string(), operand.to_string()),
                        "neq" => Filter::Neq(column.to_string(), operand.to_string()),
                        "ilike" => Filter::Ilike(column.to_string(), operand.to_string()),
                        other => return Err(format!("unsupported operator \"{other}\"")),
                    };
                    query.filters.push(filter);
                }
            }
        }
        Ok(query)
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Sort, limit and project matching rows.
    pub fn shape(&self, mut rows: Vec<Value>) -> Vec<Value> {
        if let Some((col, ascending)) = &self.order {
            rows.sort_by(|a, b| {
                let ord = compare_cells(a.get(col), b.get(col));
                if *ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(n) = self.limit {
            rows.truncate(n);
        }
        match &self.columns {
            Some(cols) => rows.iter().map(|r| project(r, cols)).collect(),
            None => rows,
        }
    }
}

fn project(row: &Value, cols: &[String]) -> Value {
    let mut out = Map::new();
    for col in cols {
        if let Some(v) = row.get(col) {
            out.insert(col.clone(), v.clone());
        }
    }
    Value::Object(out)
}

/// A cell rendered the way it appears in a filter operand.
fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        // Nulls sort last ascending.
        (None | Some(Value::Null), Some(_)) => Ordering::Greater,
        (Some(_), None | Some(Value::Null)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Case-insensitive match where `*` stands for any run of characters.
/// Case-insensitive match where `*` (or `%`) spans any run of characters
/// and `_` stands for exactly one.
fn ilike(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let (mut t, mut p) = (0, 0);
    // Last `*` seen and the text position it is currently absorbing up to.
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some('*' | '%') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    star = Some((sp, st + 1));
                    p = sp + 1;
                    t = st + 1;
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|c| matches!(c, '*' | '%'))
}
