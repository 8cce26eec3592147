//! In-memory evaluation of a parsed [`Condition`], mirroring the SQL the
//! generator emits: comparisons against NULL are false, LIKE honours `%`, `_`
//! and backslash escapes, and NULLs sort as the largest value.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::types::{find_column, Column, Condition, FilterOp, FilterOrderInfo, SortDirection, SqlType};

pub fn matches(condition: &Condition, row: &Map<String, Value>, columns: &[Column]) -> bool {
    match condition {
        Condition::All(parts) => parts.iter().all(|c| matches(c, row, columns)),
        Condition::Any(parts) => parts.iter().any(|c| matches(c, row, columns)),
        Condition::Not(inner) => !matches(inner, row, columns),
        Condition::Field { column, op, data } => {
            let sql_type = find_column(columns, column).map(|c| c.sql_type).unwrap_or(SqlType::Text);
            let value = normalize(row.get(column).unwrap_or(&Value::Null), sql_type);
            matches_field(&value, *op, data, sql_type)
        }
    }
}

fn matches_field(value: &Value, op: FilterOp, data: &Value, sql_type: SqlType) -> bool {
    match op {
        FilterOp::Null => value.is_null() == data.as_bool().unwrap_or(true),
        FilterOp::Eq if data.is_null() => value.is_null(),
        FilterOp::Ne if data.is_null() => !value.is_null(),
        _ if value.is_null() => false,
        FilterOp::Eq => compare(value, &normalize(data, sql_type)) == Some(Ordering::Equal),
        FilterOp::Ne => compare(value, &normalize(data, sql_type)).is_some_and(|o| o != Ordering::Equal),
        FilterOp::Gt => compare(value, &normalize(data, sql_type)) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(value, &normalize(data, sql_type)), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(value, &normalize(data, sql_type)) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(value, &normalize(data, sql_type)), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like | FilterOp::NLike | FilterOp::ILike | FilterOp::NILike => {
            let pattern = data.as_str().unwrap_or_default();
            let insensitive = matches!(op, FilterOp::ILike | FilterOp::NILike);
            let hit = like(&as_text(value), pattern, insensitive);
            if matches!(op, FilterOp::NLike | FilterOp::NILike) { !hit } else { hit }
        }
        FilterOp::In | FilterOp::NIn => {
            let found = data
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .any(|v| compare(value, &normalize(v, sql_type)) == Some(Ordering::Equal))
                })
                .unwrap_or(false);
            if op == FilterOp::In { found } else { !found }
        }
        FilterOp::Between => match data.as_array().map(Vec::as_slice) {
            Some([low, high]) => {
                matches!(compare(value, &normalize(low, sql_type)), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(value, &normalize(high, sql_type)), Some(Ordering::Less | Ordering::Equal))
            }
            _ => false,
        },
    }
}

/// Coerce a JSON value to the canonical form of its column type.
fn normalize(value: &Value, sql_type: SqlType) -> Value {
    match (sql_type, value) {
        (SqlType::Uuid, Value::String(s)) => Uuid::parse_str(s)
            .map(|u| Value::String(u.to_string()))
            .unwrap_or_else(|_| value.clone()),
        (SqlType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)))
            .unwrap_or_else(|_| value.clone()),
        (SqlType::Integer | SqlType::SmallInt, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| value.clone()),
        (SqlType::Boolean, Value::String(s)) => s.parse::<bool>().map(Value::Bool).unwrap_or_else(|_| value.clone()),
        _ => value.clone(),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Many,
    One,
    Lit(char),
}

fn tokenize(pattern: &str, insensitive: bool) -> Vec<Token> {
    let mut out = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            '%' => Token::Many,
            '_' => Token::One,
            c => Token::Lit(c),
        };
        out.push(match token {
            Token::Lit(c) if insensitive => Token::Lit(c.to_lowercase().next().unwrap_or(c)),
            other => other,
        });
    }
    out
}

pub fn like(text: &str, pattern: &str, insensitive: bool) -> bool {
    let text: Vec<char> = if insensitive {
        text.to_lowercase().chars().collect()
    } else {
        text.chars().collect()
    };
    let tokens = tokenize(pattern, insensitive);

    let (mut t, mut p) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < tokens.len() {
            match tokens[p] {
                Token::Many => {
                    backtrack = Some((p + 1, t));
                    p += 1;
                    continue;
                }
                Token::One => {
                    t += 1;
                    p += 1;
                    continue;
                }
                Token::Lit(c) if c == text[t] => {
                    t += 1;
                    p += 1;
                    continue;
                }
                Token::Lit(_) => {}
            }
        }
        match backtrack {
            Some((resume, consumed)) => {
                p = resume;
                t = consumed + 1;
                backtrack = Some((resume, consumed + 1));
            }
            None => return false,
        }
    }
    tokens[p..].iter().all(|t| *t == Token::Many)
}

/// Row ordering for `ORDER BY`. NULL is larger than every value, as in Postgres.
pub fn compare_rows(a: &Map<String, Value>, b: &Map<String, Value>, order: &[FilterOrderInfo]) -> Ordering {
    for info in order {
        let left = a.get(&info.column).unwrap_or(&Value::Null);
        let right = b.get(&info.column).unwrap_or(&Value::Null);
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare(left, right).unwrap_or(Ordering::Equal),
        };
        let ordering = match info.sort {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
