//! Query description types for the session document store.
//!
//! A store holds JSON documents keyed by `session_id`. Lookups, updates and
//! scans are described with the closed set of variants below so that every
//! backend interprets the same query the same way:
//!
//! - [`Filter`]: a conjunction of [`Predicate`]s (equality, not-equal)
//! - [`Update`]: a list of [`UpdateOp`]s (set, push, push-each)
//! - [`FindQuery`]: filter + optional [`Sort`] + optional limit
//!
//! Value ordering ([`compare_values`]) follows SQLite's ordering of
//! `json_extract` results: missing/null first, then booleans and numbers
//! (booleans as 0/1), then text. Arrays and objects compare by their JSON text.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::error::StoreError;

/// A stored document: a JSON object with top-level fields.
pub type Document = Map<String, Value>;

/// Field that uniquely keys every document in a store.
pub const KEY_FIELD: &str = "session_id";

/// Extract the unique key of a document.
pub fn document_key(document: &Document) -> Result<&str, StoreError> {
    document
        .get(KEY_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Query(format!("document has no string '{KEY_FIELD}'")))
}

/// A single condition on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value. `Eq(field, null)` also matches a missing field.
    Eq { field: String, value: Value },
    /// Field is missing, null, or not equal to the value.
    Ne { field: String, value: Value },
}

impl Predicate {
    /// Name of the field this predicate inspects.
    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. } | Predicate::Ne { field, .. } => field,
        }
    }

    /// Evaluate the predicate against a document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Predicate::Eq { field, value } => {
                compare_values(document.get(field), Some(value)) == Ordering::Equal
            }
            Predicate::Ne { field, value } => {
                compare_values(document.get(field), Some(value)) != Ordering::Equal
            }
        }
    }
}

/// Conjunction of predicates. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching the document with the given `session_id`.
    pub fn by_key(session_id: &str) -> Self {
        Self::all().eq(KEY_FIELD, session_id)
    }

    /// Add an equality predicate.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Eq {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    /// Add a not-equal predicate. Documents missing the field satisfy it.
    pub fn ne(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::Ne {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// True when every predicate matches.
    pub fn matches(&self, document: &Document) -> bool {
        self.predicates.iter().all(|p| p.matches(document))
    }
}

/// A single mutation applied by `update_one`.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Overwrite (or create) a field.
    Set { field: String, value: Value },
    /// Append one value to an array field.
    Push { field: String, value: Value },
    /// Append every value, in order, to an array field.
    PushEach { field: String, values: Vec<Value> },
}

/// An ordered list of mutations applied atomically to one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Set {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn push(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.ops.push(UpdateOp::Push {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn push_each(mut self, field: &str, values: Vec<Value>) -> Self {
        self.ops.push(UpdateOp::PushEach {
            field: field.to_string(),
            values,
        });
        self
    }

    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every operation to `document`.
    ///
    /// Pushing onto a missing or null field creates the array. Pushing onto a
    /// non-array field fails and leaves `document` untouched.
    pub fn apply(&self, document: &mut Document) -> Result<(), StoreError> {
        let mut next = document.clone();
        for op in &self.ops {
            match op {
                UpdateOp::Set { field, value } => {
                    next.insert(field.clone(), value.clone());
                }
                UpdateOp::Push { field, value } => {
                    array_field(&mut next, field)?.push(value.clone());
                }
                UpdateOp::PushEach { field, values } => {
                    array_field(&mut next, field)?.extend(values.iter().cloned());
                }
            }
        }
        *document = next;
        Ok(())
    }
}

fn array_field<'a>(document: &'a mut Document, field: &str) -> Result<&'a mut Vec<Value>, StoreError> {
    let slot = document
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    slot.as_array_mut()
        .ok_or_else(|| StoreError::Query(format!("cannot push onto non-array field '{field}'")))
}

/// Sort direction for a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort key: one field, one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Everything a backend needs to answer a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
}

/// Total order over optional JSON values, matching SQLite's ordering of
/// `json_extract` results.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (SortKey::of(a), SortKey::of(b)) {
        (SortKey::Null, SortKey::Null) => Ordering::Equal,
        (SortKey::Null, _) => Ordering::Less,
        (_, SortKey::Null) => Ordering::Greater,
        (SortKey::Int(x), SortKey::Int(y)) => x.cmp(&y),
        (SortKey::Int(x), SortKey::Real(y)) => compare_int_real(x, y),
        (SortKey::Real(x), SortKey::Int(y)) => compare_int_real(y, x).reverse(),
        (SortKey::Real(x), SortKey::Real(y)) => x.total_cmp(&y),
        (SortKey::Int(_) | SortKey::Real(_), SortKey::Text(_)) => Ordering::Less,
        (SortKey::Text(_), SortKey::Int(_) | SortKey::Real(_)) => Ordering::Greater,
        (SortKey::Text(x), SortKey::Text(y)) => x.as_bytes().cmp(y.as_bytes()),
    }
}

/// Exact comparison of an integer with a real, without rounding the integer
/// through `f64`.
fn compare_int_real(int: i64, real: f64) -> Ordering {
    // 2^63 as f64; every real at or beyond it lies outside i64.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if real >= BOUND {
        return Ordering::Less;
    }
    if real < -BOUND {
        return Ordering::Greater;
    }
    let whole = real.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.total_cmp(&(real - whole)),
        unequal => unequal,
    }
}

enum SortKey {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl SortKey {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SortKey::Null,
            Some(Value::Bool(b)) => SortKey::Int(i64::from(*b)),
            // SQLite stores integers beyond i64 as reals.
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => SortKey::Int(i),
                None => SortKey::Real(n.as_f64().unwrap_or(0.0)),
            },
            Some(Value::String(s)) => SortKey::Text(s.clone()),
            Some(other) => SortKey::Text(other.to_string()),
        }
    }
}
