use std::fmt;

/// How a field participates in the secondary index
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    /// One token per non-zero value
    Equality,
    /// One token per UTC day bucket
    Time,
    /// Recognized, never tokenized
    Geoposition,
}

/// A field value as seen by the tokenizer
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
    /// Enumerated value, rendered by its label
    Label(&'static str),
}

impl FieldValue {
    pub fn text(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }

    /// Zero values produce no equality token. Labels are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Label(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Label(l) => f.write_str(l),
        }
    }
}

/// Typed accessor for one indexed field of `R`
pub enum FieldIndex<R> {
    Equality(fn(&R) -> FieldValue),
    /// Unix seconds
    Time(fn(&R) -> i64),
    Geoposition(fn(&R) -> f64),
}

/// One row of a record type's static index table
pub struct IndexedField<R> {
    pub name: &'static str,
    pub index: FieldIndex<R>,
}

impl<R> IndexedField<R> {
    pub const fn equality(name: &'static str, value: fn(&R) -> FieldValue) -> Self {
        Self {
            name,
            index: FieldIndex::Equality(value),
        }
    }

    pub const fn time(name: &'static str, value: fn(&R) -> i64) -> Self {
        Self {
            name,
            index: FieldIndex::Time(value),
        }
    }

    pub const fn geoposition(name: &'static str, value: fn(&R) -> f64) -> Self {
        Self {
            name,
            index: FieldIndex::Geoposition(value),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self.index {
            FieldIndex::Equality(_) => IndexKind::Equality,
            FieldIndex::Time(_) => IndexKind::Time,
            FieldIndex::Geoposition(_) => IndexKind::Geoposition,
        }
    }
}
