//! Dynamic argument values as seen by cast pipelines.
//!
//! The model is deliberately small: scalars, attributed vectors, the two
//! sentinels (`Null` and `Missing`) and a few opaque host objects. Missing
//! data ("NA") is encoded the way the host language encodes it, with
//! in-band markers for integers and doubles.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NA markers
// ---------------------------------------------------------------------------

/// The integer NA marker.
pub const INT_NA: i32 = i32::MIN;

const DOUBLE_NA_BITS: u64 = 0x7FF0_0000_0000_07A2;
const DOUBLE_NA_LOW_WORD: u64 = 1954;

/// The double NA marker: a NaN whose low word is 1954.
pub fn double_na() -> f64 {
    f64::from_bits(DOUBLE_NA_BITS)
}

/// `true` for the double NA marker, `false` for every other value (including
/// ordinary NaN).
pub fn is_double_na(x: f64) -> bool {
    x.is_nan() && (x.to_bits() & 0xFFFF_FFFF) == DOUBLE_NA_LOW_WORD
}

// ---------------------------------------------------------------------------
// Logical and Complex element types
// ---------------------------------------------------------------------------

/// Three-valued logical element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Logical {
    True,
    False,
    Na,
}

impl Logical {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Logical::True
        } else {
            Logical::False
        }
    }

    pub fn to_bool(self) -> Option<bool> {
        match self {
            Logical::True => Some(true),
            Logical::False => Some(false),
            Logical::Na => None,
        }
    }

    pub fn is_na(self) -> bool {
        self == Logical::Na
    }
}

impl From<bool> for Logical {
    fn from(b: bool) -> Self {
        Logical::from_bool(b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    pub fn na() -> Self {
        Self {
            re: double_na(),
            im: 0.0,
        }
    }

    pub fn is_na(&self) -> bool {
        is_double_na(self.re) || is_double_na(self.im)
    }
}

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Element type of a vector (and of the matching scalar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Logical,
    Integer,
    Double,
    Character,
    Complex,
    Raw,
    List,
}

impl ElementKind {
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Logical => "logical",
            ElementKind::Integer => "integer",
            ElementKind::Double => "double",
            ElementKind::Character => "character",
            ElementKind::Complex => "complex",
            ElementKind::Raw => "raw",
            ElementKind::List => "list",
        }
    }

    /// Integer, double and logical elements count as numeric.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ElementKind::Logical | ElementKind::Integer | ElementKind::Double
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The exact runtime kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Missing,
    Scalar(ElementKind),
    Vector(ElementKind),
    Boolean,
    Function,
    Environment,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => f.write_str("NULL"),
            ValueKind::Missing => f.write_str("missing"),
            ValueKind::Scalar(k) => write!(f, "{k} scalar"),
            ValueKind::Vector(k) => write!(f, "{k} vector"),
            ValueKind::Boolean => f.write_str("boolean"),
            ValueKind::Function => f.write_str("function"),
            ValueKind::Environment => f.write_str("environment"),
        }
    }
}

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorData {
    Logical(Vec<Logical>),
    Integer(Vec<i32>),
    Double(Vec<f64>),
    Character(Vec<Option<String>>),
    Complex(Vec<Complex>),
    Raw(Vec<u8>),
    List(Vec<Value>),
}

impl VectorData {
    /// A zero-length payload of the given kind.
    pub fn empty(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Logical => VectorData::Logical(Vec::new()),
            ElementKind::Integer => VectorData::Integer(Vec::new()),
            ElementKind::Double => VectorData::Double(Vec::new()),
            ElementKind::Character => VectorData::Character(Vec::new()),
            ElementKind::Complex => VectorData::Complex(Vec::new()),
            ElementKind::Raw => VectorData::Raw(Vec::new()),
            ElementKind::List => VectorData::List(Vec::new()),
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            VectorData::Logical(_) => ElementKind::Logical,
            VectorData::Integer(_) => ElementKind::Integer,
            VectorData::Double(_) => ElementKind::Double,
            VectorData::Character(_) => ElementKind::Character,
            VectorData::Complex(_) => ElementKind::Complex,
            VectorData::Raw(_) => ElementKind::Raw,
            VectorData::List(_) => ElementKind::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VectorData::Logical(v) => v.len(),
            VectorData::Integer(v) => v.len(),
            VectorData::Double(v) => v.len(),
            VectorData::Character(v) => v.len(),
            VectorData::Complex(v) => v.len(),
            VectorData::Raw(v) => v.len(),
            VectorData::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element at `index` as a scalar value. List elements are returned
    /// as they are stored.
    pub fn element(&self, index: usize) -> Option<Value> {
        match self {
            VectorData::Logical(v) => v.get(index).map(|x| Value::Logical(*x)),
            VectorData::Integer(v) => v.get(index).map(|x| Value::Integer(*x)),
            VectorData::Double(v) => v.get(index).map(|x| Value::Double(*x)),
            VectorData::Character(v) => v.get(index).map(|x| Value::String(x.clone())),
            VectorData::Complex(v) => v.get(index).map(|x| Value::Complex(*x)),
            VectorData::Raw(v) => v.get(index).map(|x| Value::Raw(*x)),
            VectorData::List(v) => v.get(index).cloned(),
        }
    }

    /// `true` when any element is NA. Lists never contain NA themselves.
    pub fn has_na(&self) -> bool {
        match self {
            VectorData::Logical(v) => v.iter().any(|x| x.is_na()),
            VectorData::Integer(v) => v.iter().any(|x| *x == INT_NA),
            VectorData::Double(v) => v.iter().any(|x| is_double_na(*x)),
            VectorData::Character(v) => v.iter().any(Option::is_none),
            VectorData::Complex(v) => v.iter().any(Complex::is_na),
            VectorData::Raw(_) | VectorData::List(_) => false,
        }
    }
}

/// An attributed vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub data: VectorData,
    pub names: Option<Vec<String>>,
    pub dims: Option<Vec<usize>>,
    pub attributes: Vec<(String, Value)>,
}

impl Vector {
    pub fn new(data: VectorData) -> Self {
        Self {
            data,
            names: None,
            dims: None,
            attributes: Vec::new(),
        }
    }

    pub fn empty(kind: ElementKind) -> Self {
        Self::new(VectorData::empty(kind))
    }

    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_dims(mut self, dims: impl IntoIterator<Item = usize>) -> Self {
        self.dims = Some(dims.into_iter().collect());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.push((name.into(), value));
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drops names, dimensions and other attributes.
    pub fn strip(mut self) -> Self {
        self.names = None;
        self.dims = None;
        self.attributes.clear();
        self
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A dynamically-typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// The Empty sentinel.
    Null,
    /// The Absent sentinel: the argument was not supplied.
    Missing,
    Logical(Logical),
    Integer(i32),
    Double(f64),
    /// `None` is the string NA.
    String(Option<String>),
    Complex(Complex),
    Raw(u8),
    /// A host-level boolean, produced by mapping a logical.
    Boolean(bool),
    Vector(Vector),
    Function(String),
    Environment(String),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Some(s.into()))
    }

    pub fn string_na() -> Self {
        Value::String(None)
    }

    pub fn logical(b: bool) -> Self {
        Value::Logical(Logical::from_bool(b))
    }

    pub fn logical_na() -> Self {
        Value::Logical(Logical::Na)
    }

    pub fn int_na() -> Self {
        Value::Integer(INT_NA)
    }

    pub fn double_na() -> Self {
        Value::Double(double_na())
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Value::Complex(Complex::new(re, im))
    }

    pub fn vector(data: VectorData) -> Self {
        Value::Vector(Vector::new(data))
    }

    pub fn empty_vector(kind: ElementKind) -> Self {
        Value::Vector(Vector::empty(kind))
    }

    pub fn int_vec(values: impl Into<Vec<i32>>) -> Self {
        Value::vector(VectorData::Integer(values.into()))
    }

    pub fn double_vec(values: impl Into<Vec<f64>>) -> Self {
        Value::vector(VectorData::Double(values.into()))
    }

    pub fn logical_vec(values: impl Into<Vec<Logical>>) -> Self {
        Value::vector(VectorData::Logical(values.into()))
    }

    pub fn string_vec<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Value::vector(VectorData::Character(
            values.into_iter().map(|s| Some(s.into())).collect(),
        ))
    }

    pub fn complex_vec(values: impl Into<Vec<Complex>>) -> Self {
        Value::vector(VectorData::Complex(values.into()))
    }

    pub fn raw_vec(values: impl Into<Vec<u8>>) -> Self {
        Value::vector(VectorData::Raw(values.into()))
    }

    pub fn list(values: impl Into<Vec<Value>>) -> Self {
        Value::vector(VectorData::List(values.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// `true` for exactly the `Null` and `Missing` markers.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Value::Null | Value::Missing)
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Missing => ValueKind::Missing,
            Value::Logical(_) => ValueKind::Scalar(ElementKind::Logical),
            Value::Integer(_) => ValueKind::Scalar(ElementKind::Integer),
            Value::Double(_) => ValueKind::Scalar(ElementKind::Double),
            Value::String(_) => ValueKind::Scalar(ElementKind::Character),
            Value::Complex(_) => ValueKind::Scalar(ElementKind::Complex),
            Value::Raw(_) => ValueKind::Scalar(ElementKind::Raw),
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Vector(v) => ValueKind::Vector(v.kind()),
            Value::Function(_) => ValueKind::Function,
            Value::Environment(_) => ValueKind::Environment,
        }
    }

    /// Element kind of a scalar or vector; `None` for everything else.
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self.kind() {
            ValueKind::Scalar(k) | ValueKind::Vector(k) => Some(k),
            _ => None,
        }
    }

    /// `true` for scalars and vectors, which all behave as vectors.
    pub fn is_vector_like(&self) -> bool {
        self.element_kind().is_some()
    }

    /// Vector length, with scalars counted as length one. `None` for values
    /// that are not vector-like.
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::Vector(v) => Some(v.len()),
            _ if self.is_vector_like() => Some(1),
            _ => None,
        }
    }

    /// The first element of a vector-like value.
    pub fn first(&self) -> Option<Value> {
        match self {
            Value::Vector(v) => v.data.element(0),
            _ if self.is_vector_like() => Some(self.clone()),
            _ => None,
        }
    }

    /// The element at `index` of a vector-like value.
    pub fn element(&self, index: usize) -> Option<Value> {
        match self {
            Value::Vector(v) => v.data.element(index),
            _ if self.is_vector_like() && index == 0 => Some(self.clone()),
            _ => None,
        }
    }

    pub fn dims(&self) -> Option<&[usize]> {
        match self {
            Value::Vector(v) => v.dims.as_deref(),
            _ => None,
        }
    }

    /// `true` for an NA scalar or a vector holding at least one NA.
    pub fn is_na(&self) -> bool {
        match self {
            Value::Logical(l) => l.is_na(),
            Value::Integer(i) => *i == INT_NA,
            Value::Double(d) => is_double_na(*d),
            Value::String(s) => s.is_none(),
            Value::Complex(c) => c.is_na(),
            Value::Vector(v) => v.data.has_na(),
            _ => false,
        }
    }

    /// Numeric view of a scalar (or length-one vector). NA maps to `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) if *i != INT_NA => Some(f64::from(*i)),
            Value::Double(d) if !is_double_na(*d) => Some(*d),
            Value::Logical(l) => l.to_bool().map(|b| if b { 1.0 } else { 0.0 }),
            Value::Vector(v) if v.len() == 1 && v.kind().is_numeric() => {
                v.data.element(0).and_then(|e| e.as_f64())
            }
            _ => None,
        }
    }

    /// String view of a scalar string (or length-one character vector).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(Some(s)) => Some(s),
            Value::Vector(Vector {
                data: VectorData::Character(v),
                ..
            }) if v.len() == 1 => v[0].as_deref(),
            _ => None,
        }
    }

    /// Wraps a scalar into a length-one vector; vectors are returned as they are.
    pub fn into_vector(self) -> Option<Vector> {
        let data = match self {
            Value::Vector(v) => return Some(v),
            Value::Logical(x) => VectorData::Logical(vec![x]),
            Value::Integer(x) => VectorData::Integer(vec![x]),
            Value::Double(x) => VectorData::Double(vec![x]),
            Value::String(x) => VectorData::Character(vec![x]),
            Value::Complex(x) => VectorData::Complex(vec![x]),
            Value::Raw(x) => VectorData::Raw(vec![x]),
            _ => return None,
        };
        Some(Vector::new(data))
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Self {
        Value::Integer(x)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Double(x)
    }
}

/// Host-language `TRUE`/`FALSE`, i.e. a logical scalar.
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::logical(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Some(s))
    }
}

impl From<Logical> for Value {
    fn from(l: Logical) -> Self {
        Value::Logical(l)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Value::Vector(v)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn fmt_double(f: &mut fmt::Formatter<'_>, d: f64) -> fmt::Result {
    if is_double_na(d) {
        f.write_str("NA")
    } else if d.is_nan() {
        f.write_str("NaN")
    } else if d.is_infinite() {
        f.write_str(if d > 0.0 { "Inf" } else { "-Inf" })
    } else {
        write!(f, "{d}")
    }
}

fn fmt_complex(f: &mut fmt::Formatter<'_>, c: &Complex) -> fmt::Result {
    if c.is_na() {
        return f.write_str("NA");
    }
    fmt_double(f, c.re)?;
    if c.im >= 0.0 {
        f.write_str("+")?;
    }
    fmt_double(f, c.im)?;
    f.write_str("i")
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Logical::True => "TRUE",
            Logical::False => "FALSE",
            Logical::Na => "NA",
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Missing => f.write_str("<missing>"),
            Value::Logical(l) => write!(f, "{l}"),
            Value::Integer(i) if *i == INT_NA => f.write_str("NA"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) => fmt_double(f, *d),
            Value::String(Some(s)) => f.write_str(s),
            Value::String(None) => f.write_str("NA"),
            Value::Complex(c) => fmt_complex(f, c),
            Value::Raw(r) => write!(f, "{r:02x}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Function(name) => write!(f, "function {name}"),
            Value::Environment(name) => write!(f, "<environment: {name}>"),
            Value::Vector(v) if v.len() == 1 && v.kind() != ElementKind::List => {
                match v.data.element(0) {
                    Some(e) => write!(f, "{e}"),
                    None => Ok(()),
                }
            }
            Value::Vector(v) if v.is_empty() => write!(f, "{}(0)", v.kind()),
            Value::Vector(v) => {
                f.write_str(if v.kind() == ElementKind::List { "list(" } else { "c(" })?;
                for i in 0..v.len() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if let Some(e) = v.data.element(i) {
                        write!(f, "{e}")?;
                    }
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_na_is_distinct_from_nan() {
        assert!(is_double_na(double_na()));
        assert!(!is_double_na(f64::NAN));
        assert!(!is_double_na(1.0));
    }

    #[test]
    fn sentinels_are_exactly_null_and_missing() {
        assert!(Value::Null.is_sentinel());
        assert!(Value::Missing.is_sentinel());
        assert!(!Value::list(vec![Value::Null]).is_sentinel());
        assert!(!Value::empty_vector(ElementKind::Integer).is_sentinel());
    }

    #[test]
    fn scalars_behave_as_length_one_vectors() {
        assert_eq!(Value::Integer(3).length(), Some(1));
        assert_eq!(Value::Integer(3).first(), Some(Value::Integer(3)));
        assert_eq!(Value::int_vec([4, 5]).first(), Some(Value::Integer(4)));
        assert_eq!(Value::int_vec(Vec::<i32>::new()).first(), None);
        assert_eq!(Value::Function("f".into()).length(), None);
    }

    #[test]
    fn na_detection_covers_vectors() {
        assert!(Value::int_na().is_na());
        assert!(Value::string_na().is_na());
        assert!(Value::double_vec([1.0, double_na()]).is_na());
        assert!(!Value::double_vec([1.0, f64::NAN]).is_na());
        assert!(!Value::Null.is_na());
    }

    #[test]
    fn numeric_view() {
        assert_eq!(Value::Integer(2).as_f64(), Some(2.0));
        assert_eq!(Value::logical(true).as_f64(), Some(1.0));
        assert_eq!(Value::int_na().as_f64(), None);
        assert_eq!(Value::double_vec([2.5]).as_f64(), Some(2.5));
        assert_eq!(Value::double_vec([2.5, 1.0]).as_f64(), None);
        assert_eq!(Value::string("1").as_f64(), None);
    }

    #[test]
    fn display_matches_host_printing() {
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::logical_na().to_string(), "NA");
        assert_eq!(Value::Double(1.0).to_string(), "1");
        assert_eq!(Value::Double(3.5).to_string(), "3.5");
        assert_eq!(Value::int_vec([1, 2]).to_string(), "c(1, 2)");
        assert_eq!(Value::empty_vector(ElementKind::Integer).to_string(), "integer(0)");
        assert_eq!(Value::complex(1.0, -2.0).to_string(), "1-2i");
    }

    #[test]
    fn kinds() {
        assert_eq!(Value::Integer(1).kind(), ValueKind::Scalar(ElementKind::Integer));
        assert_eq!(Value::list(Vec::new()).kind(), ValueKind::Vector(ElementKind::List));
        assert_eq!(Value::Missing.element_kind(), None);
    }
}
