//! Tri-state filter algebra.
//!
//! A [`Filter`] evaluates a candidate [`Value`] to [`FilterResult::Pass`],
//! [`FilterResult::Fail`] or [`FilterResult::Undefined`]. Filters never raise;
//! turning a result into an abort or warning is the engine's job.
//!
//! Sentinel behaviour of the atoms:
//!
//! | atom                                     | `Null`     | `Missing`  |
//! |------------------------------------------|------------|------------|
//! | `Any`                                    | Pass       | Pass       |
//! | `Null`                                   | Pass       | Fail       |
//! | `Missing`                                | Fail       | Pass       |
//! | other type atoms                         | Fail       | Fail       |
//! | value, string, NA and structural atoms   | Undefined  | Undefined  |
//! | `EqualTo(v)`                             | compared   | compared   |

use std::fmt;
use std::sync::Arc;

use argcast_types::{is_double_na, ElementKind, Value, ValueKind};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FilterResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterResult {
    Pass,
    Fail,
    Undefined,
}

impl FilterResult {
    pub fn from_bool(b: bool) -> Self {
        if b {
            FilterResult::Pass
        } else {
            FilterResult::Fail
        }
    }

    /// `Fail` dominates, then `Undefined`.
    pub fn and(self, other: FilterResult) -> FilterResult {
        use FilterResult::*;
        match (self, other) {
            (Fail, _) | (_, Fail) => Fail,
            (Undefined, _) | (_, Undefined) => Undefined,
            (Pass, Pass) => Pass,
        }
    }

    /// `Pass` dominates, then `Undefined`.
    pub fn or(self, other: FilterResult) -> FilterResult {
        use FilterResult::*;
        match (self, other) {
            (Pass, _) | (_, Pass) => Pass,
            (Undefined, _) | (_, Undefined) => Undefined,
            (Fail, Fail) => Fail,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> FilterResult {
        match self {
            FilterResult::Pass => FilterResult::Fail,
            FilterResult::Fail => FilterResult::Pass,
            FilterResult::Undefined => FilterResult::Undefined,
        }
    }

    pub fn is_pass(self) -> bool {
        self == FilterResult::Pass
    }
}

// ---------------------------------------------------------------------------
// Atoms
// ---------------------------------------------------------------------------

/// Type-membership tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTest {
    Any,
    Null,
    Missing,
    /// Exactly this runtime kind.
    InstanceOf(ValueKind),
    /// A scalar or vector of this element kind.
    Element(ElementKind),
    /// A scalar, or a length-one vector, of this element kind.
    Scalar(ElementKind),
    /// Integer, double or logical elements.
    Numeric,
    /// A logical scalar, a length-one logical vector, or a host boolean.
    AtomicLogical,
    AnyVector,
    Function,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
        }
    }

    pub fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareOp::Gt => lhs > rhs,
            CompareOp::Gte => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Lte => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Neq => lhs != rhs,
        }
    }
}

/// A named, user-supplied predicate.
#[derive(Clone)]
pub struct NamedPredicate {
    pub name: String,
    test: Arc<dyn Fn(&Value) -> FilterResult + Send + Sync>,
}

impl NamedPredicate {
    pub fn new(
        name: impl Into<String>,
        test: impl Fn(&Value) -> FilterResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            test: Arc::new(test),
        }
    }

    pub fn test(&self, value: &Value) -> FilterResult {
        (self.test)(value)
    }
}

impl fmt::Debug for NamedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedPredicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Atom {
    Type(TypeTest),
    /// Numeric comparison of a single numeric element against `bound`.
    Compare { op: CompareOp, bound: f64 },
    /// Character-count comparison of a single string.
    StringLength { op: CompareOp, bound: usize },
    Na,
    Fractional,
    EqualTo(Value),
    SingleElement,
    NotEmpty,
    Size(usize),
    /// The element at `index` equals `value`.
    ElementAt { index: usize, value: Value },
    /// `dims[axis] > bound`.
    DimGt { axis: usize, bound: usize },
    SquareMatrix,
    Predicate(NamedPredicate),
}

/// Equality that treats NA markers of the same kind as equal.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Double(x), Value::Double(y)) => {
            (is_double_na(*x) && is_double_na(*y)) || x == y
        }
        _ => a == b,
    }
}

fn single_element(value: &Value) -> Option<Value> {
    match value.length() {
        Some(1) => value.first(),
        _ => None,
    }
}

impl Atom {
    pub fn evaluate(&self, value: &Value) -> FilterResult {
        if let Atom::Type(test) = self {
            return FilterResult::from_bool(test.matches(value));
        }
        if let Atom::EqualTo(expected) = self {
            return FilterResult::from_bool(values_equal(value, expected));
        }
        if let Atom::Predicate(p) = self {
            return p.test(value);
        }
        if value.is_sentinel() {
            return FilterResult::Undefined;
        }
        let pass = match self {
            Atom::Compare { op, bound } => single_element(value)
                .and_then(|e| match e {
                    Value::Logical(_) | Value::Integer(_) | Value::Double(_) => e.as_f64(),
                    _ => None,
                })
                .is_some_and(|x| op.apply(x, *bound)),
            Atom::StringLength { op, bound } => single_element(value)
                .and_then(|e| e.as_str().map(|s| s.chars().count()))
                .is_some_and(|n| op.apply(n, *bound)),
            Atom::Na => value.is_na(),
            Atom::Fractional => match single_element(value) {
                Some(Value::Double(d)) => !is_double_na(d) && d.is_finite() && d.fract() != 0.0,
                _ => false,
            },
            Atom::SingleElement => value.length() == Some(1),
            Atom::NotEmpty => value.length().is_some_and(|n| n > 0),
            Atom::Size(n) => value.length() == Some(*n),
            Atom::ElementAt { index, value: expected } => value
                .element(*index)
                .is_some_and(|e| values_equal(&e, expected)),
            Atom::DimGt { axis, bound } => value
                .dims()
                .and_then(|d| d.get(*axis))
                .is_some_and(|d| d > bound),
            Atom::SquareMatrix => matches!(value.dims(), Some([rows, cols]) if rows == cols),
            Atom::Type(_) | Atom::EqualTo(_) | Atom::Predicate(_) => false,
        };
        FilterResult::from_bool(pass)
    }
}

impl TypeTest {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            TypeTest::Any => true,
            TypeTest::Null => value.is_null(),
            TypeTest::Missing => value.is_missing(),
            TypeTest::InstanceOf(kind) => value.kind() == kind,
            TypeTest::Element(kind) => value.element_kind() == Some(kind),
            TypeTest::Scalar(kind) => {
                value.element_kind() == Some(kind) && value.length() == Some(1)
            }
            TypeTest::Numeric => value.element_kind().is_some_and(ElementKind::is_numeric),
            TypeTest::AtomicLogical => {
                matches!(value, Value::Boolean(_))
                    || (value.element_kind() == Some(ElementKind::Logical)
                        && value.length() == Some(1))
            }
            TypeTest::AnyVector => value.is_vector_like(),
            TypeTest::Function => matches!(value, Value::Function(_)),
            TypeTest::Environment => matches!(value, Value::Environment(_)),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// A composable tri-state predicate.
#[derive(Debug, Clone)]
pub enum Filter {
    Atom(Atom),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn and(self, other: Filter) -> Filter {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Filter {
        Filter::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    pub fn evaluate(&self, value: &Value) -> FilterResult {
        match self {
            Filter::Atom(atom) => atom.evaluate(value),
            Filter::And(a, b) => a.evaluate(value).and(b.evaluate(value)),
            Filter::Or(a, b) => a.evaluate(value).or(b.evaluate(value)),
            Filter::Not(a) => a.evaluate(value).not(),
        }
    }

    /// Leaf atoms in left-to-right order.
    pub fn atoms(&self) -> Vec<&Atom> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a Atom>) {
        match self {
            Filter::Atom(atom) => out.push(atom),
            Filter::And(a, b) | Filter::Or(a, b) => {
                a.collect_atoms(out);
                b.collect_atoms(out);
            }
            Filter::Not(a) => a.collect_atoms(out),
        }
    }
}

impl From<Atom> for Filter {
    fn from(atom: Atom) -> Self {
        Filter::Atom(atom)
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn kind_fn_name(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Logical => "logical",
        ElementKind::Integer => "integer",
        ElementKind::Double => "double",
        ElementKind::Character => "string",
        ElementKind::Complex => "complex",
        ElementKind::Raw => "raw",
        ElementKind::List => "list",
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Type(TypeTest::Any) => f.write_str("any_value()"),
            Atom::Type(TypeTest::Null) => f.write_str("null_value()"),
            Atom::Type(TypeTest::Missing) => f.write_str("missing_value()"),
            Atom::Type(TypeTest::InstanceOf(kind)) => write!(f, "instance_of({kind})"),
            Atom::Type(TypeTest::Element(kind)) => write!(f, "{}_value()", kind_fn_name(*kind)),
            Atom::Type(TypeTest::Scalar(kind)) => {
                write!(f, "scalar_{}_value()", kind_fn_name(*kind))
            }
            Atom::Type(TypeTest::Numeric) => f.write_str("numeric_value()"),
            Atom::Type(TypeTest::AtomicLogical) => f.write_str("atomic_logical_value()"),
            Atom::Type(TypeTest::AnyVector) => f.write_str("abstract_vector_value()"),
            Atom::Type(TypeTest::Function) => f.write_str("function_value()"),
            Atom::Type(TypeTest::Environment) => f.write_str("environment_value()"),
            Atom::Compare { op, bound } => write!(f, "x {} {bound}", op.symbol()),
            Atom::StringLength { op, bound } => write!(f, "nchar(x) {} {bound}", op.symbol()),
            Atom::Na => f.write_str("na_value()"),
            Atom::Fractional => f.write_str("is_fractional()"),
            Atom::EqualTo(v) => write!(f, "equal_to({v})"),
            Atom::SingleElement => f.write_str("single_element()"),
            Atom::NotEmpty => f.write_str("not_empty()"),
            Atom::Size(n) => write!(f, "size({n})"),
            Atom::ElementAt { index, value } => write!(f, "element_at({index}, {value})"),
            Atom::DimGt { axis, bound } => write!(f, "dim_gt({axis}, {bound})"),
            Atom::SquareMatrix => f.write_str("square_matrix()"),
            Atom::Predicate(p) => write!(f, "{}()", p.name),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Atom(atom) => write!(f, "{atom}"),
            Filter::And(a, b) => write!(f, "({a} & {b})"),
            Filter::Or(a, b) => write!(f, "({a} | {b})"),
            Filter::Not(a) => write!(f, "!{a}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
