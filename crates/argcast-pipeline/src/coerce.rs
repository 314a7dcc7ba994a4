//! Coercion collaborator.
//!
//! The engine only knows about a small closed set of [`CoercionTarget`]s; the
//! actual conversion is delegated to a [`Coercer`]. [`DefaultCoercer`] covers
//! the element conversions of the value model with the host's NA rules.

use std::fmt;

use argcast_types::{
    is_double_na, Complex, ElementKind, Logical, Result, Value, Vector, VectorData, INT_NA,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoercionTarget {
    Integer,
    Double,
    Logical,
    Character,
    Complex,
    Raw,
    AnyVector,
    Attributable,
}

impl CoercionTarget {
    /// Element kind produced by a typed target.
    pub fn element_kind(self) -> Option<ElementKind> {
        match self {
            CoercionTarget::Integer => Some(ElementKind::Integer),
            CoercionTarget::Double => Some(ElementKind::Double),
            CoercionTarget::Logical => Some(ElementKind::Logical),
            CoercionTarget::Character => Some(ElementKind::Character),
            CoercionTarget::Complex => Some(ElementKind::Complex),
            CoercionTarget::Raw => Some(ElementKind::Raw),
            CoercionTarget::AnyVector | CoercionTarget::Attributable => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CoercionTarget::Integer => "as_integer_vector",
            CoercionTarget::Double => "as_double_vector",
            CoercionTarget::Logical => "as_logical_vector",
            CoercionTarget::Character => "as_string_vector",
            CoercionTarget::Complex => "as_complex_vector",
            CoercionTarget::Raw => "as_raw_vector",
            CoercionTarget::AnyVector => "as_vector",
            CoercionTarget::Attributable => "as_attributable",
        }
    }
}

/// Which attributes survive a coercion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preserve {
    pub names: bool,
    pub dims: bool,
    pub attrs: bool,
}

impl Preserve {
    pub const NONE: Preserve = Preserve {
        names: false,
        dims: false,
        attrs: false,
    };
    pub const ALL: Preserve = Preserve {
        names: true,
        dims: true,
        attrs: true,
    };

    pub fn apply(self, mut vector: Vector) -> Vector {
        if !self.names {
            vector.names = None;
        }
        if !self.dims {
            vector.dims = None;
        }
        if !self.attrs {
            vector.attributes.clear();
        }
        vector
    }
}

/// Parameters of a coercion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionStep {
    pub target: CoercionTarget,
    pub preserve: Preserve,
    /// Forward values that have no vector form (sentinels, functions,
    /// environments) unchanged instead of producing an empty vector.
    pub preserve_non_vector: bool,
}

impl CoercionStep {
    pub fn new(target: CoercionTarget) -> Self {
        Self {
            target,
            preserve: Preserve::NONE,
            preserve_non_vector: true,
        }
    }

    pub fn preserving(mut self, preserve: Preserve) -> Self {
        self.preserve = preserve;
        self
    }

    pub fn preserve_non_vector(mut self, preserve: bool) -> Self {
        self.preserve_non_vector = preserve;
        self
    }
}

impl fmt::Display for CoercionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.target.name())?;
        let mut flags = Vec::new();
        if self.preserve.names {
            flags.push("names");
        }
        if self.preserve.dims {
            flags.push("dims");
        }
        if self.preserve.attrs {
            flags.push("attrs");
        }
        if !self.preserve_non_vector {
            flags.push("coerce_non_vector");
        }
        write!(f, "{})", flags.join(", "))
    }
}

/// Result of a coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedValue {
    pub value: Value,
    /// At least one non-NA input element became NA.
    pub introduced_na: bool,
}

impl CoercedValue {
    pub fn clean(value: Value) -> Self {
        Self {
            value,
            introduced_na: false,
        }
    }
}

/// Converts values to coercion targets.
pub trait Coercer: Send + Sync {
    fn coerce(&self, value: Value, step: &CoercionStep) -> Result<CoercedValue>;
}

// ---------------------------------------------------------------------------
// DefaultCoercer
// ---------------------------------------------------------------------------

/// Element-wise conversion following the host's coercion rules. Scalars stay
/// scalars for typed targets, vectors stay vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCoercer;

impl Coercer for DefaultCoercer {
    fn coerce(&self, value: Value, step: &CoercionStep) -> Result<CoercedValue> {
        let value = match value {
            Value::Boolean(b) => Value::logical(b),
            other => other,
        };

        if !value.is_vector_like() {
            return Ok(CoercedValue::clean(if step.preserve_non_vector {
                value
            } else {
                let kind = step.target.element_kind().unwrap_or(ElementKind::List);
                Value::empty_vector(kind)
            }));
        }

        let Some(kind) = step.target.element_kind() else {
            // `AnyVector` and `Attributable` only change shape.
            return Ok(CoercedValue::clean(match value.into_vector() {
                Some(vector) => Value::Vector(step.preserve.apply(vector)),
                None => Value::empty_vector(ElementKind::List),
            }));
        };

        match value {
            Value::Vector(vector) => {
                if vector.kind() == kind {
                    return Ok(CoercedValue::clean(Value::Vector(vector)));
                }
                let mut introduced_na = false;
                let elements: Vec<Value> = (0..vector.len())
                    .filter_map(|i| vector.data.element(i))
                    .map(|e| convert_element(&e, kind, &mut introduced_na))
                    .collect();
                let converted = Vector {
                    data: collect_vector(kind, elements),
                    names: vector.names,
                    dims: vector.dims,
                    attributes: vector.attributes,
                };
                Ok(CoercedValue {
                    value: Value::Vector(step.preserve.apply(converted)),
                    introduced_na,
                })
            }
            scalar => {
                let mut introduced_na = false;
                let value = convert_element(&scalar, kind, &mut introduced_na);
                Ok(CoercedValue {
                    value,
                    introduced_na,
                })
            }
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    match t {
        "Inf" | "inf" => Some(f64::INFINITY),
        "-Inf" | "-inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => t.parse::<f64>().ok().filter(|x| x.is_finite()),
    }
}

fn numeric_of(element: &Value, introduced_na: &mut bool) -> Option<f64> {
    match element {
        Value::Logical(l) => l.to_bool().map(|b| if b { 1.0 } else { 0.0 }),
        Value::Integer(i) if *i == INT_NA => None,
        Value::Integer(i) => Some(f64::from(*i)),
        Value::Double(d) if is_double_na(*d) => None,
        Value::Double(d) => Some(*d),
        Value::Complex(c) if c.is_na() => None,
        Value::Complex(c) => Some(c.re),
        Value::Raw(r) => Some(f64::from(*r)),
        Value::String(None) => None,
        Value::String(Some(s)) => {
            let parsed = parse_number(s);
            if parsed.is_none() {
                *introduced_na = true;
            }
            parsed
        }
        Value::Vector(v) if v.len() == 1 => v
            .data
            .element(0)
            .and_then(|e| numeric_of(&e, introduced_na)),
        _ => {
            *introduced_na = true;
            None
        }
    }
}

fn to_integer(element: &Value, introduced_na: &mut bool) -> i32 {
    match numeric_of(element, introduced_na) {
        Some(x) if x.is_nan() => INT_NA,
        Some(x) if x >= f64::from(i32::MIN) + 1.0 && x <= f64::from(i32::MAX) => x.trunc() as i32,
        Some(_) => {
            *introduced_na = true;
            INT_NA
        }
        None => INT_NA,
    }
}

fn to_logical(element: &Value) -> Logical {
    match element {
        Value::String(Some(s)) => match s.as_str() {
            "TRUE" | "true" | "True" | "T" => Logical::True,
            "FALSE" | "false" | "False" | "F" => Logical::False,
            _ => Logical::Na,
        },
        Value::Logical(l) => *l,
        other => {
            let mut ignored = false;
            match numeric_of(other, &mut ignored) {
                Some(x) if x.is_nan() => Logical::Na,
                Some(x) => Logical::from_bool(x != 0.0),
                None => Logical::Na,
            }
        }
    }
}

fn to_character(element: &Value) -> Option<String> {
    match element {
        Value::String(s) => s.clone(),
        e if e.is_na() => None,
        e => Some(e.to_string()),
    }
}

fn convert_element(element: &Value, kind: ElementKind, introduced_na: &mut bool) -> Value {
    match kind {
        ElementKind::Integer => Value::Integer(to_integer(element, introduced_na)),
        ElementKind::Double => match numeric_of(element, introduced_na) {
            Some(x) => Value::Double(x),
            None => Value::double_na(),
        },
        ElementKind::Logical => Value::Logical(to_logical(element)),
        ElementKind::Character => Value::String(to_character(element)),
        ElementKind::Complex => match element {
            Value::Complex(c) => Value::Complex(*c),
            other => match numeric_of(other, introduced_na) {
                Some(x) => Value::complex(x, 0.0),
                None => Value::Complex(Complex::na()),
            },
        },
        ElementKind::Raw => {
            let mut ignored = false;
            match numeric_of(element, &mut ignored) {
                Some(x) if (0.0..256.0).contains(&x) => Value::Raw(x as u8),
                _ => Value::Raw(0),
            }
        }
        ElementKind::List => element.clone(),
    }
}

fn collect_vector(kind: ElementKind, elements: Vec<Value>) -> VectorData {
    let mut data = VectorData::empty(kind);
    for e in elements {
        match (&mut data, e) {
            (VectorData::Logical(v), Value::Logical(x)) => v.push(x),
            (VectorData::Integer(v), Value::Integer(x)) => v.push(x),
            (VectorData::Double(v), Value::Double(x)) => v.push(x),
            (VectorData::Character(v), Value::String(x)) => v.push(x),
            (VectorData::Complex(v), Value::Complex(x)) => v.push(x),
            (VectorData::Raw(v), Value::Raw(x)) => v.push(x),
            (VectorData::List(v), x) => v.push(x),
            _ => {}
        }
    }
    data
}
