//! Value mappers used by `map`, `map_if` and the sentinel `Replace` rule.

use std::fmt;
use std::sync::Arc;

use argcast_types::{ElementKind, Logical, Value, Vector, INT_NA};

/// A pure value transform.
#[derive(Clone)]
pub enum Mapper {
    Constant(Value),
    /// Logical to host boolean. NA maps to `true`.
    ToBoolean,
    /// Double to integer by truncation. NA and out-of-range values map to
    /// integer NA.
    DoubleToInt,
    /// String to the code point of its first character, `default` for "".
    CharAt0(char),
    EmptyStringVector,
    Custom {
        name: String,
        f: Arc<dyn Fn(Value) -> Value + Send + Sync>,
    },
}

impl Mapper {
    pub fn custom(
        name: impl Into<String>,
        f: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Mapper::Custom {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    pub fn apply(&self, value: Value) -> Value {
        match self {
            Mapper::Constant(v) => v.clone(),
            Mapper::ToBoolean => match value {
                Value::Logical(l) => Value::Boolean(l != Logical::False),
                other => other,
            },
            Mapper::DoubleToInt => match value {
                Value::Double(d) if d > f64::from(i32::MIN) && d < f64::from(i32::MAX) + 1.0 => {
                    Value::Integer(d.trunc() as i32)
                }
                // NA, NaN, infinities and anything outside the integer range.
                Value::Double(_) => Value::Integer(INT_NA),
                other => other,
            },
            Mapper::CharAt0(default) => match value {
                Value::String(Some(s)) => {
                    let c = s.chars().next().unwrap_or(*default);
                    Value::Integer(c as i32)
                }
                Value::String(None) => Value::Integer(INT_NA),
                other => other,
            },
            Mapper::EmptyStringVector => Value::Vector(Vector::empty(ElementKind::Character)),
            Mapper::Custom { f, .. } => f(value),
        }
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapper::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            Mapper::ToBoolean => f.write_str("ToBoolean"),
            Mapper::DoubleToInt => f.write_str("DoubleToInt"),
            Mapper::CharAt0(c) => f.debug_tuple("CharAt0").field(c).finish(),
            Mapper::EmptyStringVector => f.write_str("EmptyStringVector"),
            Mapper::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
        }
    }
}

impl fmt::Display for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mapper::Constant(v) => write!(f, "constant({v})"),
            Mapper::ToBoolean => f.write_str("to_boolean()"),
            Mapper::DoubleToInt => f.write_str("double_to_int()"),
            Mapper::CharAt0(c) => write!(f, "char_at0({c:?})"),
            Mapper::EmptyStringVector => f.write_str("empty_string_vector()"),
            Mapper::Custom { name, .. } => write!(f, "{name}()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_boolean_maps_na_to_true() {
        assert_eq!(Mapper::ToBoolean.apply(Value::logical(false)), Value::Boolean(false));
        assert_eq!(Mapper::ToBoolean.apply(Value::logical(true)), Value::Boolean(true));
        assert_eq!(Mapper::ToBoolean.apply(Value::logical_na()), Value::Boolean(true));
        assert_eq!(Mapper::ToBoolean.apply(Value::Integer(1)), Value::Integer(1));
    }

    #[test]
    fn double_to_int_truncates() {
        assert_eq!(Mapper::DoubleToInt.apply(Value::Double(3.7)), Value::Integer(3));
        assert_eq!(Mapper::DoubleToInt.apply(Value::Double(-3.7)), Value::Integer(-3));
        assert_eq!(Mapper::DoubleToInt.apply(Value::double_na()), Value::int_na());
    }

    #[test]
    fn double_to_int_out_of_range_is_na() {
        let m = Mapper::DoubleToInt;
        assert_eq!(m.apply(Value::Double(1e10)), Value::int_na());
        assert_eq!(m.apply(Value::Double(-1e10)), Value::int_na());
        assert_eq!(m.apply(Value::Double(f64::INFINITY)), Value::int_na());
        assert_eq!(m.apply(Value::Double(f64::NEG_INFINITY)), Value::int_na());
        assert_eq!(m.apply(Value::Double(f64::NAN)), Value::int_na());
        assert_eq!(m.apply(Value::Double(2147483647.5)), Value::Integer(i32::MAX));
        assert_eq!(m.apply(Value::Double(-2147483647.0)), Value::Integer(-i32::MAX));
    }

    #[test]
    fn char_at0_uses_default_for_empty() {
        let m = Mapper::CharAt0('x');
        assert_eq!(m.apply(Value::string("abc")), Value::Integer('a' as i32));
        assert_eq!(m.apply(Value::string("")), Value::Integer('x' as i32));
        assert_eq!(m.apply(Value::string_na()), Value::int_na());
    }

    #[test]
    fn constant_and_custom() {
        assert_eq!(Mapper::Constant(Value::Integer(5)).apply(Value::Null), Value::Integer(5));
        let double = Mapper::custom("twice", |v| match v {
            Value::Integer(i) => Value::Integer(i * 2),
            other => other,
        });
        assert_eq!(double.apply(Value::Integer(4)), Value::Integer(8));
        assert_eq!(double.to_string(), "twice()");
        assert_eq!(
            Mapper::EmptyStringVector.apply(Value::Null),
            Value::empty_vector(ElementKind::Character)
        );
    }
}
