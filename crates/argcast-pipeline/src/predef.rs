//! Predefined filters and mappers.
//!
//! Pipelines are usually written with these functions in scope:
//!
//! ```
//! use argcast_pipeline::predef::*;
//! use argcast_pipeline::pipeline;
//!
//! let p = pipeline("n")
//!     .must_be(numeric_value())
//!     .as_integer_vector()
//!     .find_first()
//!     .must_be(gte0())
//!     .build();
//! assert_eq!(p.argument(), "n");
//! ```

use argcast_types::{ElementKind, Value, ValueKind};

use crate::filter::{Atom, CompareOp, Filter, FilterResult, NamedPredicate, TypeTest};
use crate::mapper::Mapper;

fn type_test(test: TypeTest) -> Filter {
    Filter::Atom(Atom::Type(test))
}

fn compare(op: CompareOp, bound: f64) -> Filter {
    Filter::Atom(Atom::Compare { op, bound })
}

fn string_length_cmp(op: CompareOp, bound: usize) -> Filter {
    Filter::Atom(Atom::StringLength { op, bound })
}

// ---------------------------------------------------------------------------
// Type filters
// ---------------------------------------------------------------------------

/// Passes every value, sentinels included.
pub fn any_value() -> Filter {
    type_test(TypeTest::Any)
}

pub fn null_value() -> Filter {
    type_test(TypeTest::Null)
}

pub fn missing_value() -> Filter {
    type_test(TypeTest::Missing)
}

pub fn instance_of(kind: ValueKind) -> Filter {
    type_test(TypeTest::InstanceOf(kind))
}

pub fn integer_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::Integer))
}

pub fn double_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::Double))
}

pub fn logical_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::Logical))
}

pub fn string_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::Character))
}

pub fn complex_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::Complex))
}

pub fn raw_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::Raw))
}

pub fn list_value() -> Filter {
    type_test(TypeTest::Element(ElementKind::List))
}

/// Integer, double or logical values.
pub fn numeric_value() -> Filter {
    type_test(TypeTest::Numeric)
}

pub fn abstract_vector_value() -> Filter {
    type_test(TypeTest::AnyVector)
}

pub fn function_value() -> Filter {
    type_test(TypeTest::Function)
}

pub fn environment_value() -> Filter {
    type_test(TypeTest::Environment)
}

pub fn scalar_integer_value() -> Filter {
    type_test(TypeTest::Scalar(ElementKind::Integer))
}

pub fn scalar_double_value() -> Filter {
    type_test(TypeTest::Scalar(ElementKind::Double))
}

pub fn scalar_logical_value() -> Filter {
    type_test(TypeTest::Scalar(ElementKind::Logical))
}

pub fn scalar_string_value() -> Filter {
    type_test(TypeTest::Scalar(ElementKind::Character))
}

pub fn scalar_complex_value() -> Filter {
    type_test(TypeTest::Scalar(ElementKind::Complex))
}

pub fn atomic_logical_value() -> Filter {
    type_test(TypeTest::AtomicLogical)
}

// ---------------------------------------------------------------------------
// Value filters
// ---------------------------------------------------------------------------

pub fn gt(bound: f64) -> Filter {
    compare(CompareOp::Gt, bound)
}

pub fn gte(bound: f64) -> Filter {
    compare(CompareOp::Gte, bound)
}

pub fn lt(bound: f64) -> Filter {
    compare(CompareOp::Lt, bound)
}

pub fn lte(bound: f64) -> Filter {
    compare(CompareOp::Lte, bound)
}

pub fn eq(bound: f64) -> Filter {
    compare(CompareOp::Eq, bound)
}

pub fn neq(bound: f64) -> Filter {
    compare(CompareOp::Neq, bound)
}

pub fn gt0() -> Filter {
    gt(0.0)
}

pub fn gte0() -> Filter {
    gte(0.0)
}

pub fn gt1() -> Filter {
    gt(1.0)
}

pub fn gte1() -> Filter {
    gte(1.0)
}

pub fn string_length(n: usize) -> Filter {
    string_length_cmp(CompareOp::Eq, n)
}

pub fn empty_string() -> Filter {
    string_length(0)
}

pub fn length_gt(n: usize) -> Filter {
    string_length_cmp(CompareOp::Gt, n)
}

pub fn length_gte(n: usize) -> Filter {
    string_length_cmp(CompareOp::Gte, n)
}

pub fn length_lt(n: usize) -> Filter {
    string_length_cmp(CompareOp::Lt, n)
}

pub fn length_lte(n: usize) -> Filter {
    string_length_cmp(CompareOp::Lte, n)
}

pub fn na_value() -> Filter {
    Filter::Atom(Atom::Na)
}

pub fn not_na_value() -> Filter {
    na_value().not()
}

pub fn is_fractional() -> Filter {
    Filter::Atom(Atom::Fractional)
}

pub fn equal_to(value: impl Into<Value>) -> Filter {
    Filter::Atom(Atom::EqualTo(value.into()))
}

// ---------------------------------------------------------------------------
// Structural filters
// ---------------------------------------------------------------------------

pub fn single_element() -> Filter {
    Filter::Atom(Atom::SingleElement)
}

pub fn not_empty() -> Filter {
    Filter::Atom(Atom::NotEmpty)
}

pub fn size(n: usize) -> Filter {
    Filter::Atom(Atom::Size(n))
}

pub fn element_at(index: usize, value: impl Into<Value>) -> Filter {
    Filter::Atom(Atom::ElementAt {
        index,
        value: value.into(),
    })
}

pub fn dim_gt(axis: usize, bound: usize) -> Filter {
    Filter::Atom(Atom::DimGt { axis, bound })
}

pub fn square_matrix() -> Filter {
    Filter::Atom(Atom::SquareMatrix)
}

/// A named custom predicate. The closure decides its own sentinel results.
pub fn predicate(
    name: impl Into<String>,
    test: impl Fn(&Value) -> FilterResult + Send + Sync + 'static,
) -> Filter {
    Filter::Atom(Atom::Predicate(NamedPredicate::new(name, test)))
}

// ---------------------------------------------------------------------------
// Mappers
// ---------------------------------------------------------------------------

pub fn constant(value: impl Into<Value>) -> Mapper {
    Mapper::Constant(value.into())
}

pub fn null_constant() -> Mapper {
    Mapper::Constant(Value::Null)
}

pub fn empty_string_vector() -> Mapper {
    Mapper::EmptyStringVector
}

pub fn to_boolean() -> Mapper {
    Mapper::ToBoolean
}

pub fn double_to_int() -> Mapper {
    Mapper::DoubleToInt
}

pub fn char_at0(default: char) -> Mapper {
    Mapper::CharAt0(default)
}
