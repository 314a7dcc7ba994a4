//! Sample generation for tests.
//!
//! Every atom contributes a few literal candidates around its decision
//! boundary. Candidates are pooled over the filter tree and then split by
//! evaluating the filter itself, so combinators are honoured exactly:
//! `Pass` goes to the positive set, `Fail` to the negative set, and
//! `Undefined` is dropped.

use argcast_types::{ElementKind, Logical, Value, ValueKind, Vector, VectorData};
use serde::Serialize;

use crate::builder::Pipeline;
use crate::engine::CastEngine;
use crate::filter::{values_equal, Atom, CompareOp, Filter, FilterResult, TypeTest};
use crate::step::{Step, StepChain};

/// Values a filter (or pipeline) accepts and rejects.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Samples {
    pub positive: Vec<Value>,
    pub negative: Vec<Value>,
}

impl Samples {
    pub fn for_filter(filter: &Filter) -> Samples {
        let mut candidates = Vec::new();
        collect_filter(filter, &mut candidates);

        let mut samples = Samples::default();
        for value in candidates {
            match filter.evaluate(&value) {
                FilterResult::Pass => samples.positive.push(value),
                FilterResult::Fail => samples.negative.push(value),
                FilterResult::Undefined => {}
            }
        }
        samples
    }

    /// Candidates from every filter of the pipeline (conditions and branches
    /// included), split by whether a cast succeeds. A pipeline without filters
    /// has no samples.
    pub fn for_pipeline(pipeline: &Pipeline, engine: &CastEngine) -> Samples {
        let mut candidates = Vec::new();
        collect_chain(pipeline.steps(), &mut candidates);

        let mut samples = Samples::default();
        for value in candidates {
            match engine.cast(pipeline, value.clone()) {
                Ok(_) => samples.positive.push(value),
                Err(_) => samples.negative.push(value),
            }
        }
        tracing::debug!(
            argument = %pipeline.argument(),
            positive = samples.positive.len(),
            negative = samples.negative.len(),
            "Samples generated"
        );
        samples
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

fn push_unique(out: &mut Vec<Value>, value: Value) {
    if !out.iter().any(|v| values_equal(v, &value)) {
        out.push(value);
    }
}

fn collect_chain(chain: &StepChain, out: &mut Vec<Value>) {
    for step in chain {
        match step {
            Step::Filter { filter, .. } => collect_filter(filter, out),
            Step::MapIf {
                filter,
                true_branch,
                false_branch,
                ..
            } => {
                collect_filter(filter, out);
                collect_chain(true_branch, out);
                if let Some(false_branch) = false_branch {
                    collect_chain(false_branch, out);
                }
            }
            _ => {}
        }
    }
}

fn collect_filter(filter: &Filter, out: &mut Vec<Value>) {
    push_unique(out, Value::Null);
    push_unique(out, Value::Missing);
    for atom in filter.atoms() {
        for value in atom_candidates(atom) {
            push_unique(out, value);
        }
    }
}

fn scalar_of(kind: ElementKind) -> Value {
    match kind {
        ElementKind::Logical => Value::logical(true),
        ElementKind::Integer => Value::Integer(1),
        ElementKind::Double => Value::Double(1.5),
        ElementKind::Character => Value::string("a"),
        ElementKind::Complex => Value::complex(1.0, 1.0),
        ElementKind::Raw => Value::Raw(1),
        ElementKind::List => Value::list(vec![Value::Integer(1)]),
    }
}

fn pair_of(kind: ElementKind) -> Value {
    match kind {
        ElementKind::Logical => Value::logical_vec([Logical::True, Logical::False]),
        ElementKind::Integer => Value::int_vec([1, 2]),
        ElementKind::Double => Value::double_vec([1.5, 2.5]),
        ElementKind::Character => Value::string_vec(["a", "b"]),
        ElementKind::Complex => Value::complex_vec([
            argcast_types::Complex::new(1.0, 0.0),
            argcast_types::Complex::new(0.0, 1.0),
        ]),
        ElementKind::Raw => Value::raw_vec(vec![1u8, 2u8]),
        ElementKind::List => Value::list(vec![Value::Integer(1), Value::string("a")]),
    }
}

fn other_than(kind: ElementKind) -> Value {
    if kind == ElementKind::Character {
        Value::Integer(1)
    } else {
        Value::string("a")
    }
}

fn matrix(dims: Vec<usize>) -> Value {
    let len: usize = dims.iter().product();
    Value::Vector(Vector::new(VectorData::Integer(vec![0; len])).with_dims(dims))
}

fn atom_candidates(atom: &Atom) -> Vec<Value> {
    match atom {
        Atom::Type(test) => type_candidates(*test),
        Atom::Compare { op, bound } => {
            let mut out = vec![
                Value::Double(*bound),
                Value::Double(bound + 1.0),
                Value::Double(bound - 1.0),
            ];
            if *op == CompareOp::Eq || *op == CompareOp::Neq {
                out.push(Value::Double(bound + 0.5));
            }
            if bound.fract() == 0.0 && bound.abs() < f64::from(i32::MAX) {
                out.push(Value::Integer(*bound as i32));
            }
            out
        }
        Atom::StringLength { bound, .. } => {
            let mut out = vec![
                Value::string("x".repeat(*bound)),
                Value::string("x".repeat(bound + 1)),
            ];
            if *bound > 0 {
                out.push(Value::string("x".repeat(bound - 1)));
            }
            out
        }
        Atom::Na => vec![
            Value::int_na(),
            Value::double_na(),
            Value::string_na(),
            Value::logical_na(),
            Value::Integer(1),
            Value::string("a"),
            Value::int_vec([1, argcast_types::INT_NA]),
        ],
        Atom::Fractional => vec![Value::Double(1.5), Value::Double(2.0)],
        Atom::EqualTo(v) => {
            let other = if values_equal(v, &Value::Integer(0)) {
                Value::Integer(1)
            } else {
                Value::Integer(0)
            };
            vec![v.clone(), other]
        }
        Atom::SingleElement => vec![
            Value::Integer(1),
            Value::int_vec([1, 2]),
            Value::empty_vector(ElementKind::Integer),
        ],
        Atom::NotEmpty => vec![
            Value::empty_vector(ElementKind::Integer),
            Value::int_vec([1]),
        ],
        Atom::Size(n) => vec![Value::int_vec(vec![0; *n]), Value::int_vec(vec![0; n + 1])],
        Atom::ElementAt { index, value } => vec![
            Value::list(vec![value.clone(); index + 1]),
            Value::list(vec![Value::Null; index + 1]),
        ],
        Atom::DimGt { axis, bound } => {
            let mut above = vec![1; axis + 1];
            above[*axis] = bound + 1;
            let mut at = vec![1; axis + 1];
            at[*axis] = *bound;
            vec![matrix(above), matrix(at), Value::Integer(1)]
        }
        Atom::SquareMatrix => vec![matrix(vec![2, 2]), matrix(vec![2, 3])],
        Atom::Predicate(_) => vec![
            Value::Integer(1),
            Value::Double(1.5),
            Value::string("a"),
            Value::logical(true),
            Value::empty_vector(ElementKind::Integer),
        ],
    }
}

fn type_candidates(test: TypeTest) -> Vec<Value> {
    match test {
        TypeTest::Any | TypeTest::Null | TypeTest::Missing => vec![Value::Integer(1)],
        TypeTest::InstanceOf(kind) => {
            let mut out = vec![Value::string("a"), Value::Integer(1)];
            match kind {
                ValueKind::Scalar(k) => out.push(scalar_of(k)),
                ValueKind::Vector(k) => out.push(pair_of(k)),
                ValueKind::Boolean => out.push(Value::Boolean(true)),
                ValueKind::Function => out.push(Value::Function("f".into())),
                ValueKind::Environment => out.push(Value::Environment("e".into())),
                ValueKind::Null | ValueKind::Missing => {}
            }
            out
        }
        TypeTest::Element(kind) => vec![scalar_of(kind), pair_of(kind), other_than(kind)],
        TypeTest::Scalar(kind) => vec![scalar_of(kind), pair_of(kind), other_than(kind)],
        TypeTest::Numeric => vec![
            Value::Integer(1),
            Value::Double(1.5),
            Value::logical(true),
            Value::string("a"),
        ],
        TypeTest::AtomicLogical => vec![
            Value::logical(true),
            Value::Boolean(true),
            pair_of(ElementKind::Logical),
            Value::Integer(1),
        ],
        TypeTest::AnyVector => vec![Value::int_vec([1, 2]), Value::Function("f".into())],
        TypeTest::Function => vec![Value::Function("f".into()), Value::Integer(1)],
        TypeTest::Environment => vec![Value::Environment("e".into()), Value::Integer(1)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::pipeline;
    use crate::predef::*;

    fn assert_consistent(filter: &Filter, samples: &Samples) {
        for v in &samples.positive {
            assert_eq!(filter.evaluate(v), FilterResult::Pass, "{v:?}");
        }
        for v in &samples.negative {
            assert_eq!(filter.evaluate(v), FilterResult::Fail, "{v:?}");
        }
    }

    #[test]
    fn type_filter_samples() {
        let f = string_value();
        let s = Samples::for_filter(&f);
        assert_consistent(&f, &s);
        assert!(s.positive.contains(&Value::string("a")));
        assert!(s.negative.contains(&Value::Null));
        assert!(s.negative.contains(&Value::Integer(1)));
    }

    #[test]
    fn negation_swaps_sets() {
        let f = string_value();
        let s = Samples::for_filter(&f);
        let n = Samples::for_filter(&f.clone().not());
        assert_eq!(s.positive, n.negative);
        assert_eq!(s.negative, n.positive);
    }

    #[test]
    fn value_atoms_drop_sentinels() {
        let f = gt0();
        let s = Samples::for_filter(&f);
        assert_consistent(&f, &s);
        assert!(!s.positive.contains(&Value::Null));
        assert!(!s.negative.contains(&Value::Null));
        assert!(s.positive.contains(&Value::Double(1.0)));
        assert!(s.negative.contains(&Value::Double(0.0)));
    }

    #[test]
    fn combined_filters_stay_consistent() {
        let filters = [
            null_value().or(numeric_value()).or(string_value()),
            numeric_value().and(gte1()),
            single_element().and(not_na_value()),
            square_matrix().or(dim_gt(0, 3)),
            element_at(0, Value::int_na()).not(),
            length_lte(2).and(scalar_string_value()),
            size(2).or(equal_to(Value::Null)),
        ];
        for f in &filters {
            let s = Samples::for_filter(f);
            assert_consistent(f, &s);
            assert!(!s.positive.is_empty(), "{f}");
            assert!(!s.negative.is_empty(), "{f}");
        }
    }

    #[test]
    fn pipeline_samples_partition_by_cast() {
        let engine = CastEngine::with_default_coercer();
        let p = pipeline("x")
            .must_be(numeric_value())
            .as_integer_vector()
            .find_first()
            .build();
        let s = Samples::for_pipeline(&p, &engine);
        for v in &s.positive {
            assert!(engine.cast(&p, v.clone()).is_ok());
        }
        for v in &s.negative {
            assert!(engine.cast(&p, v.clone()).is_err());
        }
        assert!(s.negative.contains(&Value::string("a")));
        assert!(s.positive.contains(&Value::Integer(1)));
    }

    #[test]
    fn pipeline_without_filters_has_no_samples() {
        let p = pipeline("x").as_integer_vector().find_first_or(0).build();
        let s = Samples::for_pipeline(&p, &CastEngine::default());
        assert!(s.is_empty());
    }
}
