//! Builtin-style argument pipelines served by the CLI.

use argcast_pipeline::predef::*;
use argcast_pipeline::{pipeline, Pipeline};
use argcast_types::{Message, MessageArg};

/// A named pipeline in the catalogue.
#[derive(Clone, Copy)]
pub struct Entry {
    pub name: &'static str,
    pub summary: &'static str,
    build: fn() -> Pipeline,
}

impl Entry {
    pub fn build(&self) -> Pipeline {
        (self.build)()
    }
}

fn ignore_case() -> Pipeline {
    pipeline("ignore.case")
        .as_logical_vector()
        .find_first_or(false)
        .map(to_boolean())
        .build()
}

fn eval_promises() -> Pipeline {
    pipeline("eval.promises")
        .as_logical_vector()
        .find_first()
        .not_na()
        .map(to_boolean())
        .build()
}

fn version() -> Pipeline {
    pipeline("version")
        .allow_null()
        .as_integer_vector()
        .find_first_or_null()
        .build()
}

fn costs() -> Pipeline {
    pipeline("costs")
        .default_error(Message::InvalidArgument.with(["costs"]))
        .must_be(missing_value().or(null_value()).not())
        .as_integer_vector()
        .build()
}

fn more_args() -> Pipeline {
    pipeline("MoreArgs").allow_null().must_be(list_value()).build()
}

fn labels() -> Pipeline {
    pipeline("labels")
        .map_null(empty_string_vector())
        .must_be_with(string_value(), Message::InvalidArgument.with(["labels"]))
        .as_string_vector()
        .build()
}

fn fill() -> Pipeline {
    pipeline("fill")
        .default_error(Message::InvalidArgument.with(["fill"]))
        .must_be(numeric_value().or(logical_value()))
        .as_vector()
        .must_be(single_element())
        .find_first()
        .should_be_with(
            atomic_logical_value().or(scalar_integer_value().and(gt0())),
            Message::NonPositiveFill.with([MessageArg::ArgName]),
        )
        .map_if(atomic_logical_value(), to_boolean())
        .build()
}

fn seed() -> Pipeline {
    pipeline("seed")
        .allow_null()
        .must_be_with(numeric_value(), Message::SeedNotValidInt)
        .as_integer_vector()
        .find_first_with(Message::SeedNotValidInt)
        .not_na_with(Message::SeedNotValidInt)
        .build()
}

const ENTRIES: &[Entry] = &[
    Entry {
        name: "ignore.case",
        summary: "first logical as a boolean, FALSE when empty",
        build: ignore_case,
    },
    Entry {
        name: "eval.promises",
        summary: "first logical as a boolean, NA rejected",
        build: eval_promises,
    },
    Entry {
        name: "version",
        summary: "first integer or NULL",
        build: version,
    },
    Entry {
        name: "costs",
        summary: "integer vector, NULL and missing rejected",
        build: costs,
    },
    Entry {
        name: "MoreArgs",
        summary: "list or NULL",
        build: more_args,
    },
    Entry {
        name: "labels",
        summary: "character vector, NULL as character(0)",
        build: labels,
    },
    Entry {
        name: "fill",
        summary: "single number or logical, warns when not positive",
        build: fill,
    },
    Entry {
        name: "seed",
        summary: "first integer, NULL allowed",
        build: seed,
    },
];

pub fn entries() -> &'static [Entry] {
    ENTRIES
}

pub fn find(name: &str) -> Option<&'static Entry> {
    ENTRIES.iter().find(|e| e.name == name)
}
