//! Diagnostic message catalogue and message templates.
//!
//! A [`MessageData`] pairs a catalogue entry with its positional arguments.
//! Arguments are resolved lazily: an argument may refer to the name of the
//! argument being cast, or to the value that triggered the diagnostic.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Catalogue of diagnostic templates. Templates use `%s` for text and `%d`
/// for integers, consumed left to right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    InvalidArgument,
    LengthZero,
    LengthGt1,
    NaIntroducedCoercion,
    ArgumentMissing,
    InvalidUse,
    ArgumentEmpty,
    NonPositiveFill,
    InvalidUnnamedArguments,
    SeedNotValidInt,
    DllLoadError,
    Generic,
    Custom(String),
}

impl Message {
    pub fn template(&self) -> &str {
        match self {
            Message::InvalidArgument => "invalid '%s' argument",
            Message::LengthZero => "argument of length 0",
            Message::LengthGt1 => {
                "the condition has length > 1 and only the first element will be used"
            }
            Message::NaIntroducedCoercion => "NAs introduced by coercion",
            Message::ArgumentMissing => "argument \"%s\" is missing, with no default",
            Message::InvalidUse => "invalid use of '%s'",
            Message::ArgumentEmpty => "argument %d is empty",
            Message::NonPositiveFill => "non-positive '%s' argument will be ignored",
            Message::InvalidUnnamedArguments => "invalid arguments",
            Message::SeedNotValidInt => "supplied seed is not a valid integer",
            Message::DllLoadError => "unable to load shared object '%s'\n  %s",
            Message::Generic => "%s",
            Message::Custom(text) => text,
        }
    }

    /// Pairs this message with positional arguments.
    pub fn with<I, A>(self, args: I) -> MessageData
    where
        I: IntoIterator<Item = A>,
        A: Into<MessageArg>,
    {
        MessageData::new(self, args)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template())
    }
}

/// Formatter computing a message argument from the offending value.
#[derive(Clone)]
pub struct ArgFormatter(Arc<dyn Fn(&Value) -> String + Send + Sync>);

impl ArgFormatter {
    pub fn new(f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: &Value) -> String {
        (self.0)(value)
    }
}

impl fmt::Debug for ArgFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArgFormatter(..)")
    }
}

/// A positional message argument.
#[derive(Debug, Clone)]
pub enum MessageArg {
    Text(String),
    Int(i64),
    /// Resolves to the name of the argument being cast.
    ArgName,
    /// Resolves to the printed form of the offending value.
    Value,
    Computed(ArgFormatter),
}

impl MessageArg {
    pub fn computed(f: impl Fn(&Value) -> String + Send + Sync + 'static) -> Self {
        MessageArg::Computed(ArgFormatter::new(f))
    }

    fn resolve(&self, arg_name: &str, value: &Value) -> String {
        match self {
            MessageArg::Text(s) => s.clone(),
            MessageArg::Int(i) => i.to_string(),
            MessageArg::ArgName => arg_name.to_string(),
            MessageArg::Value => value.to_string(),
            MessageArg::Computed(f) => f.apply(value),
        }
    }
}

impl From<&str> for MessageArg {
    fn from(s: &str) -> Self {
        MessageArg::Text(s.to_string())
    }
}

impl From<String> for MessageArg {
    fn from(s: String) -> Self {
        MessageArg::Text(s)
    }
}

impl From<i64> for MessageArg {
    fn from(i: i64) -> Self {
        MessageArg::Int(i)
    }
}

impl From<i32> for MessageArg {
    fn from(i: i32) -> Self {
        MessageArg::Int(i64::from(i))
    }
}

/// A message with its arguments, or the unset marker.
#[derive(Debug, Clone, Default)]
pub struct MessageData {
    message: Option<Message>,
    args: Vec<MessageArg>,
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%[sd%]").expect("placeholder pattern is valid"))
}

impl MessageData {
    pub fn new<I, A>(message: Message, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<MessageArg>,
    {
        Self {
            message: Some(message),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A message without arguments.
    pub fn of(message: Message) -> Self {
        Self {
            message: Some(message),
            args: Vec::new(),
        }
    }

    /// The "no message supplied" marker.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.message.is_none()
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn args(&self) -> &[MessageArg] {
        &self.args
    }

    /// This message when set, otherwise `fallback`.
    pub fn or(&self, fallback: &MessageData) -> MessageData {
        if self.is_unset() {
            fallback.clone()
        } else {
            self.clone()
        }
    }

    /// Renders the template. Placeholders without a matching argument render
    /// as empty text; `%%` renders a literal percent sign.
    pub fn format(&self, arg_name: &str, value: &Value) -> String {
        let Some(message) = &self.message else {
            return String::new();
        };
        let mut args = self.args.iter();
        placeholder()
            .replace_all(message.template(), |caps: &regex::Captures<'_>| {
                if &caps[0] == "%%" {
                    "%".to_string()
                } else {
                    args.next()
                        .map(|a| a.resolve(arg_name, value))
                        .unwrap_or_default()
                }
            })
            .into_owned()
    }
}

impl From<Message> for MessageData {
    fn from(message: Message) -> Self {
        MessageData::of(message)
    }
}
