//! Key/value arguments and the structured fields they flatten into.
//!
//! Log calls take a flat list of alternating keys and values:
//!
//! ```rust
//! use svclog::{args, flatten, Field};
//!
//! let fields = flatten(&args!["user", "alice", "attempt", 3]);
//! assert_eq!(
//!     fields,
//!     vec![Field::new("user", "alice"), Field::new("attempt", "3")]
//! );
//! ```
//!
//! Every argument is coerced to text: strings pass through untouched, errors
//! contribute their message, and anything else its `Display` output. A
//! trailing key without a value is dropped.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

/// One element of a key/value argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg<'a> {
    /// A string, used verbatim.
    Str(Cow<'a, str>),
    /// The message of an error value.
    Error(String),
    /// The `Display` rendering of any other value.
    Display(String),
}

impl<'a> Arg<'a> {
    /// Build an argument from an error, keeping only its message.
    pub fn error<E>(err: &E) -> Arg<'static>
    where
        E: std::error::Error + ?Sized,
    {
        Arg::Error(err.to_string())
    }

    /// Build an argument from any displayable value.
    pub fn display<T>(value: &T) -> Arg<'static>
    where
        T: fmt::Display + ?Sized,
    {
        Arg::Display(value.to_string())
    }

    /// The text this argument contributes to a field.
    pub fn as_text(&self) -> &str {
        match self {
            Arg::Str(s) => s,
            Arg::Error(msg) => msg,
            Arg::Display(text) => text,
        }
    }
}

impl fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Str(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for Arg<'_> {
    fn from(value: String) -> Self {
        Arg::Str(Cow::Owned(value))
    }
}

impl<'a> From<Cow<'a, str>> for Arg<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        Arg::Str(value)
    }
}

impl<'a> From<&'a (dyn std::error::Error + 'static)> for Arg<'a> {
    fn from(value: &'a (dyn std::error::Error + 'static)) -> Self {
        Arg::error(value)
    }
}

macro_rules! display_args {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::Display(value.to_string())
                }
            }
        )*
    };
}

display_args!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

/// A named string value attached to a log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub key: String,
    pub value: String,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Pair up alternating keys and values into fields.
///
/// Yields `args.len() / 2` fields in argument order. An unpaired trailing key
/// produces nothing.
pub fn flatten(args: &[Arg<'_>]) -> Vec<Field> {
    args.chunks_exact(2)
        .map(|pair| Field::new(pair[0].as_text(), pair[1].as_text()))
        .collect()
}

/// Build a `Vec<Arg>` from a comma separated list of values.
///
/// Each element goes through `Arg::from`, so strings, numbers, booleans and
/// prebuilt [`Arg`]s can be mixed freely.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
