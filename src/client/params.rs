//! Query parameters
//!
//! Keys are unique and unordered, so [`Params`] is a `BTreeMap`; encoding is
//! deterministic as a side effect. Lists expand to Steam's indexed form
//! (`appids[0]=10&appids[1]=20`). Booleans encode as `true`/`false`.

use std::collections::BTreeMap;
use std::fmt;

/// Parameter mapping passed to the executor
pub type Params = BTreeMap<String, ParamValue>;

/// A scalar or list parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// String value
    Str(String),
    /// Signed integer (ids, counts)
    Int(i64),
    /// Unsigned integer (64-bit Steam ids)
    UInt(u64),
    /// Floating point value
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Ordered list, expanded with `[index]` suffixes
    List(Vec<ParamValue>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "{s}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::UInt(u) => write!(f, "{u}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::List(items) => {
                let joined: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join(","))
            }
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    String => Str,
    &str => Str,
    i64 => Int,
    i32 => Int,
    u64 => UInt,
    u32 => UInt,
    f64 => Float,
    bool => Bool,
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Build a [`Params`] map from `key => value` pairs
///
/// ```
/// let params = steamy::params! { "steamid" => 76561197960435530u64, "include_appinfo" => true };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::client::Params::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::client::Params::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::client::ParamValue::from($value),
            );
        )+
        map
    }};
}

/// Flatten parameters into query pairs
pub fn encode_query(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        push_pairs(&mut pairs, key.clone(), value);
    }
    pairs
}

fn push_pairs(pairs: &mut Vec<(String, String)>, key: String, value: &ParamValue) {
    match value {
        ParamValue::List(items) => {
            for (index, item) in items.iter().enumerate() {
                push_pairs(pairs, format!("{key}[{index}]"), item);
            }
        }
        scalar => pairs.push((key, scalar.to_string())),
    }
}
