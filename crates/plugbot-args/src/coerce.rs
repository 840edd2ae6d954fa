//! Parameter descriptors and coercion rules.
//!
//! A command declares its parameters once, at registration time, as a list
//! of [`Param`]s. Each carries a [`Coercion`] describing how a raw token
//! becomes a [`Value`].

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// User-supplied conversion: token in, value or reason out.
pub type CustomFn = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

/// How raw text becomes a typed value.
#[derive(Clone)]
pub enum Coercion {
    /// Token kept as is.
    Str,
    /// Token lower-cased.
    Lower,
    /// Token upper-cased.
    Upper,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float. Rejects NaN and infinities.
    Float,
    /// `true/yes/on/y/1` or `false/no/off/n/0`, any case.
    Bool,
    /// One of a fixed set of words, matched case-insensitively. Yields the
    /// canonical spelling from the set.
    Choice(Vec<String>),
    /// Arbitrary conversion function.
    Custom(CustomFn),
    /// The original message text from this token's start to the end,
    /// spacing (trailing whitespace included) and case preserved.
    /// Consumes every remaining token.
    Rest,
}

impl Coercion {
    /// Build a [`Coercion::Custom`] from a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Build a [`Coercion::Choice`].
    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Choice(choices.into_iter().map(Into::into).collect())
    }

    /// `true` for [`Coercion::Rest`].
    #[inline]
    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest)
    }

    /// Short name used in generated usage strings and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str | Self::Lower | Self::Upper => "text",
            Self::Int => "integer",
            Self::Float => "number",
            Self::Bool => "yes/no",
            Self::Choice(_) => "choice",
            Self::Custom(_) => "value",
            Self::Rest => "text...",
        }
    }

    /// Convert a single token. [`Coercion::Rest`] is handled by the
    /// resolver and here behaves like [`Coercion::Str`].
    pub fn apply(&self, token: &str) -> Result<Value, String> {
        match self {
            Self::Str | Self::Rest => Ok(Value::Str(token.to_owned())),
            Self::Lower => Ok(Value::Str(token.to_lowercase())),
            Self::Upper => Ok(Value::Str(token.to_uppercase())),
            Self::Int => token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{token}' is not a whole number")),
            Self::Float => match token.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Value::Float(x)),
                _ => Err(format!("'{token}' is not a number")),
            },
            Self::Bool => parse_bool(token)
                .map(Value::Bool)
                .ok_or_else(|| format!("'{token}' is not yes or no")),
            Self::Choice(choices) => choices
                .iter()
                .find(|c| c.eq_ignore_ascii_case(token))
                .map(|c| Value::Str(c.clone()))
                .ok_or_else(|| format!("'{token}' must be one of: {}", choices.join(", "))),
            Self::Custom(f) => f(token),
        }
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str => f.write_str("Str"),
            Self::Lower => f.write_str("Lower"),
            Self::Upper => f.write_str("Upper"),
            Self::Int => f.write_str("Int"),
            Self::Float => f.write_str("Float"),
            Self::Bool => f.write_str("Bool"),
            Self::Choice(c) => f.debug_tuple("Choice").field(c).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Rest => f.write_str("Rest"),
        }
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// One declared parameter of a command.
#[derive(Clone, Debug)]
pub struct Param {
    /// Parameter name, used for lookup in [`Args`](crate::Args) and in
    /// error messages.
    pub name: String,
    /// Conversion rule.
    pub rule: Coercion,
    /// Value used when no token remains. `None` makes the parameter
    /// required.
    pub default: Option<Value>,
}

impl Param {
    /// A parameter that must be supplied.
    pub fn required(name: impl Into<String>, rule: Coercion) -> Self {
        Self {
            name: name.into(),
            rule,
            default: None,
        }
    }

    /// A parameter that falls back to `default` when absent.
    pub fn optional(name: impl Into<String>, rule: Coercion, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            rule,
            default: Some(default.into()),
        }
    }

    /// `true` if the parameter has no default.
    #[inline]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }

    /// Usage fragment: `<name>` for required, `[name]` for optional, with
    /// a trailing `...` for [`Coercion::Rest`].
    pub fn usage(&self) -> String {
        let dots = if self.rule.is_rest() { "..." } else { "" };
        if self.is_required() {
            format!("<{}{dots}>", self.name)
        } else {
            format!("[{}{dots}]", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_rules() {
        assert_eq!(Coercion::Int.apply("-42"), Ok(Value::Int(-42)));
        assert!(Coercion::Int.apply("4.2").is_err());
        assert_eq!(Coercion::Float.apply("4.5"), Ok(Value::Float(4.5)));
        assert!(Coercion::Float.apply("NaN").is_err());
        assert_eq!(Coercion::Lower.apply("HeLLo"), Ok("hello".into()));
        assert_eq!(Coercion::Upper.apply("HeLLo"), Ok("HELLO".into()));
    }

    #[test]
    fn bool_rule() {
        for yes in ["yes", "Y", "TRUE", "on", "1"] {
            assert_eq!(Coercion::Bool.apply(yes), Ok(Value::Bool(true)), "{yes}");
        }
        for no in ["no", "N", "false", "OFF", "0"] {
            assert_eq!(Coercion::Bool.apply(no), Ok(Value::Bool(false)), "{no}");
        }
        assert!(Coercion::Bool.apply("maybe").is_err());
    }

    #[test]
    fn choice_is_case_insensitive_and_canonical() {
        let rule = Coercion::choice(["Rock", "Paper", "Scissors"]);
        assert_eq!(rule.apply("paper"), Ok("Paper".into()));
        let err = rule.apply("lizard").unwrap_err();
        assert!(err.contains("Rock, Paper, Scissors"));
    }

    #[test]
    fn custom_rule() {
        let rule = Coercion::custom(|t| {
            t.strip_prefix('#')
                .map(|c| Value::Str(c.to_owned()))
                .ok_or_else(|| "expected a #channel".to_owned())
        });
        assert_eq!(rule.apply("#general"), Ok("general".into()));
        assert_eq!(rule.apply("general"), Err("expected a #channel".to_owned()));
        assert_eq!(format!("{rule:?}"), "Custom(..)");
    }

    #[test]
    fn usage_fragments() {
        assert_eq!(Param::required("who", Coercion::Str).usage(), "<who>");
        assert_eq!(Param::optional("n", Coercion::Int, 1i64).usage(), "[n]");
        assert_eq!(Param::required("text", Coercion::Rest).usage(), "<text...>");
    }
}
