//! # plugbot-args
//!
//! Turns free-text chat messages into typed command arguments.
//!
//! Two layers live here:
//!
//! - [`tokenize`]: shell-style word splitting that honours double quotes and
//!   never fails. Each [`Token`] remembers where it started in the original
//!   text.
//! - [`resolve`]: walks a command's declared [`Param`] list over the tokens
//!   and produces [`Args`], or reports the list as incomplete or a value as
//!   malformed.
//!
//! ```rust
//! use plugbot_args::{resolve, tokenize, Coercion, Param};
//!
//! let text = "remind 10 take the bins out";
//! let tokens = tokenize(text);
//! let params = [
//!     Param::required("minutes", Coercion::Int),
//!     Param::required("what", Coercion::Rest),
//! ];
//!
//! let args = resolve(&params, &tokens, 1, text).unwrap();
//! assert_eq!(args.int("minutes"), Some(10));
//! assert_eq!(args.str("what"), Some("take the bins out"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod coerce;
pub mod error;
pub mod resolve;
pub mod tokenize;
pub mod value;

pub use coerce::{Coercion, CustomFn, Param};
pub use error::ArgError;
pub use resolve::resolve;
pub use tokenize::{Token, Tokens, split, tokenize};
pub use value::{Args, Value};
