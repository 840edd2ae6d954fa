//! Walk a parameter list over message tokens.

use crate::coerce::Param;
use crate::error::{ArgError, Result};
use crate::tokenize::Token;
use crate::value::{Args, Value};

/// Resolve `params` against `tokens[pos..]`.
///
/// `text` is the full original message the tokens were produced from; it is
/// only read by [`Coercion::Rest`](crate::Coercion::Rest) parameters.
///
/// - A parameter with a default and no token left takes the default.
/// - A required parameter with no token left yields
///   [`ArgError::Incomplete`].
/// - A token its rule rejects yields [`ArgError::Invalid`].
///
/// Tokens beyond the last parameter are ignored.
pub fn resolve(params: &[Param], tokens: &[Token], pos: usize, text: &str) -> Result<Args> {
    let mut args = Args::new();
    let mut cursor = pos.min(tokens.len());

    for param in params {
        let Some(token) = tokens.get(cursor) else {
            match &param.default {
                Some(default) => {
                    args.push(param.name.clone(), default.clone());
                    continue;
                }
                None => {
                    return Err(ArgError::Incomplete {
                        param: param.name.clone(),
                    });
                }
            }
        };

        if param.rule.is_rest() {
            let rest = text.get(token.start..).unwrap_or(token.as_str());
            args.push(param.name.clone(), Value::Str(rest.to_owned()));
            cursor = tokens.len();
            continue;
        }

        let value = param
            .rule
            .apply(token.as_str())
            .map_err(|reason| ArgError::Invalid {
                param: param.name.clone(),
                reason,
            })?;
        args.push(param.name.clone(), value);
        cursor += 1;
    }

    Ok(args)
}
