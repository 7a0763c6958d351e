//! Host-provided standard library types.
//!
//! These register in a [`Registry`](crate::reflect::Registry) like any other
//! host type, so programs reach them as `Regex.matchFromIndex(...)`.

use regex::Regex;
use tracing::trace;

use crate::error::{CoreError, CoreResult};
use crate::reflect::{ClassDescription, MethodArgument, MethodSpec};
use crate::value::Value;

/// Registry name of the regex helper type.
pub const REGEX_CLASS: &str = "Regex";

const MATCH_FROM_INDEX: &str = "Regex.matchFromIndex";

/// Match `pattern` against `input` starting exactly at byte `offset`.
///
/// Returns null when nothing matches at `offset` (a match further right
/// does not count) or when `offset` is past the end or inside a character.
/// Otherwise returns an array of the whole match followed by each capture
/// group, with null for groups that did not participate.
pub fn match_from_index(pattern: &str, input: &str, offset: i64) -> CoreResult<Value> {
    let regex = Regex::new(pattern)
        .map_err(|e| CoreError::invalid_operand(MATCH_FROM_INDEX, e.to_string()))?;
    let offset = usize::try_from(offset)
        .map_err(|_| CoreError::invalid_operand(MATCH_FROM_INDEX, "negative offset"))?;
    if offset > input.len() || !input.is_char_boundary(offset) {
        return Ok(Value::Null);
    }

    let Some(captures) = regex.captures_at(input, offset) else {
        return Ok(Value::Null);
    };
    // Leftmost search: a match at `offset` would have been found first.
    if captures.get(0).map(|m| m.start()) != Some(offset) {
        return Ok(Value::Null);
    }
    trace!(pattern, offset, groups = captures.len(), "regex matched");
    Ok(Value::array(
        captures
            .iter()
            .map(|group| group.map_or(Value::Null, |m| Value::string(m.as_str())))
            .collect(),
    ))
}

/// Description of the `Regex` host type.
pub fn regex_class() -> ClassDescription {
    ClassDescription::new(REGEX_CLASS).method(MethodSpec::new_static(
        "matchFromIndex",
        vec![
            MethodArgument::new("pattern", "string"),
            MethodArgument::new("input", "string"),
            MethodArgument::new("offset", "number"),
        ],
        |call| {
            match_from_index(
                call.arg(0)?.as_str()?,
                call.arg(1)?.as_str()?,
                call.arg(2)?.as_int()?,
            )
        },
    ))
}
