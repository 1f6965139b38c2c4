//! Variable codec: shields the SQL parser from `{{name}}` template variables.
//!
//! `decode` swaps every placeholder for a quoted sentinel literal the parser
//! accepts; `encode` restores the placeholders after serialization, whichever
//! quoting the emitter chose for the sentinel.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

static WHOLE_VARIABLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\{\{([^}]+)\}\}$").unwrap());

// All renderings a serializer may produce for a sentinel. Quoted arms come
// first so the bare arm never strips a surrounding quote pair, and the
// trailing `__` keeps ordinal matches on exact boundaries.
static SENTINEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'__VAR_(\d+)__'|"__VAR_(\d+)__"|`__VAR_(\d+)__`|__VAR_(\d+)__"#).unwrap()
});

/// One sighted template variable. Ordinals are assigned at first sighting,
/// in scan order during `decode` or as the next unused ordinal when a filter
/// introduces a new variable; they are never reused within a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableBinding {
    pub placeholder: String,
    pub name: String,
    pub ordinal: usize,
}

/// Bare sentinel body for an ordinal.
pub fn sentinel(ordinal: usize) -> String {
    format!("__VAR_{}__", ordinal)
}

fn quoted_sentinel(ordinal: usize) -> String {
    format!("'__VAR_{}__'", ordinal)
}

/// Replaces every `{{name}}` occurrence with a parser-safe sentinel literal.
/// Duplicate names still get distinct ordinals `0..k-1` in scan order.
pub fn decode(text: &str) -> (String, Vec<VariableBinding>) {
    if text.is_empty() {
        return (text.to_string(), Vec::new());
    }
    let mut bindings = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in VARIABLE_RE.captures_iter(text) {
        let m = caps.get(0).expect("match group 0 always present");
        let ordinal = bindings.len();
        out.push_str(&text[last..m.start()]);
        out.push_str(&quoted_sentinel(ordinal));
        bindings.push(VariableBinding {
            placeholder: m.as_str().to_string(),
            name: caps[1].trim().to_string(),
            ordinal,
        });
        last = m.end();
    }
    out.push_str(&text[last..]);
    (out, bindings)
}

/// Restores placeholders for every sentinel rendering (single-, double-,
/// back-quoted or bare) in a single pass. Sentinels with an ordinal that has
/// no binding pass through untouched.
pub fn encode(text: &str, bindings: &[VariableBinding]) -> String {
    if text.is_empty() || bindings.is_empty() {
        return text.to_string();
    }
    SENTINEL_RE
        .replace_all(text, |caps: &Captures| {
            let ordinal = caps
                .iter()
                .skip(1)
                .flatten()
                .next()
                .and_then(|m| m.as_str().parse::<usize>().ok());
            match ordinal.and_then(|o| bindings.iter().find(|b| b.ordinal == o)) {
                Some(binding) => binding.placeholder.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Is the whole value a single `{{name}}` placeholder?
pub fn is_variable(value: &str) -> bool {
    WHOLE_VARIABLE_RE.is_match(value)
}

/// Trimmed inner name of a whole-value placeholder.
pub fn placeholder_name(value: &str) -> Option<String> {
    WHOLE_VARIABLE_RE
        .captures(value)
        .map(|caps| caps[1].trim().to_string())
}

/// Next unused ordinal for a freshly sighted variable.
pub fn next_ordinal(bindings: &[VariableBinding]) -> usize {
    bindings.iter().map(|b| b.ordinal + 1).max().unwrap_or(0)
}

pub fn find_by_placeholder<'a>(
    bindings: &'a [VariableBinding],
    placeholder: &str,
) -> Option<&'a VariableBinding> {
    bindings.iter().find(|b| b.placeholder == placeholder)
}
