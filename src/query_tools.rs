//! Query text helpers shared by the controller and hosts.

use once_cell::sync::Lazy;
use regex::Regex;
use sqlformat::{FormatOptions, Indent, QueryParams};

// Single alternation, prefixed join kinds before the bare JOIN arm, so one
// pass never re-matches inside a keyword it already broke.
static CLAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r" (INNER JOIN|LEFT JOIN|RIGHT JOIN|FULL JOIN|JOIN|WHERE|GROUP BY|ORDER BY|LIMIT) ",
    )
    .unwrap()
});

/// Cosmetic pass over serialized text: a line break before each major clause
/// keyword. Quoted regions are copied through untouched so a literal value
/// containing a clause keyword is never rewritten.
pub fn break_clauses(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut rest = sql;
    while let Some(pos) = rest.find(|c: char| matches!(c, '\'' | '"' | '`')) {
        out.push_str(&CLAUSE_RE.replace_all(&rest[..pos], "\n${1} "));
        let span = quoted_span(&rest[pos..]);
        out.push_str(&rest[pos..pos + span]);
        rest = &rest[pos + span..];
    }
    out.push_str(&CLAUSE_RE.replace_all(rest, "\n${1} "));
    out
}

// Byte length of the quoted run starting at `s`, honoring the doubled-quote
// escape the emitter produces. An unterminated quote runs to the end.
fn quoted_span(s: &str) -> usize {
    let bytes = s.as_bytes();
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Centralized sqlformat options for hosts that want a full pretty print
/// instead of the minimal clause breaks.
pub fn default_sqlformat_options() -> FormatOptions<'static> {
    FormatOptions {
        joins_as_top_level: true,
        indent: Indent::Spaces(2),
        uppercase: Some(true),
        lines_between_queries: 2,
        ..Default::default()
    }
}

pub fn pretty_sql(sql: &str) -> String {
    sqlformat::format(sql, &QueryParams::None, &default_sqlformat_options())
}
