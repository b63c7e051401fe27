//! # Query Formatting
//!
//! Backs the `\fmt` command. Formatting is cosmetic: it normalises
//! whitespace, upper-cases keywords and puts major clauses on their own
//! lines. String literals are never touched.

use std::sync::LazyLock;

use regex::Regex;

/// Reformats a query buffer
pub trait QueryFormatter {
    fn format(&self, query: &str) -> String;
}

const KEYWORDS: &[&str] = &[
    "select", "from", "where", "and", "or", "not", "in", "is", "null", "like", "between",
    "join", "inner", "left", "right", "full", "outer", "cross", "on", "as", "group", "by",
    "order", "having", "union", "all", "distinct", "case", "when", "then", "else", "end",
    "asc", "desc", "fetch", "first", "next", "rows", "row", "only", "offset", "exists",
];

/// Clauses that start a new line, longest first so `LEFT JOIN` wins over `JOIN`
const CLAUSES: &[&str] = &[
    "LEFT OUTER JOIN",
    "RIGHT OUTER JOIN",
    "FULL OUTER JOIN",
    "INNER JOIN",
    "LEFT JOIN",
    "RIGHT JOIN",
    "CROSS JOIN",
    "GROUP BY",
    "ORDER BY",
    "UNION ALL",
    "FETCH FIRST",
    "FETCH NEXT",
    "SELECT",
    "FROM",
    "WHERE",
    "HAVING",
    "UNION",
    "JOIN",
    "OFFSET",
];

/// Single-quoted literal or a run of non-quote text
static TOKENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'(?:[^']|'')*'?|[^']+").unwrap());
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r" \b({})\b", CLAUSES.join("|"))).unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordFormatter;

impl KeywordFormatter {
    fn format_code(segment: &str) -> String {
        let collapsed = WHITESPACE.replace_all(segment, " ");
        let upper = WORD.replace_all(&collapsed, |caps: &regex::Captures| {
            let word = &caps[0];
            if KEYWORDS.contains(&word.to_lowercase().as_str()) {
                word.to_uppercase()
            } else {
                word.to_string()
            }
        });

        CLAUSE.replace_all(&upper, "\n$1").into_owned()
    }
}

impl QueryFormatter for KeywordFormatter {
    fn format(&self, query: &str) -> String {
        let trimmed = query.trim().trim_end_matches(';').trim_end();
        let formatted: String = TOKENS
            .find_iter(trimmed)
            .map(|m| {
                let token = m.as_str();
                if token.starts_with('\'') {
                    token.to_string()
                } else {
                    Self::format_code(token)
                }
            })
            .collect();

        formatted
    }
}
