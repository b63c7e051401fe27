//! # Line Editor Helper
//!
//! Ghost-text suggestions from the query history and SuiteQL keyword
//! highlighting for the interactive prompt.

use std::borrow::Cow;
use std::sync::LazyLock;

use crossterm::style::Stylize;
use regex::Regex;
use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "IS", "NULL", "LIKE", "BETWEEN",
    "JOIN", "INNER", "LEFT", "RIGHT", "FULL", "OUTER", "CROSS", "ON", "AS", "GROUP", "BY",
    "ORDER", "HAVING", "UNION", "ALL", "DISTINCT", "CASE", "WHEN", "THEN", "ELSE", "END",
    "ASC", "DESC", "FETCH", "FIRST", "NEXT", "ROWS", "ROW", "ONLY", "OFFSET", "EXISTS",
    "COUNT", "SUM", "MIN", "MAX", "AVG", "TO_DATE", "TO_CHAR", "NVL", "BUILTIN",
];

/// String literal, number, or word
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'(?:[^']|'')*'?|\b\d+(?:\.\d+)?\b|[A-Za-z_][A-Za-z0-9_.]*").unwrap());

pub struct ReplHelper {
    hinter: HistoryHinter,
    color: bool,
}

impl ReplHelper {
    pub fn new(color: bool) -> Self {
        Self {
            hinter: HistoryHinter::new(),
            color,
        }
    }

    /// ANSI-styled copy of `line`
    pub fn highlight_line(line: &str) -> String {
        TOKEN
            .replace_all(line, |caps: &regex::Captures| {
                let token = &caps[0];
                if token.starts_with('\'') {
                    token.green().to_string()
                } else if token.starts_with(|c: char| c.is_ascii_digit()) {
                    token.yellow().to_string()
                } else if KEYWORDS.contains(&token.to_uppercase().as_str()) {
                    token.blue().bold().to_string()
                } else {
                    token.to_string()
                }
            })
            .into_owned()
    }
}

impl Completer for ReplHelper {
    type Candidate = String;
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<Self::Hint> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.color && !line.trim_start().starts_with('\\') {
            Cow::Owned(Self::highlight_line(line))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if self.color && !hint.is_empty() {
            Cow::Owned(hint.dim().to_string())
        } else {
            Cow::Borrowed(hint)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        self.color
    }
}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}
