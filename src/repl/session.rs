//! # REPL Session
//!
//! The session state threaded through the REPL loop. Handlers consume the
//! session and hand back the updated one together with an [`Effect`] for the
//! loop to carry out; nothing here performs I/O.

use crate::executor::QueryResult;
use crate::pagination::{parse_bound, PageWindow, PagerState, PaginationError};
use crate::render::OutputMode;

use super::command::{Command, Input};

/// A query ready to be sent, with the window it should be sent for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub query: String,
    pub window: PageWindow,
}

/// What the loop has to do after a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    Execute(PendingQuery),
    LoadFile(String),
    Format,
    OutputChanged(OutputMode),
    Notice(String),
    Invalid(PaginationError),
    Help,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    buffer: String,
    last_query: Option<String>,
    result: Option<QueryResult>,
    output_mode: OutputMode,
    window: PageWindow,
}

impl Session {
    pub fn new(output_mode: OutputMode, window: PageWindow) -> Self {
        Self {
            output_mode,
            window,
            ..Self::default()
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn result(&self) -> Option<&QueryResult> {
        self.result.as_ref()
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Default window for the next fresh query
    pub fn window(&self) -> &PageWindow {
        &self.window
    }

    pub fn state(&self) -> PagerState {
        self.result
            .as_ref()
            .map_or(PagerState::Idle, |result| result.window.state())
    }

    /// Handle one line of input
    pub fn handle(self, input: Input) -> (Self, Effect) {
        match input {
            Input::Command(command) => self.dispatch(command),
            Input::Text { text, execute } => self.append(text, execute),
        }
    }

    /// Commit a completed execution
    pub fn apply_result(self, pending: PendingQuery, result: QueryResult) -> Self {
        tracing::debug!(
            "Applying result: {} rows, window {:?}",
            result.rows.len(),
            result.window
        );
        Self {
            last_query: Some(pending.query),
            result: Some(result),
            ..self
        }
    }

    pub fn replace_buffer(self, text: String) -> Self {
        Self {
            buffer: text,
            ..self
        }
    }

    fn append(mut self, text: String, execute: bool) -> (Self, Effect) {
        if !text.trim().is_empty() {
            if !self.buffer.is_empty() {
                self.buffer.push('\n');
            }
            self.buffer.push_str(&text);
        }

        if !execute {
            return (self, Effect::None);
        }

        let query = std::mem::take(&mut self.buffer).trim().to_string();
        if query.is_empty() {
            return (self, Effect::None);
        }
        let pending = PendingQuery {
            query,
            window: self.window,
        };
        (self, Effect::Execute(pending))
    }

    fn dispatch(mut self, command: Command) -> (Self, Effect) {
        match command {
            Command::Quit => (self, Effect::Quit),
            Command::Help => (self, Effect::Help),
            Command::LoadFile(Some(path)) => (self, Effect::LoadFile(path)),
            Command::LoadFile(None) => (self, Effect::Notice("Usage: \\f <file>".to_string())),
            Command::Format if self.buffer.trim().is_empty() => {
                (self, Effect::Notice("Query buffer is empty".to_string()))
            }
            Command::Format => (self, Effect::Format),
            Command::ToggleOutput => {
                self.output_mode = self.output_mode.toggled();
                let mode = self.output_mode;
                (self, Effect::OutputChanged(mode))
            }
            Command::SetLimit(raw) => {
                let applied = raw
                    .map(|raw| parse_bound("limit", &raw))
                    .transpose()
                    .and_then(|limit| self.window.set_limit(limit));
                let notice = match self.window.limit() {
                    Some(limit) => format!("Default limit set to {limit}"),
                    None => "Default limit cleared".to_string(),
                };
                self.after_bound_change(applied, notice)
            }
            Command::SetOffset(raw) => {
                let applied = raw
                    .map(|raw| parse_bound("offset", &raw))
                    .transpose()
                    .and_then(|offset| self.window.set_offset(offset));
                let notice = format!("Default offset set to {}", self.window.offset());
                self.after_bound_change(applied, notice)
            }
            Command::NextPage => self.navigate(|window| window.next_page()),
            Command::PrevPage => self.navigate(|window| {
                window.prev_page();
                Ok(())
            }),
        }
    }

    fn after_bound_change(
        self,
        applied: Result<(), PaginationError>,
        notice: String,
    ) -> (Self, Effect) {
        match applied {
            Ok(()) => (self, Effect::Notice(notice)),
            Err(e) => (self, Effect::Invalid(e)),
        }
    }

    /// Move the current result's window and re-run the query that produced it
    fn navigate<F>(self, step: F) -> (Self, Effect)
    where
        F: FnOnce(&mut PageWindow) -> Result<(), PaginationError>,
    {
        let last = self.last_query.clone();
        let (query, current) = match (last, self.result.as_ref().map(|r| r.window)) {
            (Some(query), Some(window)) => (query, window),
            _ => return (self, Effect::Notice("No query has been run yet".to_string())),
        };

        let mut moved = current;
        if let Err(e) = step(&mut moved) {
            return (self, Effect::Invalid(e));
        }
        if moved.offset() == current.offset() {
            return (self, Effect::Notice("Already on the first page".to_string()));
        }

        let pending = PendingQuery {
            query,
            window: moved,
        };
        (self, Effect::Execute(pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(line: &str) -> Input {
        Input::parse(line)
    }

    fn page(pending: &PendingQuery, rows: usize, has_more: bool) -> QueryResult {
        let rows = (0..rows)
            .map(|i| serde_json::from_value(json!({ "id": i.to_string() })).unwrap())
            .collect::<Vec<_>>();
        QueryResult {
            count: Some(rows.len() as u64),
            rows,
            window: pending
                .window
                .after_response(Some(pending.window.offset()), has_more, None),
        }
    }

    fn executed(session: Session, line: &str) -> (Session, PendingQuery) {
        match session.handle(input(line)) {
            (session, Effect::Execute(pending)) => (session, pending),
            (_, effect) => panic!("expected execution, got {effect:?}"),
        }
    }

    #[test]
    fn text_should_accumulate_until_semicolon() {
        let session = Session::default();
        let (session, effect) = session.handle(input("SELECT id"));
        assert_eq!(effect, Effect::None);
        assert_eq!(session.buffer(), "SELECT id");

        let (session, pending) = executed(session, "FROM customer;");
        assert_eq!(pending.query, "SELECT id\nFROM customer");
        assert_eq!(pending.window, PageWindow::default());
        assert_eq!(session.buffer(), "");
    }

    #[test]
    fn lone_semicolon_with_empty_buffer_should_do_nothing() {
        let (session, effect) = Session::default().handle(input(";"));
        assert_eq!(effect, Effect::None);
        assert_eq!(session.state(), PagerState::Idle);
    }

    #[test]
    fn execution_should_use_default_window() {
        let window = PageWindow::with_explicit(Some(5), Some(10)).unwrap();
        let session = Session::new(OutputMode::Table, window);

        let (_, pending) = executed(session, "SELECT id FROM customer;");
        assert_eq!(pending.window.limit(), Some(5));
        assert_eq!(pending.window.offset(), 10);
    }

    #[test]
    fn next_page_should_rerun_last_query_with_moved_window() {
        let window = PageWindow::with_explicit(Some(50), None).unwrap();
        let (session, pending) = executed(Session::new(OutputMode::Table, window), "SELECT id FROM customer;");
        let result = page(&pending, 50, true);
        let session = session.apply_result(pending, result);
        assert_eq!(session.state(), PagerState::Paged);

        let (session, next) = executed(session, "\\n");
        assert_eq!(next.query, "SELECT id FROM customer");
        assert_eq!(next.window.offset(), 50);
        // Not committed until the response is applied
        assert_eq!(session.result().unwrap().window.offset(), 0);

        let result = page(&next, 50, true);
        let session = session.apply_result(next, result);
        let (_, next) = executed(session, "\\n");
        assert_eq!(next.window.offset(), 100);
    }

    #[test]
    fn next_page_after_last_page_should_be_rejected() {
        let (session, pending) = executed(Session::default(), "SELECT id FROM customer;");
        let result = page(&pending, 3, false);
        let session = session.apply_result(pending, result);

        let (session, effect) = session.handle(input("\\n"));
        assert_eq!(effect, Effect::Invalid(PaginationError::NoMorePages));
        assert_eq!(session.result().unwrap().window.offset(), 0);
    }

    #[test]
    fn prev_page_on_first_page_should_be_a_notice() {
        let (session, pending) = executed(Session::default(), "SELECT 1;");
        let result = page(&pending, 1, true);
        let session = session.apply_result(pending, result);

        let (_, effect) = session.handle(input("\\p"));
        assert!(matches!(effect, Effect::Notice(_)));
    }

    #[test]
    fn prev_page_should_step_back() {
        let window = PageWindow::with_explicit(Some(20), Some(40)).unwrap();
        let (session, pending) = executed(Session::new(OutputMode::Table, window), "SELECT 1;");
        let result = page(&pending, 20, true);
        let session = session.apply_result(pending, result);

        let (_, prev) = executed(session, "\\p");
        assert_eq!(prev.window.offset(), 20);
    }

    #[test]
    fn navigation_before_any_query_should_be_a_notice() {
        let (_, effect) = Session::default().handle(input("\\n"));
        assert_eq!(effect, Effect::Notice("No query has been run yet".to_string()));
    }

    #[test]
    fn set_limit_and_offset_should_update_default_window() {
        let (session, effect) = Session::default().handle(input("\\l 25"));
        assert_eq!(effect, Effect::Notice("Default limit set to 25".to_string()));
        assert_eq!(session.window().limit(), Some(25));

        let (session, _) = session.handle(input("\\o 75"));
        assert_eq!(session.window().offset(), 75);

        let (session, effect) = session.handle(input("\\l"));
        assert_eq!(effect, Effect::Notice("Default limit cleared".to_string()));
        assert_eq!(session.window().limit(), None);

        let (session, _) = session.handle(input("\\o"));
        assert_eq!(session.window().offset(), 0);
    }

    #[test]
    fn invalid_bounds_should_leave_window_unchanged() {
        let (session, _) = Session::default().handle(input("\\l 10"));

        let (session, effect) = session.handle(input("\\l 0"));
        assert!(matches!(
            effect,
            Effect::Invalid(PaginationError::InvalidBound { name: "limit", .. })
        ));
        let (session, effect) = session.handle(input("\\o many"));
        assert!(matches!(
            effect,
            Effect::Invalid(PaginationError::InvalidBound { name: "offset", .. })
        ));
        assert_eq!(session.window().limit(), Some(10));
        assert_eq!(session.window().offset(), 0);
    }

    #[test]
    fn toggle_output_should_flip_mode() {
        let (session, effect) = Session::default().handle(input("\\j"));
        assert_eq!(effect, Effect::OutputChanged(OutputMode::Json));
        assert_eq!(session.output_mode(), OutputMode::Json);
    }

    #[test]
    fn format_and_load_should_be_delegated() {
        let (session, effect) = Session::default().handle(input("\\fmt"));
        assert!(matches!(effect, Effect::Notice(_)));

        let (session, _) = session.handle(input("select 1"));
        let (session, effect) = session.handle(input("\\fmt"));
        assert_eq!(effect, Effect::Format);

        let (session, effect) = session.handle(input("\\f query.sql"));
        assert_eq!(effect, Effect::LoadFile("query.sql".to_string()));

        let session = session.replace_buffer("SELECT 2".to_string());
        assert_eq!(session.buffer(), "SELECT 2");
        assert_eq!(session.handle(input("\\q")).1, Effect::Quit);
    }
}
