//! # REPL Controller
//!
//! Owns the line editor and the executor, feeds each input line to the
//! [`Session`] and carries out the [`Effect`] it hands back. Results go to
//! stdout; notices, progress and errors go to stderr.

use std::future::Future;

use anyhow::Result;
use crossterm::style::Stylize;
use rustyline::config::{Config, EditMode};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::error::QueryError;
use crate::executor::{QueryExecutor, QueryResult};
use crate::formatter::QueryFormatter;
use crate::history::{to_entry, QueryHistory};
use crate::render::ResultRenderer;

use super::command::{Input, HELP_TEXT};
use super::helper::ReplHelper;
use super::session::{Effect, PendingQuery, Session};

const PROMPT: &str = "suiteql> ";
const CONTINUATION_PROMPT: &str = "     ... ";

pub struct ReplController<R: ResultRenderer, F: QueryFormatter> {
    executor: QueryExecutor,
    renderer: R,
    formatter: F,
    history: QueryHistory,
    color: bool,
    gate: QueryGate,
}

impl<R: ResultRenderer, F: QueryFormatter> ReplController<R, F> {
    pub fn new(
        executor: QueryExecutor,
        renderer: R,
        formatter: F,
        history: QueryHistory,
        color: bool,
    ) -> Self {
        Self {
            executor,
            renderer,
            formatter,
            history,
            color,
            gate: QueryGate::default(),
        }
    }

    /// Run the loop until `\q` or end of input
    pub async fn run(&mut self, mut session: Session) -> Result<()> {
        let config = Config::builder()
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();
        let mut editor: Editor<ReplHelper, DefaultHistory> = Editor::with_config(config)?;
        editor.set_helper(Some(ReplHelper::new(self.color)));

        match self.history.load() {
            Ok(entries) => {
                tracing::debug!("Loaded {} history entries", entries.len());
                for entry in entries {
                    editor.add_history_entry(entry)?;
                }
            }
            Err(e) => tracing::warn!("Ignoring unreadable history: {:#}", e),
        }

        eprintln!(
            "Connected to {} ({} output). Type \\h for help, \\q to quit.",
            self.executor.config().credentials.account_id,
            session.output_mode().name()
        );
        if !session.buffer().is_empty() {
            eprintln!("{}", session.buffer());
        }

        loop {
            let prompt = if session.buffer().is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };

            let line = match editor.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C at the prompt drops the partial query
                    session = session.replace_buffer(String::new());
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let input = Input::parse(&line);
            let submitted = matches!(input, Input::Text { execute: true, .. });
            let (next, effect) = session.handle(input);
            session = next;

            match effect {
                Effect::None => {}
                Effect::Quit => break,
                Effect::Execute(pending) => {
                    if submitted {
                        self.record(&mut editor, &pending.query);
                    }
                    session = self.execute(session, pending).await;
                }
                Effect::LoadFile(path) => session = self.load_file(session, &path),
                Effect::Format => {
                    let formatted = self.formatter.format(session.buffer());
                    eprintln!("{formatted}");
                    session = session.replace_buffer(formatted);
                }
                Effect::OutputChanged(mode) => {
                    self.notice(&format!("Output mode: {}", mode.name()));
                    if session.result().is_some() {
                        self.show(&session);
                    }
                }
                Effect::Notice(message) => self.notice(&message),
                Effect::Invalid(e) => self.error(&e.to_string()),
                Effect::Help => eprintln!("{HELP_TEXT}"),
            }
        }

        tracing::debug!("REPL finished");
        Ok(())
    }

    /// Send one query, racing it against Ctrl-C
    async fn execute(&mut self, session: Session, pending: PendingQuery) -> Session {
        self.notice("Running query...");
        let query = pending.query.clone();
        let window = pending.window;
        let request = self.executor.execute(&query, &window);
        let cancel = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        let (session, outcome) =
            run_cancellable(&mut self.gate, session, pending, request, cancel).await;
        match outcome {
            Outcome::Applied => self.show(&session),
            Outcome::Cancelled => self.notice("Query cancelled"),
            Outcome::Busy => self.notice("A query is already running"),
            Outcome::Failed(e) => self.error(&describe(&e)),
        }
        session
    }

    fn load_file(&self, session: Session, path: &str) -> Session {
        let expanded = shellexpand::tilde(path).into_owned();
        match std::fs::read_to_string(&expanded) {
            Ok(text) => {
                let text = text.trim_end().to_string();
                eprintln!("{text}");
                self.notice(&format!(
                    "Loaded {} into the buffer; end a line with ';' to run it",
                    path
                ));
                session.replace_buffer(text)
            }
            Err(e) => {
                self.error(&format!("Failed to read '{path}': {e}"));
                session
            }
        }
    }

    fn record(&self, editor: &mut Editor<ReplHelper, DefaultHistory>, query: &str) {
        if let Err(e) = editor.add_history_entry(to_entry(query)) {
            tracing::warn!("Failed to add history entry: {}", e);
        }
        if let Err(e) = self.history.append(query) {
            tracing::warn!("Failed to write history: {:#}", e);
        }
    }

    fn show(&self, session: &Session) {
        let Some(result) = session.result() else {
            return;
        };
        match self.renderer.render(result, session.output_mode()) {
            Ok(text) => println!("{text}"),
            Err(e) => self.error(&format!("Failed to render result: {e:#}")),
        }
    }

    fn notice(&self, message: &str) {
        if self.color {
            eprintln!("{}", message.dim());
        } else {
            eprintln!("{message}");
        }
    }

    fn error(&self, message: &str) {
        if self.color {
            eprintln!("{}", message.red());
        } else {
            eprintln!("{message}");
        }
    }
}

/// Allows one request in flight per session
#[derive(Debug, Default)]
pub struct QueryGate {
    executing: bool,
}

impl QueryGate {
    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Claim the gate; `false` when a request is already running
    pub fn try_begin(&mut self) -> bool {
        if self.executing {
            return false;
        }
        self.executing = true;
        true
    }

    pub fn finish(&mut self) {
        self.executing = false;
    }
}

/// How one execution attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Cancelled,
    Busy,
    Failed(QueryError),
}

/// Await `request` unless `cancel` fires first.
///
/// Only a completed, successful request is applied to the session; a
/// cancelled, refused or failed one hands the session back unchanged.
pub async fn run_cancellable<Q, C>(
    gate: &mut QueryGate,
    session: Session,
    pending: PendingQuery,
    request: Q,
    cancel: C,
) -> (Session, Outcome)
where
    Q: Future<Output = Result<QueryResult, QueryError>>,
    C: Future<Output = ()>,
{
    if !gate.try_begin() {
        return (session, Outcome::Busy);
    }

    let completed = tokio::select! {
        result = request => Some(result),
        _ = cancel => None,
    };
    gate.finish();

    match completed {
        None => {
            tracing::debug!("Query cancelled at offset {}", pending.window.offset());
            (session, Outcome::Cancelled)
        }
        Some(Ok(result)) => (session.apply_result(pending, result), Outcome::Applied),
        Some(Err(e)) => (session, Outcome::Failed(e)),
    }
}

/// Error text with a hint on what to do next
pub fn describe(err: &QueryError) -> String {
    match err {
        QueryError::Auth(_) => format!("{err}\nCheck the profile credentials and role permissions."),
        QueryError::RateLimited { .. } => format!("{err}\nWait a moment and run the query again."),
        _ => err.to_string(),
    }
}
