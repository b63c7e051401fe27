//! # Meta-Command Parsing
//!
//! Every REPL line is either a backslash meta-command or query text. Unknown
//! backslash words are not errors: they fall through as query text, the same
//! as any other line.

/// Backslash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `\q`
    Quit,
    /// `\f <file>`; `None` when the path is missing
    LoadFile(Option<String>),
    /// `\j`
    ToggleOutput,
    /// `\fmt`
    Format,
    /// `\l [n]`; `None` clears the limit
    SetLimit(Option<String>),
    /// `\o [n]`; `None` clears the offset
    SetOffset(Option<String>),
    /// `\n`
    NextPage,
    /// `\p`
    PrevPage,
    /// `\h`
    Help,
}

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Query text for the buffer; `execute` is set when the line ends with `;`
    Text { text: String, execute: bool },
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(command) = parse_command(trimmed) {
            return Self::Command(command);
        }

        match trimmed.strip_suffix(';') {
            Some(text) => Self::Text {
                text: text.trim_end().to_string(),
                execute: true,
            },
            None => Self::Text {
                text: line.trim_end().to_string(),
                execute: false,
            },
        }
    }
}

fn parse_command(line: &str) -> Option<Command> {
    if !line.starts_with('\\') {
        return None;
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match name {
        "\\q" => Command::Quit,
        "\\f" => Command::LoadFile(argument),
        "\\j" => Command::ToggleOutput,
        "\\fmt" => Command::Format,
        "\\l" => Command::SetLimit(argument),
        "\\o" => Command::SetOffset(argument),
        "\\n" => Command::NextPage,
        "\\p" => Command::PrevPage,
        "\\h" => Command::Help,
        _ => return None,
    };

    // Argument-less commands with trailing words are not commands
    let takes_argument = matches!(
        command,
        Command::LoadFile(_) | Command::SetLimit(_) | Command::SetOffset(_)
    );
    (takes_argument || rest.is_empty()).then_some(command)
}

pub const HELP_TEXT: &str = "\
Enter SuiteQL text; a line ending in ';' runs the buffered query.

  \\q          quit
  \\f <file>   load a file into the query buffer
  \\j          toggle table / JSON output
  \\fmt        reformat the query buffer
  \\l [n]      set the default limit (no argument clears it)
  \\o [n]      set the default offset (no argument clears it)
  \\n          next page of the last result
  \\p          previous page of the last result
  \\h          this help";
