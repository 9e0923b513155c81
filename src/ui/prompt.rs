use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

// ---------------------------------------------------------------------------
// LineReader – where answers come from
// ---------------------------------------------------------------------------

/// A source of answer lines. `Ok(None)` means the user closed the input
/// (Ctrl-D / Ctrl-C) and the session should end.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive terminal input with line editing and history.
pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(Some(line))
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt combinators
// ---------------------------------------------------------------------------

const INPUT_PROMPT: &str = "> ";

/// Ask `question` until `parse` accepts the answer.
///
/// Rejected answers print the parse error and ask again. Returns `None` if
/// the input ends first.
pub fn ask_until<T, E, W>(
    reader: &mut dyn LineReader,
    out: &mut W,
    question: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>>
where
    E: Display,
    W: Write + ?Sized,
{
    loop {
        writeln!(out, "{question}")?;
        out.flush()?;
        let Some(line) = reader.read_line(INPUT_PROMPT)? else {
            return Ok(None);
        };
        match parse(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => {
                log::debug!("rejected answer {line:?}: {e}");
                writeln!(out, "\n{e}. Please try again.\n")?;
            }
        }
    }
}

/// Yes/no question; anything other than "y" or "yes" (any case) is no.
pub fn confirm<W: Write + ?Sized>(
    reader: &mut dyn LineReader,
    out: &mut W,
    question: &str,
) -> Result<bool> {
    writeln!(out, "{question}")?;
    out.flush()?;
    Ok(reader
        .read_line(INPUT_PROMPT)?
        .map(|answer| {
            let answer = answer.trim();
            answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
        })
        .unwrap_or(false))
}
