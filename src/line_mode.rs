use anyhow::{Context, Result};
use hackcalc::completion::{apply_completion, trailing_word, CompletionIndex};
use hackcalc::{format_value, Evaluator};
use std::io::{stdin, stdout, Write};
use termion::{
    clear::CurrentLine as ClearLine,
    cursor::{DetectCursorPos, Goto},
    event::Key,
    input::TermRead,
    raw::IntoRawMode,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const PROMPT: &str = "Expression: ";

/// What pressing Tab does to the current line.
#[derive(Debug, PartialEq)]
enum Completion {
    Nothing,
    /// Exactly one candidate; the line with it applied.
    Replaced(String),
    Candidates(Vec<&'static str>),
}

fn complete(index: &CompletionIndex<'_>, line: &str) -> Completion {
    let Some(word) = trailing_word(line) else {
        return Completion::Nothing;
    };
    match index.suggest(word).as_slice() {
        [] => Completion::Nothing,
        [only] => Completion::Replaced(apply_completion(line, word, only)),
        many => Completion::Candidates(many.to_vec()),
    }
}

fn byte_index(s: &str, grapheme_index: usize) -> usize {
    s.grapheme_indices(true)
        .nth(grapheme_index)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn remove_grapheme(s: &mut String, grapheme_index: usize) {
    let start = byte_index(s, grapheme_index);
    let end = byte_index(s, grapheme_index + 1);
    s.drain(start..end);
}

pub fn run_line(evaluator: Evaluator<'static>) -> Result<()> {
    println!("hackcalc line mode");
    println!("Tab completes the last word, Esc clears, Ctrl+C or 'quit' exits.\n");

    let index = CompletionIndex::global();
    let mut stdout = stdout().into_raw_mode().context("terminal does not support raw mode")?;
    let stdin = stdin();
    let mut keys = stdin.keys();

    loop {
        write!(stdout, "\r{}{}", ClearLine, PROMPT)?;
        stdout.flush()?;

        let mut expression = String::new();
        let mut cursor_pos = 0; // in graphemes
        let (_, mut row) = stdout.cursor_pos()?;

        loop {
            let prefix: String = expression.graphemes(true).take(cursor_pos).collect();
            write!(
                stdout,
                "{}{}{}{}{}",
                Goto(1, row),
                ClearLine,
                PROMPT,
                expression,
                Goto((PROMPT.len() + prefix.width() + 1) as u16, row)
            )?;
            stdout.flush()?;

            let Some(key) = keys.next() else {
                return Ok(());
            };
            let len = expression.graphemes(true).count();
            match key? {
                Key::Char('\n') => break,
                Key::Ctrl('c') | Key::Ctrl('d') => {
                    write!(stdout, "\r\n")?;
                    return Ok(());
                }
                Key::Esc => {
                    expression.clear();
                    cursor_pos = 0;
                }
                Key::Char('\t') => match complete(&index, &expression) {
                    Completion::Nothing => {}
                    Completion::Replaced(line) => {
                        expression = line;
                        cursor_pos = expression.graphemes(true).count();
                    }
                    Completion::Candidates(names) => {
                        write!(stdout, "\r\n{}\r\n", names.join("  "))?;
                        row = stdout.cursor_pos()?.1;
                    }
                },
                Key::Char(c) => {
                    let byte_idx = byte_index(&expression, cursor_pos);
                    expression.insert(byte_idx, c);
                    cursor_pos = expression[..byte_idx + c.len_utf8()].graphemes(true).count();
                }
                Key::Backspace if cursor_pos > 0 => {
                    cursor_pos -= 1;
                    remove_grapheme(&mut expression, cursor_pos);
                }
                Key::Delete if cursor_pos < len => remove_grapheme(&mut expression, cursor_pos),
                Key::Left if cursor_pos > 0 => cursor_pos -= 1,
                Key::Right if cursor_pos < len => cursor_pos += 1,
                Key::Home => cursor_pos = 0,
                Key::End => cursor_pos = len,
                _ => {}
            }
        }

        let input = expression.trim();
        if input.is_empty() {
            write!(stdout, "\r\n")?;
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit") {
            write!(stdout, "\r\nGoodbye!\r\n")?;
            return Ok(());
        }

        write!(stdout, "\r\n")?;
        match evaluator.evaluate(input) {
            Ok(value) => {
                for (label, text) in format_value(value).rows() {
                    write!(stdout, "  {:<8}{}\r\n", label, text)?;
                }
            }
            Err(err) => write!(stdout, "  {}: {}\r\n", err.kind(), err)?,
        }
        write!(stdout, "\r\n")?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_completion() {
        let index = CompletionIndex::global();
        assert_eq!(complete(&index, "1 + sq"), Completion::Replaced("1 + sqrt".into()));
        assert_eq!(
            complete(&index, "log1"),
            Completion::Candidates(vec!["log10", "log1p"])
        );
        assert_eq!(complete(&index, "2 * "), Completion::Nothing);
        assert_eq!(complete(&index, "zz"), Completion::Nothing);
    }

    #[test]
    fn grapheme_removal() {
        let mut s = String::from("ae\u{301}b");
        remove_grapheme(&mut s, 1);
        assert_eq!(s, "ab");
        remove_grapheme(&mut s, 5);
        assert_eq!(s, "ab");
    }
}
