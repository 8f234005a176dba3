//! Prefix completion over the symbol table.

use crate::symbols::SymbolTable;
use tracing::trace;

pub struct CompletionIndex<'t> {
    symbols: &'t SymbolTable,
}

impl CompletionIndex<'static> {
    pub fn global() -> Self {
        CompletionIndex::new(SymbolTable::global())
    }
}

impl<'t> CompletionIndex<'t> {
    pub fn new(symbols: &'t SymbolTable) -> Self {
        CompletionIndex { symbols }
    }

    /// Every symbol name starting with `prefix`, in definition order.
    /// An empty prefix suggests nothing.
    pub fn suggest(&self, prefix: &str) -> Vec<&'static str> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let prefix = prefix.to_lowercase();
        let matches: Vec<&'static str> = self
            .symbols
            .iter()
            .map(|symbol| symbol.name)
            .filter(|name| name.starts_with(prefix.as_str()))
            .collect();
        trace!(prefix = %prefix, count = matches.len(), "completions");
        matches
    }
}

pub fn completions(prefix: &str) -> Vec<&'static str> {
    CompletionIndex::global().suggest(prefix)
}

/// The rightmost run of ASCII letters and digits at the very end of `text`.
pub fn trailing_word(text: &str) -> Option<&str> {
    let start = text
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric())
        .last()
        .map(|(i, _)| i)?;
    Some(&text[start..])
}

/// Replaces the trailing `word` of `text` with `candidate`.
pub fn apply_completion(text: &str, word: &str, candidate: &str) -> String {
    let head = match text.rfind(word) {
        Some(at) if !word.is_empty() => &text[..at],
        _ => text,
    };
    format!("{}{}", head, candidate)
}
