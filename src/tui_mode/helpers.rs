use hackcalc::SymbolTable;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec!["".to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.width();

        if word_width > width {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            let mut chunk = String::new();
            let mut chunk_width = 0;
            for c in word.chars() {
                let char_width = c.width().unwrap_or(1);
                if chunk_width + char_width > width {
                    lines.push(std::mem::take(&mut chunk));
                    chunk_width = 0;
                }
                chunk.push(c);
                chunk_width += char_width;
            }
            current_line = chunk;
            current_width = chunk_width;
            continue;
        }

        if current_width + word_width + 1 > width && !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
        }

        if !current_line.is_empty() {
            current_line.push(' ');
            current_width += 1;
        }

        current_line.push_str(word);
        current_width += word_width;
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

#[derive(Clone, Copy, PartialEq)]
enum Class {
    Word,
    Number,
    Other,
}

fn class_of(c: char, in_number: bool) -> Class {
    if c.is_ascii_digit() || (c == '.' && in_number) || (c == '_' && in_number) {
        Class::Number
    } else if c.is_ascii_alphabetic() && in_number {
        // Exponents and radix prefixes such as 1e5 or 0xff.
        Class::Number
    } else if c.is_ascii_alphabetic() {
        Class::Word
    } else if c == '.' {
        Class::Number
    } else {
        Class::Other
    }
}

/// Splits an expression into styled spans: known symbols, unknown names,
/// numbers and operators.
pub fn highlight_expression(expr: &str, base_style: Style) -> Vec<Span<'static>> {
    let symbol_style = Style::default()
        .fg(Color::LightBlue)
        .add_modifier(Modifier::BOLD);
    let unknown_style = Style::default().fg(Color::Red);
    let operator_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let number_style = Style::default().fg(Color::LightGreen);

    let symbols = SymbolTable::global();
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_class = Class::Other;

    let flush = |text: &mut String, class: Class, spans: &mut Vec<Span<'static>>| {
        if text.is_empty() {
            return;
        }
        let style = match class {
            Class::Word if symbols.has(&text.to_lowercase()) => symbol_style,
            Class::Word => unknown_style,
            Class::Number => number_style,
            Class::Other => base_style,
        };
        spans.push(Span::styled(std::mem::take(text), style));
    };

    for c in expr.chars() {
        let class = match (current_class, class_of(c, current_class == Class::Number)) {
            (Class::Word, Class::Number) if c.is_ascii_digit() => Class::Word,
            (_, class) => class,
        };
        if class != current_class {
            flush(&mut current, current_class, &mut spans);
            current_class = class;
        }
        if class == Class::Other {
            let style = if c.is_whitespace() || "()[],".contains(c) {
                base_style
            } else {
                operator_style
            };
            spans.push(Span::styled(c.to_string(), style));
        } else {
            current.push(c);
        }
    }
    flush(&mut current, current_class, &mut spans);

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(expr: &str) -> Vec<String> {
        highlight_expression(expr, Style::default())
            .into_iter()
            .map(|span| span.content.into_owned())
            .collect()
    }

    #[test]
    fn splits_names_numbers_and_operators() {
        assert_eq!(texts("log10(0x1f)+2"), vec!["log10", "(", "0x1f", ")", "+", "2"]);
        assert_eq!(texts("1e5 ** pi"), vec!["1e5", " ", "*", "*", " ", "pi"]);
    }

    #[test]
    fn unknown_names_are_marked() {
        let spans = highlight_expression("sqrt(foo)", Style::default());
        assert_eq!(spans[0].style.fg, Some(Color::LightBlue));
        assert_eq!(spans[2].style.fg, Some(Color::Red));
    }

    #[test]
    fn wraps_on_words_and_splits_long_ones() {
        assert_eq!(wrap_text("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap_text("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(wrap_text("x", 0), vec![""]);
        assert_eq!(wrap_text("ab cdefgh ij", 4), vec!["ab", "cdef", "gh", "ij"]);
    }
}
