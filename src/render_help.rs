use crate::tui_mode::app::App;
use hackcalc::symbols::SymbolTable;
use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn heading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
    ))
}

/// Names of the table, packed into lines of at most `width` characters.
fn symbol_lines(names: &[&str], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current = String::from(" ");
    for name in names {
        if current.len() + name.len() + 1 > width && current.len() > 1 {
            lines.push(Line::from(std::mem::replace(&mut current, String::from(" "))));
        }
        current.push(' ');
        current.push_str(name);
    }
    if current.len() > 1 {
        lines.push(Line::from(current));
    }
    lines
}

pub fn render_help(frame: &mut Frame, app: &mut App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" hackcalc Help ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));

    let table = SymbolTable::global();
    let constants: Vec<&str> = table.iter().filter(|s| s.is_constant()).map(|s| s.name).collect();
    let functions: Vec<&str> = table.iter().filter(|s| !s.is_constant()).map(|s| s.name).collect();
    let width = frame.size().width.saturating_sub(4) as usize;

    let mut help_text = vec![
        Line::from(Span::styled(
            "hackcalc - restricted expression calculator",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Operators (loosest to tightest):"),
        Line::from("  |   ^   &         bitwise or, xor, and (64-bit integers)"),
        Line::from("  <<  >>            shifts"),
        Line::from("  +   -             addition, subtraction"),
        Line::from("  *   /   //  %     multiply, divide, floor divide, modulo"),
        Line::from("  -x  +x  ~x        negate, identity, bitwise not"),
        Line::from("  **                power, right-associative (2 ** 3 ** 2 = 512)"),
        Line::from("  f(a, b)  [a, b]  (a, b)  s[i]   calls, sequences, indexing"),
        Line::from(""),
        heading("Literals:"),
        Line::from("  42  1_000  3.5  .5  1e-3  0xff  0o17  0b1010"),
        Line::from(""),
        heading("Constants:"),
    ];
    help_text.extend(symbol_lines(&constants, width));
    help_text.push(Line::from(""));
    help_text.push(heading("Functions:"));
    help_text.extend(symbol_lines(&functions, width));
    help_text.extend([
        Line::from(""),
        heading("Results:"),
        Line::from("  Integral results show decimal, hex and binary; hex and binary"),
        Line::from("  use the low 64 bits, so -1 shows as 0xffffffffffffffff."),
        Line::from("  Other results show decimal only. Errors hide all three."),
        Line::from(""),
        heading("Keys:"),
        Line::from("  Tab / Shift+Tab : Move through suggestions"),
        Line::from("  Enter           : Accept the highlighted suggestion"),
        Line::from("  Esc             : Clear the expression (closes this screen)"),
        Line::from("  ← → Home End    : Move the cursor"),
        Line::from("  Ctrl+← / Ctrl+→ : Move by words"),
        Line::from("  F2              : Show or hide evaluation steps"),
        Line::from("  F1              : This screen"),
        Line::from("  Ctrl+C / Ctrl+Q : Quit"),
        Line::from(""),
        heading("Examples:"),
        Line::from("  sqrt(2) ** 2"),
        Line::from("  0xdead_beef >> 16 & 0xff"),
        Line::from("  fsum([0.1, 0.2, 0.3])"),
        Line::from("  frexp(8)[1]"),
        Line::from("  comb(52, 5)"),
    ]);

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false })
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(Clear, frame.size());
    frame.render_widget(paragraph, frame.size());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_packed_to_width() {
        let lines = symbol_lines(&["sin", "cos", "tan", "exp"], 10);
        let texts: Vec<String> = lines.iter().map(|l| l.spans[0].content.to_string()).collect();
        assert_eq!(texts, vec!["  sin cos", "  tan exp"]);
    }
}
