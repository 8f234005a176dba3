use super::app::App;
use super::helpers::{highlight_expression, wrap_text};
use crate::render_help::render_help;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use hackcalc::format::repr;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

const MIN_TERMINAL_WIDTH: u16 = 50;
const MIN_TERMINAL_HEIGHT: u16 = 12;
const SUGGESTIONS_WIDTH: u16 = 18;

pub fn run_ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            if app.show_help {
                render_help(f, app);
            } else {
                ui(f, app);
            }
        })?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(Duration::from_millis(50))? {
            match crossterm::event::read()? {
                Event::Key(KeyEvent { code, modifiers, kind, .. }) if kind == KeyEventKind::Press => {
                    handle_key_event(app, code, modifiers);
                }
                Event::Mouse(event) if app.show_help => match event.kind {
                    MouseEventKind::ScrollDown => app.help_scroll = app.help_scroll.saturating_add(3),
                    MouseEventKind::ScrollUp => app.help_scroll = app.help_scroll.saturating_sub(3),
                    _ => {}
                },
                _ => {}
            }
        }
    }
    Ok(())
}

fn handle_key_event(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL)
        && matches!(code, KeyCode::Char('c') | KeyCode::Char('q'))
    {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        match code {
            KeyCode::Down => app.help_scroll = app.help_scroll.saturating_add(1),
            KeyCode::Up => app.help_scroll = app.help_scroll.saturating_sub(1),
            KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(10),
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(10),
            KeyCode::Esc | KeyCode::F(1) => app.close_help(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => app.insert_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left if modifiers.contains(KeyModifiers::CONTROL) => app.move_cursor_by_words(-1),
        KeyCode::Right if modifiers.contains(KeyModifiers::CONTROL) => app.move_cursor_by_words(1),
        KeyCode::Left => app.move_cursor(-1),
        KeyCode::Right => app.move_cursor(1),
        KeyCode::Home => app.move_to_start(),
        KeyCode::End => app.move_to_end(),
        KeyCode::Tab | KeyCode::Down => app.cycle_suggestion(1),
        KeyCode::BackTab | KeyCode::Up => app.cycle_suggestion(-1),
        KeyCode::Enter => {
            app.accept_suggestion();
        }
        KeyCode::Esc => app.clear_input(),
        KeyCode::F(1) => app.open_help(),
        KeyCode::F(2) => app.toggle_steps(),
        _ => {}
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let terminal_size = frame.size();

    app.terminal_too_small = terminal_size.width < MIN_TERMINAL_WIDTH
        || terminal_size.height < MIN_TERMINAL_HEIGHT;

    if app.terminal_too_small {
        render_resize_message(frame, terminal_size);
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(terminal_size);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(SUGGESTIONS_WIDTH), Constraint::Min(20)])
        .split(layout[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if app.show_steps {
            vec![Constraint::Length(5), Constraint::Min(3)]
        } else {
            vec![Constraint::Min(5)]
        })
        .split(body[1]);

    render_input(frame, app, layout[0]);
    render_suggestions(frame, app, body[0]);
    render_results(frame, app, right[0]);
    if app.show_steps {
        render_steps(frame, app, right[1]);
    }
    render_status(frame, layout[2]);
}

fn render_resize_message(frame: &mut Frame, area: Rect) {
    let message = format!(
        "Terminal too small! Min size: {}x{}. Current: {}x{}",
        MIN_TERMINAL_WIDTH, MIN_TERMINAL_HEIGHT, area.width, area.height
    );

    let text = vec![
        Line::from(Span::styled(
            message,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Please resize your terminal window",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Resize Required ")
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn panel(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", title))
        .title_alignment(Alignment::Center)
}

fn render_suggestions(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .suggestions
        .iter()
        .map(|name| ListItem::new(Line::from(Span::styled(*name, Style::default().fg(Color::Cyan)))))
        .collect();

    let list = List::new(items)
        .block(panel("Suggestions"))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(app.selected_suggestion);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let label_style = Style::default().fg(Color::Gray);
    let value_style = Style::default()
        .fg(Color::LightMagenta)
        .add_modifier(Modifier::BOLD);

    let lines: Vec<Line> = match (&app.formatted, &app.outcome) {
        (Some(formatted), _) => formatted
            .rows()
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!("{:<8}", label), label_style),
                    Span::styled(value.to_string(), value_style),
                ])
            })
            .collect(),
        (None, Some(Err(err))) => vec![Line::from(Span::styled(
            format!("{}: {}", err.kind(), err),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))],
        _ => vec![Line::from(Span::styled(
            "Type an expression; results update as you type.",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(panel("Result"))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_steps(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel("Steps");
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    if app.steps.is_empty() {
        let empty_msg = Paragraph::new("No steps to show.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(empty_msg, inner_area);
        return;
    }

    let wrap_width = inner_area.width.saturating_sub(6) as usize;
    let mut items = Vec::new();
    for (i, step) in app.steps.iter().enumerate() {
        let step_text = format!("{}: {} = {}", i + 1, step.operation, repr(step.result));
        for (line_idx, line) in wrap_text(&step_text, wrap_width).into_iter().enumerate() {
            let prefix = if line_idx == 0 { " - " } else { "   " };
            items.push(ListItem::new(Line::from(Span::styled(
                format!("{}{}", prefix, line),
                Style::default().fg(Color::DarkGray),
            ))));
        }
    }

    // Keep the final steps visible when the list overflows.
    let offset = items.len().saturating_sub(inner_area.height as usize);
    let mut state = ListState::default().with_offset(offset);
    frame.render_stateful_widget(List::new(items), inner_area, &mut state);
}

fn render_status(frame: &mut Frame, area: Rect) {
    let keys = [
        ("Tab/S-Tab", "Suggest"),
        ("Enter", "Accept"),
        ("Esc", "Clear"),
        ("F1", "Help"),
        ("F2", "Steps"),
        ("^Q", "Quit"),
    ];

    let spans: Vec<Span> = keys
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    *key,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {} ", desc), Style::default().fg(Color::DarkGray)),
            ]
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = panel("Expression");
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let visible_width = inner_area.width.saturating_sub(2) as usize;
    let total = app.input.graphemes(true).count();
    app.adjust_input_scroll(visible_width);

    let visible_input: String = app
        .input
        .graphemes(true)
        .skip(app.input_scroll)
        .take(visible_width)
        .collect();

    let mut spans = vec![Span::styled("> ", Style::default().fg(Color::Green))];
    spans.extend(highlight_expression(&visible_input, Style::default().fg(Color::Cyan)));
    frame.render_widget(Paragraph::new(Line::from(spans)), inner_area);

    let visible_cursor = app.cursor_position.saturating_sub(app.input_scroll);
    let visible_prefix: String = visible_input.graphemes(true).take(visible_cursor).collect();
    let cursor_x = inner_area.x + 2 + visible_prefix.width() as u16;
    frame.set_cursor(cursor_x, inner_area.y);

    let scroll_indicator_style = Style::default().fg(Color::DarkGray);

    if app.input_scroll > 0 {
        let left_indicator = Paragraph::new("<").style(scroll_indicator_style);
        frame.render_widget(left_indicator, Rect::new(inner_area.x, inner_area.y, 1, 1));
    }

    if total > app.input_scroll + visible_width {
        let right_indicator = Paragraph::new(">").style(scroll_indicator_style);
        frame.render_widget(
            right_indicator,
            Rect::new(inner_area.x + inner_area.width - 1, inner_area.y, 1, 1),
        );
    }
}
