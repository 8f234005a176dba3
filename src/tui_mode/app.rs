use hackcalc::calc_engine::{EvaluationTrace, Step};
use hackcalc::completion::{apply_completion, trailing_word, CompletionIndex};
use hackcalc::{format_outcome, EvalError, Evaluator, FormattedResult};
use unicode_segmentation::UnicodeSegmentation;

pub struct App {
    evaluator: Evaluator<'static>,
    completions: CompletionIndex<'static>,
    pub input: String,
    /// Cursor position, counted in grapheme clusters.
    pub cursor_position: usize,
    pub input_scroll: usize,
    pub outcome: Option<Result<f64, EvalError>>,
    pub formatted: Option<FormattedResult>,
    pub steps: Vec<Step>,
    pub suggestions: Vec<&'static str>,
    pub selected_suggestion: Option<usize>,
    pub show_steps: bool,
    pub should_quit: bool,
    pub show_help: bool,
    pub help_scroll: usize,
    pub terminal_too_small: bool,
}

impl App {
    pub fn new(evaluator: Evaluator<'static>) -> Self {
        App {
            evaluator,
            completions: CompletionIndex::global(),
            input: String::new(),
            cursor_position: 0,
            input_scroll: 0,
            outcome: None,
            formatted: None,
            steps: Vec::new(),
            suggestions: Vec::new(),
            selected_suggestion: None,
            show_steps: false,
            should_quit: false,
            show_help: false,
            help_scroll: 0,
            terminal_too_small: false,
        }
    }

    fn grapheme_count(&self) -> usize {
        self.input.graphemes(true).count()
    }

    fn byte_index(&self, grapheme_index: usize) -> usize {
        self.input
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn adjust_input_scroll(&mut self, visible_width: usize) {
        let total = self.grapheme_count();
        let cursor_pos = self.cursor_position;

        if cursor_pos < self.input_scroll {
            self.input_scroll = cursor_pos;
        } else if cursor_pos >= self.input_scroll + visible_width {
            self.input_scroll = cursor_pos - visible_width + 1;
        }

        if self.input_scroll > total.saturating_sub(visible_width) {
            self.input_scroll = total.saturating_sub(visible_width);
        }
    }

    /// Re-evaluates the whole input and recomputes suggestions.
    pub fn refresh(&mut self) {
        self.suggestions = trailing_word(&self.input)
            .map(|word| self.completions.suggest(word))
            .unwrap_or_default();
        self.selected_suggestion = None;

        if self.input.trim().is_empty() {
            self.outcome = None;
            self.formatted = None;
            self.steps.clear();
            return;
        }

        let mut trace = EvaluationTrace::new(true);
        let outcome = self.evaluator.evaluate_traced(&self.input, &mut trace);
        self.formatted = format_outcome(&outcome);
        self.outcome = Some(outcome);
        self.steps = trace.steps;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.byte_index(self.cursor_position);
        self.input.insert(byte_idx, c);
        // A combining mark joins the previous cluster instead of adding one.
        let before = self.input[..byte_idx + c.len_utf8()].graphemes(true).count();
        self.cursor_position = before;
        self.refresh();
    }

    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            self.delete();
        }
    }

    pub fn delete(&mut self) {
        let start = self.byte_index(self.cursor_position);
        let end = self.byte_index(self.cursor_position + 1);
        if start < end {
            self.input.drain(start..end);
            self.refresh();
        }
    }

    pub fn move_cursor(&mut self, direction: i32) {
        match direction {
            -1 => self.cursor_position = self.cursor_position.saturating_sub(1),
            1 => self.cursor_position = (self.cursor_position + 1).min(self.grapheme_count()),
            _ => {}
        }
    }

    pub fn move_cursor_by_words(&mut self, direction: i32) {
        let graphemes: Vec<&str> = self.input.graphemes(true).collect();
        let blank = |g: &str| g.chars().all(char::is_whitespace);
        let mut pos = self.cursor_position;

        if direction < 0 {
            while pos > 0 && blank(graphemes[pos - 1]) {
                pos -= 1;
            }
            while pos > 0 && !blank(graphemes[pos - 1]) {
                pos -= 1;
            }
        } else {
            let len = graphemes.len();
            while pos < len && !blank(graphemes[pos]) {
                pos += 1;
            }
            while pos < len && blank(graphemes[pos]) {
                pos += 1;
            }
        }
        self.cursor_position = pos;
    }

    pub fn move_to_start(&mut self) {
        self.cursor_position = 0;
        self.input_scroll = 0;
    }

    pub fn move_to_end(&mut self) {
        self.cursor_position = self.grapheme_count();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
        self.input_scroll = 0;
        self.refresh();
    }

    pub fn cycle_suggestion(&mut self, direction: i32) {
        let count = self.suggestions.len();
        if count == 0 {
            return;
        }
        self.selected_suggestion = Some(match (self.selected_suggestion, direction < 0) {
            (None, false) => 0,
            (None, true) => count - 1,
            (Some(i), false) => (i + 1) % count,
            (Some(i), true) => (i + count - 1) % count,
        });
    }

    /// Replaces the trailing word with the highlighted suggestion, or the
    /// first one when none is highlighted. Returns false if there was nothing
    /// to accept.
    pub fn accept_suggestion(&mut self) -> bool {
        let index = self.selected_suggestion.unwrap_or(0);
        let (Some(&candidate), Some(word)) =
            (self.suggestions.get(index), trailing_word(&self.input))
        else {
            return false;
        };
        self.input = apply_completion(&self.input, word, candidate);
        self.move_to_end();
        self.refresh();
        true
    }

    pub fn toggle_steps(&mut self) {
        self.show_steps = !self.show_steps;
    }

    pub fn open_help(&mut self) {
        self.show_help = true;
        self.help_scroll = 0;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
        self.help_scroll = 0;
    }
}
