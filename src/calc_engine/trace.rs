pub struct Step {
    pub operation: String,
    pub result: f64,
}

/// Records each applied operation when detailed mode is on.
pub struct EvaluationTrace {
    pub steps: Vec<Step>,
    pub detailed_mode: bool,
}

impl EvaluationTrace {
    pub fn new(detailed_mode: bool) -> Self {
        EvaluationTrace {
            steps: Vec::new(),
            detailed_mode,
        }
    }

    /// A trace that records nothing.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn add_step(&mut self, operation: impl FnOnce() -> String, result: f64) {
        if self.detailed_mode {
            self.steps.push(Step { operation: operation(), result });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_records_in_detailed_mode() {
        let mut quiet = EvaluationTrace::disabled();
        quiet.add_step(|| "1 + 1".to_string(), 2.0);
        assert!(quiet.steps.is_empty());

        let mut detailed = EvaluationTrace::new(true);
        detailed.add_step(|| "1 + 1".to_string(), 2.0);
        assert_eq!(detailed.steps.len(), 1);
        assert_eq!(detailed.steps[0].operation, "1 + 1");
    }
}
