/// Operator input source.
///
/// The console frontend implements this over stdin; tests and unattended
/// runs use [`ScriptedOperator`]. Every read takes the session's cancel
/// token and gives up as soon as it fires.
use crate::cancel::CancelToken;
use std::collections::VecDeque;
use std::time::Duration;

pub trait Operator: Send {
    /// Blocking read of one answer.
    ///
    /// Returns `None` when input has ended or `cancel` fired.
    fn read_token(&mut self, cancel: &CancelToken) -> Option<String>;

    /// Read one answer, giving up after `timeout`.
    ///
    /// Timeout, end of input, and cancellation all return `None`.
    fn read_line_timeout(&mut self, timeout: Duration, cancel: &CancelToken) -> Option<String>;
}

/// Replays a fixed list of answers, then reports end of input.
#[derive(Debug, Default, Clone)]
pub struct ScriptedOperator {
    answers: VecDeque<String>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Operator for ScriptedOperator {
    fn read_token(&mut self, cancel: &CancelToken) -> Option<String> {
        if cancel.is_cancelled() {
            return None;
        }
        self.answers.pop_front()
    }

    fn read_line_timeout(&mut self, _timeout: Duration, cancel: &CancelToken) -> Option<String> {
        self.read_token(cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_come_back_in_order() {
        let cancel = CancelToken::new();
        let mut op = ScriptedOperator::new(["1", "H"]);
        assert_eq!(op.read_token(&cancel).as_deref(), Some("1"));
        assert_eq!(
            op.read_line_timeout(Duration::from_millis(5), &cancel).as_deref(),
            Some("H")
        );
        assert_eq!(op.read_token(&cancel), None);
    }

    #[test]
    fn cancelled_token_ends_input_without_consuming() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut op = ScriptedOperator::new(["1"]);
        assert_eq!(op.read_token(&cancel), None);
        assert_eq!(op.read_line_timeout(Duration::from_millis(5), &cancel), None);
        assert_eq!(op.remaining(), 1);
    }
}
