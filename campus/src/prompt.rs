//! Interactive yes/no confirmation.

use std::io::{BufRead, Write};

/// Something that can ask the user to confirm an action.
pub trait Confirm {
    /// Block until the user answers. `true` means go ahead.
    fn confirm(&self, question: &str) -> bool;
}

/// Asks on stdin, unless `--yes` was given.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt {
    assume_yes: bool,
}

impl StdinPrompt {
    pub const fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for StdinPrompt {
    fn confirm(&self, question: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{question} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Fixed answer, for tests.
#[cfg(test)]
pub struct FixedAnswer(pub bool);

#[cfg(test)]
impl Confirm for FixedAnswer {
    fn confirm(&self, _question: &str) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn assume_yes_skips_prompt() {
        assert!(StdinPrompt::new(true).confirm("Really?"));
    }
}
