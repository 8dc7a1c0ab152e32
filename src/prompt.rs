// ❓ Confirmation Prompt
// Yes/no gate for backlog catch-up

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Asks the user a yes/no question. Anything but an affirmative answer is "no".
pub trait ConfirmPrompt {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Affirmative tokens, compared case-insensitively after trimming
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

// ============================================================================
// TERMINAL PROMPT
// ============================================================================

/// Blocking prompt on stdin/stdout. EOF or a read error counts as "no".
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        TerminalPrompt {
            input: io::stdin().lock(),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalPrompt { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmPrompt for TerminalPrompt<R, W> {
    fn confirm(&mut self, question: &str) -> bool {
        if write!(self.output, "\t{} (y/n) ", question)
            .and_then(|_| self.output.flush())
            .is_err()
        {
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&answer),
        }
    }
}

// ============================================================================
// SCRIPTED PROMPT
// ============================================================================

/// Answers from a fixed script; answers "no" once the script runs out.
/// Used for `--yes` runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    repeat: Option<bool>,
    asked: usize,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompt {
            answers: answers.into_iter().map(Into::into).collect(),
            repeat: None,
            asked: 0,
        }
    }

    /// Always give the same answer
    pub fn always(answer: bool) -> Self {
        ScriptedPrompt {
            answers: VecDeque::new(),
            repeat: Some(answer),
            asked: 0,
        }
    }

    /// How many times `confirm` was called
    pub fn asked(&self) -> usize {
        self.asked
    }
}

impl ConfirmPrompt for ScriptedPrompt {
    fn confirm(&mut self, _question: &str) -> bool {
        self.asked += 1;
        if let Some(answer) = self.repeat {
            return answer;
        }
        self.answers
            .pop_front()
            .map(|a| is_affirmative(&a))
            .unwrap_or(false)
    }
}
