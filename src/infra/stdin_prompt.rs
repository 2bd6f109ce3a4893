use std::io::{self, BufRead, Write};
use tracing::info;

use crate::app::ports::ContinuePromptPort;

/// `y`, `yes` and `o` (oui) continue; anything else stops.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "o")
}

/// Reads the answer from standard input. End of input counts as "no".
pub struct StdinPrompt;

impl ContinuePromptPort for StdinPrompt {
    fn confirm_continue(&mut self, failed_phase: &str) -> bool {
        print!("\nContinue despite the failure of '{}'? (y/n): ", failed_phase);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_affirmative(&line),
        }
    }
}

/// Always answers "no", for unattended runs.
pub struct NonInteractivePrompt;

impl ContinuePromptPort for NonInteractivePrompt {
    fn confirm_continue(&mut self, failed_phase: &str) -> bool {
        info!("Non-interactive run: stopping after failure of '{}'", failed_phase);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_continues() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES\n"));
        assert!(is_affirmative("o"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("oui"));
    }

    #[test]
    fn non_interactive_prompt_declines() {
        assert!(!NonInteractivePrompt.confirm_continue("relational"));
    }
}
