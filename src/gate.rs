//! The confirmation gate
//!
//! A single shared static secret stands in front of every mutating action
//! (save, save-as, delete). There is no rate limiting, no lockout and no
//! per-user distinction; the gate deters casual misuse of a publicly
//! reachable library, it is not a defense against a motivated adversary.

/// Checks attempts against the configured shared secret.
#[derive(Debug, Clone)]
pub struct ConfirmationGate {
    secret: String,
}

impl ConfirmationGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, attempt: &str) -> bool {
        attempt == self.secret
    }
}

/// Input state for the secret entry prompt. Mismatches set `error`, which
/// clears on the next keystroke so the user can retry; the staged intent is
/// left untouched by a failure.
#[derive(Debug, Clone, Default)]
pub struct SecretPrompt {
    pub input: String,
    pub error: bool,
}

impl SecretPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_char(&mut self, ch: char) {
        self.input.push(ch);
        self.error = false;
    }

    pub fn backspace(&mut self) {
        self.input.pop();
        self.error = false;
    }

    /// Check the current input against the gate. On mismatch the error flag
    /// is raised and the input cleared for another try.
    pub fn submit(&mut self, gate: &ConfirmationGate) -> bool {
        if gate.verify(&self.input) {
            true
        } else {
            self.error = true;
            self.input.clear();
            false
        }
    }

    /// Masked rendering of the current input.
    pub fn masked(&self) -> String {
        "*".repeat(self.input.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_matches_exact_secret() {
        let gate = ConfirmationGate::new("right");
        assert!(gate.verify("right"));
        assert!(!gate.verify("wrong"));
        assert!(!gate.verify(""));
    }

    #[test]
    fn mismatch_sets_error_and_allows_retry() {
        let gate = ConfirmationGate::new("right");
        let mut prompt = SecretPrompt::new();
        for ch in "wrong".chars() {
            prompt.insert_char(ch);
        }
        assert!(!prompt.submit(&gate));
        assert!(prompt.error);
        assert!(prompt.input.is_empty());

        for ch in "right".chars() {
            prompt.insert_char(ch);
        }
        assert!(!prompt.error, "typing clears the error flag");
        assert!(prompt.submit(&gate));
    }

    #[test]
    fn masked_hides_content() {
        let mut prompt = SecretPrompt::new();
        for ch in "абв".chars() {
            prompt.insert_char(ch);
        }
        assert_eq!(prompt.masked(), "***");
    }
}
