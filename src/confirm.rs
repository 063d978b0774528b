//! Confirmation gate for destructive actions.

/// What the user is asked to confirm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub message: String,
    pub confirm_text: String,
}

/// Asks the user; resolves true only on explicit confirmation.
#[async_trait::async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Answers every prompt the same way (`--yes`, tests).
#[derive(Clone, Copy, Debug)]
pub struct FixedAnswer(pub bool);

#[async_trait::async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.0
    }
}
