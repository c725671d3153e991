use harvester_engine::{PromptError, SelectionPrompt};
use inquire::{Confirm, MultiSelect};

const SELECT_HELP: &str = "  ↑↓ navigate  space select  → all  enter confirm  type to filter  esc skip";

/// Terminal prompts. Skipping a selection selects nothing; skipping a
/// confirmation answers "no".
pub(crate) struct InquirePrompt {
    page_size: usize,
}

impl InquirePrompt {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }
}

impl SelectionPrompt for InquirePrompt {
    fn select(&self, message: &str, choices: &[String]) -> Result<Vec<String>, PromptError> {
        if choices.is_empty() {
            return Ok(Vec::new());
        }
        println!();
        let selection = MultiSelect::new(message, choices.to_vec())
            .with_page_size(self.page_size)
            .with_help_message(SELECT_HELP)
            .prompt_skippable()
            .map_err(|err| PromptError(err.to_string()))?;
        Ok(selection.unwrap_or_default())
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        let answer = Confirm::new(message)
            .with_default(default)
            .prompt_skippable()
            .map_err(|err| PromptError(err.to_string()))?;
        Ok(answer.unwrap_or(false))
    }
}
