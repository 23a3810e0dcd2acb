//! Context assembly: turning thread history plus a new message into the
//! single prompt string sent to the model.

use colloquy_types::chat::ChatTurn;

/// Builds the generation prompt from a system preamble, prior turns, and
/// the new user message.
///
/// Prompts grow linearly with history, so the assembler keeps only the
/// most recent `max_history_turns` turns (`None` keeps everything). No
/// token-level budgeting is attempted.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    system_prompt: String,
    max_history_turns: Option<usize>,
}

impl ContextAssembler {
    pub fn new(system_prompt: impl Into<String>, max_history_turns: Option<usize>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_history_turns,
        }
    }

    /// Assemble the prompt: system preamble, then each retained prior turn
    /// as a `User:`/`Assistant:` pair in creation order, then the new user
    /// turn with an open assistant continuation marker.
    pub fn build(&self, prior_turns: &[ChatTurn], new_user_text: &str) -> String {
        let skip = self
            .max_history_turns
            .map_or(0, |max| prior_turns.len().saturating_sub(max));

        let mut prompt = format!("{}\n\n", self.system_prompt);
        for turn in &prior_turns[skip..] {
            prompt.push_str(&format!(
                "User: {}\nAssistant: {}\n\n",
                turn.user_text, turn.model_text
            ));
        }
        prompt.push_str(&format!("User: {new_user_text}\n\nAssistant:"));
        prompt
    }
}
