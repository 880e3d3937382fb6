use serde::Serialize;

const SYSTEM_INSTRUCTION: &str = "You are an AI that debugs and optimizes code with explanations.";

/// Chat role of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The two-message prompt sent to the completion API: system instruction first,
/// then the user's code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: ChatMessage,
    pub user: ChatMessage,
}

impl Prompt {
    /// Messages in wire order.
    pub fn messages(&self) -> [&ChatMessage; 2] {
        [&self.system, &self.user]
    }
}

/// Build the debug prompt for a snippet. The code is embedded verbatim.
pub fn build_prompt(code: &str, language: &str) -> Prompt {
    Prompt {
        system: ChatMessage {
            role: Role::System,
            content: SYSTEM_INSTRUCTION.to_string(),
        },
        user: ChatMessage {
            role: Role::User,
            content: format!("Language: {language}\n\nDebug and optimize this code:\n{code}"),
        },
    }
}
