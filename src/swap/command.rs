//! Swap command parsing
//!
//! The command text must hold exactly two whitespace-separated responder
//! names, e.g. `엔도 로쿤`.

use std::fmt;

/// Usage line returned for malformed commands
pub const USAGE: &str = "사용법: /온콜바꿔 [멤버1] [멤버2]\n예: /온콜바꿔 엔도 로쿤";

/// Errors for malformed inbound commands
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Wrong number of names
    #[error("Expected exactly two responder names, got {token_count}")]
    Usage { token_count: usize },

    /// Both names are the same responder
    #[error("Cannot swap '{0}' with themselves")]
    SameResponder(String),

    /// Slash command arrived without a delivery address
    #[error("Command is missing response_url")]
    MissingResponseUrl,
}

impl CommandError {
    /// Message shown to the caller
    pub fn korean_desc(&self) -> String {
        match self {
            Self::Usage { .. } => USAGE.to_string(),
            Self::SameResponder(name) => {
                format!("'{}' 본인과는 일정을 바꿀 수 없습니다.\n{}", name, USAGE)
            }
            Self::MissingResponseUrl => "응답 주소(response_url)가 없는 요청입니다.".to_string(),
        }
    }
}

/// A parsed swap request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCommand {
    pub first: String,
    pub second: String,
}

impl SwapCommand {
    /// Parse command text into two distinct names
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        let [first, second] = tokens.as_slice() else {
            return Err(CommandError::Usage {
                token_count: tokens.len(),
            });
        };

        if first == second {
            return Err(CommandError::SameResponder(first.to_string()));
        }

        Ok(Self {
            first: first.to_string(),
            second: second.to_string(),
        })
    }
}

impl fmt::Display for SwapCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.first, self.second)
    }
}
