//! Messages, roles and content parts of a conversation transcript.
//!
//! The wire shape mirrors the common provider schema: a message is a role
//! plus either a plain string or an ordered list of typed parts.
//!
//! ```json
//! { "role": "assistant",
//!   "content": [{ "type": "tool-call", "toolCallId": "abc", "toolName": "getData", "args": "{}" }] }
//! ```

use serde::{Deserialize, Serialize};

use crate::compression::CompressionError;

/// The author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message body: either plain text or a sequence of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<Part>),
}

/// A single typed piece of message content.
///
/// `ToolCall` parts are only meaningful inside [`Role::Assistant`] messages and
/// `ToolResult` parts only inside [`Role::Tool`] messages. A part carrying an
/// empty call identifier is kept as data but never takes part in exchange
/// pairing or repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Part {
    Text {
        text: String,
    },
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        /// Serialized argument payload, usually JSON.
        args: String,
    },
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        result: serde_json::Value,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Build a tool call part, rejecting an empty call id or tool name.
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        args: impl Into<String>,
    ) -> Result<Self, CompressionError> {
        let (tool_call_id, tool_name) = check_exchange_fields("tool-call", id.into(), name.into())?;
        Ok(Part::ToolCall {
            tool_call_id,
            tool_name,
            args: args.into(),
        })
    }

    /// Build a tool result part, rejecting an empty call id or tool name.
    pub fn tool_result(
        id: impl Into<String>,
        name: impl Into<String>,
        result: serde_json::Value,
    ) -> Result<Self, CompressionError> {
        let (tool_call_id, tool_name) =
            check_exchange_fields("tool-result", id.into(), name.into())?;
        Ok(Part::ToolResult {
            tool_call_id,
            tool_name,
            result,
        })
    }
}

fn check_exchange_fields(
    kind: &str,
    id: String,
    name: String,
) -> Result<(String, String), CompressionError> {
    if id.is_empty() {
        return Err(CompressionError::InvalidStructure(format!(
            "{kind} part is missing a call identifier"
        )));
    }
    if name.is_empty() {
        return Err(CompressionError::InvalidStructure(format!(
            "{kind} part `{id}` is missing a tool name"
        )));
    }
    Ok((id, name))
}

/// A single conversation message. Its identity is its position in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Content,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Content::Text(content.into()),
        }
    }

    pub fn with_parts(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            content: Content::Parts(parts),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }

    fn parts(&self) -> &[Part] {
        match &self.content {
            Content::Parts(parts) => parts,
            Content::Text(_) => &[],
        }
    }

    /// Call identifiers opened by this message.
    ///
    /// Empty for anything other than an assistant message with part content.
    pub fn tool_call_ids(&self) -> impl Iterator<Item = &str> {
        let parts = match self.role {
            Role::Assistant => self.parts(),
            _ => &[],
        };
        parts.iter().filter_map(|part| match part {
            Part::ToolCall { tool_call_id, .. } if !tool_call_id.is_empty() => {
                Some(tool_call_id.as_str())
            }
            _ => None,
        })
    }

    /// Call identifiers answered by this message.
    ///
    /// Empty for anything other than a tool message with part content.
    pub fn tool_result_ids(&self) -> impl Iterator<Item = &str> {
        let parts = match self.role {
            Role::Tool => self.parts(),
            _ => &[],
        };
        parts.iter().filter_map(|part| match part {
            Part::ToolResult { tool_call_id, .. } if !tool_call_id.is_empty() => {
                Some(tool_call_id.as_str())
            }
            _ => None,
        })
    }
}
