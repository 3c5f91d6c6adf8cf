//! Wire types for the two supported chat APIs
//!
//! `MessagesRequest`/`MessagesResponse` follow the Anthropic Messages API
//! and double as the internal representation; the `ChatCompletion*` types
//! are converted to and from them for OpenAI-compatible providers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Vec<MessageContent>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: vec![MessageContent::Text { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
}

/// Join the text blocks of a message body
fn joined_text(content: &[MessageContent]) -> String {
    content
        .iter()
        .map(|block| match block {
            MessageContent::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub id: String,
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// Text of all content blocks, newline separated
    pub fn text(&self) -> String {
        joined_text(&self.content)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

// OpenAI-compatible chat completions (OpenAI, Gemini, gateways)

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl From<&MessagesRequest> for ChatCompletionRequest {
    /// The system prompt becomes a leading `system` message
    fn from(req: &MessagesRequest) -> Self {
        let system = req.system.iter().map(|text| ChatMessage {
            role: "system".to_string(),
            content: text.clone(),
        });
        let turns = req.messages.iter().map(|msg| ChatMessage {
            role: msg.role.clone(),
            content: joined_text(&msg.content),
        });

        Self {
            model: req.model.clone(),
            messages: system.chain(turns).collect(),
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl From<ChatCompletionResponse> for MessagesResponse {
    /// Only the first choice is kept; `stop` maps to `end_turn`
    fn from(resp: ChatCompletionResponse) -> Self {
        let (content, stop_reason) = match resp.choices.into_iter().next() {
            Some(choice) => (
                choice
                    .message
                    .content
                    .filter(|text| !text.is_empty())
                    .map(|text| vec![MessageContent::Text { text }])
                    .unwrap_or_default(),
                choice.finish_reason.map(|reason| {
                    if reason == "stop" {
                        "end_turn".to_string()
                    } else {
                        reason
                    }
                }),
            ),
            None => (Vec::new(), None),
        };

        Self {
            id: resp.id,
            content,
            model: resp.model,
            stop_reason,
            usage: resp.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        }
    }
}

pub struct MessagesRequestBuilder {
    request: MessagesRequest,
}

impl MessagesRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            request: MessagesRequest {
                model: model.into(),
                max_tokens: 1024,
                system: None,
                messages: Vec::new(),
                temperature: None,
            },
        }
    }

    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.request.system = Some(system.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u64) -> Self {
        self.request.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.request.temperature = Some(temperature);
        self
    }

    pub fn user(mut self, text: impl Into<String>) -> Self {
        self.request.messages.push(Message::user(text));
        self
    }

    pub fn build(self) -> MessagesRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_serialization() {
        let json = serde_json::to_value(Message::user("Where do you operate?")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "content": [{"type": "text", "text": "Where do you operate?"}]
            })
        );
    }

    #[test]
    fn test_builder_sets_fields() {
        let request = MessagesRequestBuilder::new("gpt-4o-mini")
            .system("be brief")
            .max_tokens(200)
            .temperature(0.2)
            .user("hi")
            .build();

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 200);
        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_chat_request_puts_system_first() {
        let request = MessagesRequestBuilder::new("m")
            .system("system prompt")
            .user("question")
            .build();

        let chat = ChatCompletionRequest::from(&request);
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.messages[1].role, "user");
        assert_eq!(chat.messages[1].content, "question");
    }

    #[test]
    fn test_chat_request_without_system() {
        let request = MessagesRequestBuilder::new("m").user("question").build();
        let json = serde_json::to_value(ChatCompletionRequest::from(&request)).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_chat_response_conversion() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Refunds take 5 days."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 40, "completion_tokens": 6, "total_tokens": 46}
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let response = MessagesResponse::from(parsed);

        assert_eq!(response.text(), "Refunds take 5 days.");
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(response.usage.unwrap().output_tokens, 6);
    }

    #[test]
    fn test_claude_response_parsing() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-latest",
            "content": [{"type": "text", "text": "Yes, we serve"}, {"type": "text", "text": "all airports."}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 5}
        }"#;

        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.text(), "Yes, we serve\nall airports.");
    }

    #[test]
    fn test_empty_choices_yield_no_text() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(MessagesResponse::from(parsed).text().is_empty());
    }
}
