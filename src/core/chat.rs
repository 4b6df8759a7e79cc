//! Chat session with a bounded transcript

use std::collections::VecDeque;
use tracing::{debug, warn};

use crate::core::client::ChatClient;
use crate::core::errors::Result;
use crate::core::models::ChatMessage;

/// Maximum number of turns kept in the transcript
pub const MAX_HISTORY: usize = 20;

/// Sampling temperature for free-form chat
pub const CHAT_TEMPERATURE: f32 = 0.7;

/// System preamble sent ahead of every transcript
pub const CHAT_PREAMBLE: &str = "You are a helpful assistant inside a document translation tool. Answer questions about translation, terminology, grammar, and wording clearly and concisely. When asked to translate, return the translation first and keep explanations short.";

/// In-memory chat transcript bound to a client
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: ChatClient,
    model: String,
    history: VecDeque<ChatMessage>,
}

impl ChatSession {
    pub fn new(client: ChatClient) -> Self {
        let model = client.default_model().to_string();
        Self {
            client,
            model,
            history: VecDeque::with_capacity(MAX_HISTORY + 1),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Send a user message and return the assistant's reply.
    ///
    /// On failure the user turn is dropped from the transcript again.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        self.history.push_back(ChatMessage::user(message));

        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.push(ChatMessage::system(CHAT_PREAMBLE));
        messages.extend(self.history.iter().cloned());

        match self
            .client
            .complete(&self.model, &messages, CHAT_TEMPERATURE)
            .await
        {
            Ok(completion) => {
                self.history
                    .push_back(ChatMessage::assistant(completion.content.clone()));
                self.trim();
                debug!("Chat transcript holds {} turns", self.history.len());
                Ok(completion.content)
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                self.history.pop_back();
                Err(e)
            }
        }
    }

    /// Drop the whole transcript
    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn trim(&mut self) {
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::TranslatorConfig;
    use crate::core::models::Role;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn session(server: &MockServer) -> ChatSession {
        let client = ChatClient::new(TranslatorConfig {
            api_key: "sk-test".to_string(),
            api_endpoint: server.uri(),
            ..Default::default()
        })
        .unwrap();
        ChatSession::new(client)
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Sure."}}]
            })))
            .mount(&server)
            .await;

        let mut chat = session(&server).await;
        for i in 0..15 {
            let reply = chat.send(&format!("question {}", i)).await.unwrap();
            assert_eq!(reply, "Sure.");
            assert!(chat.len() <= MAX_HISTORY);
        }
        assert_eq!(chat.len(), MAX_HISTORY);

        let first = chat.history().next().unwrap();
        assert_eq!(first.role, Role::User);
        assert_eq!(first.content, "question 5");

        let requests = server.received_requests().await.unwrap();
        let last: serde_json::Value = requests.last().unwrap().body_json().unwrap();
        let messages = last["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "system");
        // preamble + 20 kept turns + the new question
        assert_eq!(messages.len(), MAX_HISTORY + 2);

        chat.clear();
        assert!(chat.is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_is_rolled_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut chat = session(&server).await;
        assert!(chat.send("hello?").await.is_err());
        assert!(chat.is_empty());
    }
}
