//! Completion relay: drives one streaming completion and fans it out.
//!
//! For every fragment the backend produces, the relay forwards it to the
//! live client's sink immediately (preserving emission order, never
//! reordering, merging, or dropping) and appends it to an accumulation
//! buffer. When the stream completes, the buffer becomes one assistant
//! `Message` returned to the pipeline for persistence.
//!
//! Failure handling:
//! - backend error mid-stream: the buffer is discarded, no partial reply
//!   is synthesized; fragments already delivered stay visible to the
//!   client (no retraction signal exists on the wire).
//! - sink closed (client disconnect): the backend stream is dropped,
//!   which cancels the underlying call, and `ChatError::Canceled` is
//!   returned.

use futures_util::StreamExt;

use chatrelay_types::error::ChatError;
use chatrelay_types::llm::{PromptMessage, StreamEvent};
use chatrelay_types::message::{ChatEvent, Message, Sender};

use crate::backend::{CompletionBackend, FragmentSink};

/// Relays one streaming completion call from backend to client.
pub struct CompletionRelay<'a, B: CompletionBackend> {
    backend: &'a B,
}

impl<'a, B: CompletionBackend> CompletionRelay<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Build the prompt context: every prior message mapped to its role,
    /// then the new human turn.
    ///
    /// The sender tag is a closed two-variant enum, so "anything not
    /// human is assistant" holds by construction.
    fn build_prompt(prior: &[Message], human: &Message) -> Vec<PromptMessage> {
        let mut prompt: Vec<PromptMessage> = prior
            .iter()
            .map(|m| PromptMessage {
                role: m.sender,
                content: m.text.clone(),
            })
            .collect();
        prompt.push(PromptMessage {
            role: Sender::Human,
            content: human.text.clone(),
        });
        prompt
    }

    /// Drive one completion: stream fragments to `sink`, accumulate, and
    /// return the assembled assistant message once the backend finishes.
    ///
    /// The returned message is NOT persisted here; the pipeline owns the
    /// persist-before-cache commit.
    pub async fn stream_reply<F: FragmentSink>(
        &self,
        prior: &[Message],
        human: &Message,
        sink: &mut F,
    ) -> Result<Message, ChatError> {
        let prompt = Self::build_prompt(prior, human);

        let started = chrono::Utc::now();
        let mut stream = self.backend.stream(prompt);
        let mut buffer = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::TextDelta { text } => {
                    let fragment = ChatEvent {
                        session_id: human.session_id.clone(),
                        sender: Sender::Assistant,
                        text: text.clone(),
                        timestamp: started,
                    };
                    if sink.send(&fragment).await.is_err() {
                        tracing::debug!(
                            session_id = %human.session_id,
                            backend = self.backend.name(),
                            "client gone, canceling completion stream"
                        );
                        return Err(ChatError::Canceled);
                    }
                    buffer.push_str(&text);
                }
                StreamEvent::Done => break,
            }
        }

        Ok(Message::new(
            human.session_id.clone(),
            Sender::Assistant,
            buffer,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;

    use futures_util::Stream;

    use chatrelay_types::error::SinkClosed;
    use chatrelay_types::llm::BackendError;

    /// Backend emitting a fixed fragment script, optionally failing
    /// after `fail_after` fragments.
    struct ScriptedBackend {
        fragments: Vec<&'static str>,
        fail_after: Option<usize>,
    }

    impl CompletionBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        fn stream(
            &self,
            _prompt: Vec<PromptMessage>,
        ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, BackendError>> + Send + 'static>>
        {
            let mut events: Vec<Result<StreamEvent, BackendError>> = Vec::new();
            for (i, fragment) in self.fragments.iter().enumerate() {
                if self.fail_after == Some(i) {
                    events.push(Err(BackendError::Stream("connection reset".to_string())));
                    return Box::pin(futures_util::stream::iter(events));
                }
                events.push(Ok(StreamEvent::TextDelta {
                    text: fragment.to_string(),
                }));
            }
            if self.fail_after == Some(self.fragments.len()) {
                events.push(Err(BackendError::Stream("connection reset".to_string())));
            } else {
                events.push(Ok(StreamEvent::Done));
            }
            Box::pin(futures_util::stream::iter(events))
        }
    }

    /// Sink collecting delivered fragments, optionally refusing after
    /// `close_after` deliveries.
    struct CollectingSink {
        delivered: Vec<ChatEvent>,
        close_after: Option<usize>,
    }

    impl CollectingSink {
        fn open() -> Self {
            Self {
                delivered: Vec::new(),
                close_after: None,
            }
        }
    }

    impl FragmentSink for CollectingSink {
        async fn send(&mut self, event: &ChatEvent) -> Result<(), SinkClosed> {
            if self.close_after == Some(self.delivered.len()) {
                return Err(SinkClosed);
            }
            self.delivered.push(event.clone());
            Ok(())
        }
    }

    fn human_turn() -> Message {
        Message::new("s1".to_string(), Sender::Human, "hello".to_string())
    }

    #[tokio::test]
    async fn test_fragments_forwarded_in_order_and_concatenated() {
        let backend = ScriptedBackend {
            fragments: vec!["Hi", " there"],
            fail_after: None,
        };
        let relay = CompletionRelay::new(&backend);
        let mut sink = CollectingSink::open();

        let reply = relay
            .stream_reply(&[], &human_turn(), &mut sink)
            .await
            .unwrap();

        let texts: Vec<&str> = sink.delivered.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["Hi", " there"]);
        assert!(sink.delivered.iter().all(|e| e.sender == Sender::Assistant));

        assert_eq!(reply.sender, Sender::Assistant);
        assert_eq!(reply.session_id, "s1");
        // Concatenation of delivered fragments equals the reply text, byte for byte.
        assert_eq!(reply.text, "Hi there");
    }

    #[tokio::test]
    async fn test_backend_failure_discards_buffer() {
        let backend = ScriptedBackend {
            fragments: vec!["Hi"],
            fail_after: Some(1),
        };
        let relay = CompletionRelay::new(&backend);
        let mut sink = CollectingSink::open();

        let result = relay.stream_reply(&[], &human_turn(), &mut sink).await;

        assert!(matches!(result, Err(ChatError::Backend(_))));
        // The one fragment emitted before the failure was still delivered.
        assert_eq!(sink.delivered.len(), 1);
        assert_eq!(sink.delivered[0].text, "Hi");
    }

    #[tokio::test]
    async fn test_sink_closed_cancels_stream() {
        let backend = ScriptedBackend {
            fragments: vec!["Hi", " there", "!"],
            fail_after: None,
        };
        let relay = CompletionRelay::new(&backend);
        let mut sink = CollectingSink {
            delivered: Vec::new(),
            close_after: Some(1),
        };

        let result = relay.stream_reply(&[], &human_turn(), &mut sink).await;

        assert!(matches!(result, Err(ChatError::Canceled)));
        assert_eq!(sink.delivered.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_stream_yields_empty_reply() {
        let backend = ScriptedBackend {
            fragments: vec![],
            fail_after: None,
        };
        let relay = CompletionRelay::new(&backend);
        let mut sink = CollectingSink::open();

        let reply = relay
            .stream_reply(&[], &human_turn(), &mut sink)
            .await
            .unwrap();
        assert!(sink.delivered.is_empty());
        assert!(reply.text.is_empty());
    }

    #[test]
    fn test_build_prompt_maps_roles_and_appends_human_turn() {
        let prior = vec![
            Message::new("s1".to_string(), Sender::Human, "earlier".to_string()),
            Message::new("s1".to_string(), Sender::Assistant, "reply".to_string()),
        ];
        let human = human_turn();

        let prompt = CompletionRelay::<ScriptedBackend>::build_prompt(&prior, &human);

        assert_eq!(prompt.len(), 3);
        assert_eq!(prompt[0].role, Sender::Human);
        assert_eq!(prompt[1].role, Sender::Assistant);
        assert_eq!(prompt[2].role, Sender::Human);
        assert_eq!(prompt[2].content, "hello");
    }
}
