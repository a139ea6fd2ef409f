use crate::embeddings::Embedder;
use crate::error::QueryError;
use crate::index::VectorIndex;
use crate::llm::ChatModel;
use crate::models::ScoredChunk;
use crate::session::MemoryWindow;

pub const DEFAULT_TOP_K: usize = 4;

/// Ties the seams together for one question: embed it, pull the top chunks
/// from the index, fold in the memory window, and ask the model.
pub struct ChatResponder<E, L>
where
    E: Embedder,
    L: ChatModel,
{
    embedder: E,
    model: L,
    top_k: usize,
}

impl<E, L> ChatResponder<E, L>
where
    E: Embedder + Send + Sync,
    L: ChatModel + Send + Sync,
{
    pub fn new(embedder: E, model: L) -> Self {
        Self {
            embedder,
            model,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub async fn answer(
        &self,
        question: &str,
        index: Option<&VectorIndex>,
        memory: &MemoryWindow,
    ) -> Result<String, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let index = index.ok_or(QueryError::IndexNotReady)?;

        let query_vector = self.embedder.embed(question).await?;
        let hits = index.top_k(&query_vector, self.top_k);

        let prompt = build_prompt(question, &hits, memory);
        let answer = self.model.generate(&prompt).await?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(QueryError::EmptyAnswer);
        }

        Ok(answer.to_string())
    }
}

fn build_prompt(question: &str, hits: &[ScoredChunk], memory: &MemoryWindow) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You answer questions about an uploaded PDF using only the excerpts below. \
         If the excerpts do not contain the answer, say so.\n\n",
    );

    prompt.push_str("Excerpts:\n");
    for hit in hits {
        prompt.push_str(&format!(
            "[page {} | score {:.4}]\n{}\n---\n",
            hit.chunk.page,
            hit.score,
            hit.chunk.text.trim()
        ));
    }

    if !memory.is_empty() {
        prompt.push_str("\nRecent conversation:\n");
        for turn in memory.turns() {
            prompt.push_str(&format!("User: {}\n", turn.question));
            prompt.push_str(&format!("Assistant: {}\n", turn.answer));
        }
    }

    prompt.push_str("\nQuestion:\n");
    prompt.push_str(question);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, ChatResponder};
    use crate::embeddings::{Embedder, HashedNgramEmbedder};
    use crate::error::{ProviderError, QueryError};
    use crate::extractor::PageText;
    use crate::index::VectorIndex;
    use crate::llm::ChatModel;
    use crate::models::{ChunkingOptions, DocumentFingerprint};
    use crate::session::{ConversationSession, MemoryWindow};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeChatModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeChatModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for FakeChatModel {
        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingChatModel;

    #[async_trait]
    impl ChatModel for FailingChatModel {
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::InvalidResponse {
                provider: "gemini",
                details: "response has no candidates".to_string(),
            })
        }
    }

    async fn build_index() -> VectorIndex {
        let document = DocumentFingerprint {
            document_id: "doc-1".to_string(),
            title: "manual.pdf".to_string(),
            checksum: "checksum".to_string(),
            page_count: 1,
            uploaded_at: chrono::Utc::now(),
        };
        let pages = vec![PageText {
            number: 1,
            text: "The relief valve opens at 210 bar.".to_string(),
        }];
        VectorIndex::build(
            document,
            &pages,
            &HashedNgramEmbedder::default(),
            ChunkingOptions::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let responder =
            ChatResponder::new(HashedNgramEmbedder::default(), FakeChatModel::replying("x"));
        let index = build_index().await;

        let result = responder
            .answer("   ", Some(&index), &MemoryWindow::default())
            .await;
        assert!(matches!(result, Err(QueryError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn missing_index_errors_and_leaves_transcript_alone() {
        let responder =
            ChatResponder::new(HashedNgramEmbedder::default(), FakeChatModel::replying("x"));
        let mut session = ConversationSession::default();

        let result = responder
            .answer("What is this document about?", None, session.memory())
            .await;
        assert!(matches!(result, Err(QueryError::IndexNotReady)));

        if let Ok(answer) = result {
            session.record("What is this document about?", answer);
        }
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_context_and_memory() {
        let model = FakeChatModel::replying("It opens at 210 bar.");
        let responder = ChatResponder::new(HashedNgramEmbedder::default(), model);
        let index = build_index().await;

        let mut memory = MemoryWindow::default();
        let mut session = ConversationSession::default();
        session.record("What does the manual cover?", "Hydraulics.");
        memory.push(session.transcript()[0].clone());

        let answer = responder
            .answer("When does the relief valve open?", Some(&index), &memory)
            .await
            .unwrap();
        assert_eq!(answer, "It opens at 210 bar.");

        let prompts = responder.model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("relief valve opens at 210 bar"));
        assert!(prompts[0].contains("User: What does the manual cover?"));
        assert!(prompts[0].contains("Assistant: Hydraulics."));
        assert!(prompts[0].ends_with("When does the relief valve open?\n"));
    }

    #[tokio::test]
    async fn provider_failure_is_a_query_error() {
        let responder = ChatResponder::new(HashedNgramEmbedder::default(), FailingChatModel);
        let index = build_index().await;

        let result = responder
            .answer("anything", Some(&index), &MemoryWindow::default())
            .await;
        assert!(matches!(result, Err(QueryError::Provider(_))));
    }

    #[test]
    fn prompt_skips_memory_section_when_window_is_empty() {
        let prompt = build_prompt("q", &[], &MemoryWindow::default());
        assert!(!prompt.contains("Recent conversation"));
        assert!(prompt.ends_with("Question:\nq\n"));
    }
}
