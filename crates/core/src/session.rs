use crate::models::ConversationTurn;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use uuid::Uuid;

pub const DEFAULT_MEMORY_TURNS: usize = 5;

/// FIFO window of the most recent turns, used as conversational context for
/// the next query. Oldest turn is evicted once capacity is exceeded.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl MemoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if self.capacity == 0 {
            return;
        }
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_TURNS)
    }
}

/// One chat session over one uploaded document: bounded memory for the model
/// plus the full ordered transcript for display.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    memory: MemoryWindow,
    transcript: Vec<ConversationTurn>,
}

impl ConversationSession {
    pub fn new(memory_turns: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            memory: MemoryWindow::new(memory_turns),
            transcript: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn record(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        let turn = ConversationTurn {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        };

        self.memory.push(turn.clone());
        self.transcript.push(turn);
    }

    pub fn memory(&self) -> &MemoryWindow {
        &self.memory
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// New file uploaded: drop both the window and the transcript, keep the
    /// configured capacity.
    pub fn reset(&mut self) {
        self.session_id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.memory.clear();
        self.transcript.clear();
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_TURNS)
    }
}
