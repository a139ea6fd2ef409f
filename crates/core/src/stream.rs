use std::thread;
use std::time::Duration;

pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(10);
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(20);

/// How an answer is reshaped before it is revealed. The two upstream app
/// variants disagreed here; the policy is an explicit choice now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPolicy {
    /// One space-delimited token per line, revealed character by character.
    SpacedLines,
    /// Enumerated answers become bullet lines, plain answers get blank-line
    /// paragraph breaks; revealed word by word.
    #[default]
    Structured,
}

impl FormatPolicy {
    pub fn default_delay(&self) -> Duration {
        match self {
            FormatPolicy::SpacedLines => DEFAULT_CHAR_DELAY,
            FormatPolicy::Structured => DEFAULT_WORD_DELAY,
        }
    }
}

pub fn format_answer(answer: &str, policy: FormatPolicy) -> String {
    match policy {
        FormatPolicy::SpacedLines => answer.split(' ').collect::<Vec<_>>().join("\n"),
        FormatPolicy::Structured => {
            if answer.trim_start().starts_with("1.") {
                answer
                    .split(' ')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(|token| format!("- {token}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                answer.replace('\n', "\n\n")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    NotStarted,
    Streaming,
    Complete,
}

/// Finite, non-restartable reveal of an already-computed answer: each `next`
/// yields a strictly longer prefix of the formatted text. The delay is
/// injected so tests can run it at zero.
pub struct AnswerStream {
    formatted: String,
    boundaries: Vec<usize>,
    emitted: usize,
    delay: Duration,
    state: StreamState,
}

impl AnswerStream {
    pub fn new(answer: &str, policy: FormatPolicy, delay: Duration) -> Self {
        let formatted = format_answer(answer, policy);
        let boundaries = match policy {
            FormatPolicy::SpacedLines => char_boundaries(&formatted),
            FormatPolicy::Structured => word_boundaries(&formatted),
        };

        Self {
            formatted,
            boundaries,
            emitted: 0,
            delay,
            state: StreamState::NotStarted,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn formatted(&self) -> &str {
        &self.formatted
    }
}

impl Iterator for AnswerStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.emitted >= self.boundaries.len() {
            self.state = StreamState::Complete;
            return None;
        }

        if self.emitted > 0 && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        let end = self.boundaries[self.emitted];
        self.emitted += 1;
        self.state = if self.emitted == self.boundaries.len() {
            StreamState::Complete
        } else {
            StreamState::Streaming
        };

        Some(self.formatted[..end].to_string())
    }
}

fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(index, ch)| index + ch.len_utf8())
        .collect()
}

/// Byte offsets after each whitespace-delimited word, so every prefix keeps
/// the separators the formatter put between words.
fn word_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut in_word = false;

    for (index, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else {
            if in_word {
                boundaries.pop();
            }
            in_word = true;
            boundaries.push(index + ch.len_utf8());
        }
    }

    if let Some(last) = boundaries.last_mut() {
        *last = text.len();
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::{format_answer, AnswerStream, FormatPolicy, StreamState};
    use std::time::Duration;

    fn collect(answer: &str, policy: FormatPolicy) -> Vec<String> {
        AnswerStream::new(answer, policy, Duration::ZERO).collect()
    }

    #[test]
    fn spaced_lines_round_trips_through_spaces() {
        let input = "The quick brown fox jumps";
        let formatted = format_answer(input, FormatPolicy::SpacedLines);

        for line in formatted.lines() {
            assert!(!line.contains(' '));
        }
        let rejoined = formatted.lines().collect::<Vec<_>>().join(" ");
        assert_eq!(rejoined, input);
    }

    #[test]
    fn spaced_lines_reveals_one_character_at_a_time() {
        let prefixes = collect("hi there", FormatPolicy::SpacedLines);
        let formatted = format_answer("hi there", FormatPolicy::SpacedLines);

        assert_eq!(prefixes.len(), formatted.chars().count());
        assert_eq!(prefixes.first().map(String::as_str), Some("h"));
        assert_eq!(prefixes.last().map(String::as_str), Some("hi\nthere"));
    }

    #[test]
    fn structured_bullets_enumerated_answers() {
        let formatted = format_answer("1. first 2. second", FormatPolicy::Structured);
        assert_eq!(formatted, "- 1.\n- first\n- 2.\n- second");
    }

    #[test]
    fn structured_paragraph_breaks_plain_answers() {
        let formatted = format_answer("a\nb\nc", FormatPolicy::Structured);
        assert_eq!(formatted, "a\n\nb\n\nc");
    }

    #[test]
    fn word_stream_preserves_paragraph_separators() {
        let prefixes = collect("a\nb\nc", FormatPolicy::Structured);
        assert_eq!(prefixes, vec!["a", "a\n\nb", "a\n\nb\n\nc"]);
    }

    #[test]
    fn prefixes_grow_strictly() {
        let prefixes = collect("one two three four", FormatPolicy::Structured);
        for pair in prefixes.windows(2) {
            assert!(pair[1].len() > pair[0].len());
            assert!(pair[1].starts_with(pair[0].as_str()));
        }
    }

    #[test]
    fn state_machine_runs_not_started_to_complete() {
        let mut stream = AnswerStream::new("alpha beta", FormatPolicy::Structured, Duration::ZERO);
        assert_eq!(stream.state(), StreamState::NotStarted);

        let first = stream.next().unwrap();
        assert_eq!(first, "alpha");
        assert_eq!(stream.state(), StreamState::Streaming);

        let second = stream.next().unwrap();
        assert_eq!(second, "alpha beta");
        assert_eq!(stream.state(), StreamState::Complete);

        assert!(stream.next().is_none());
        assert_eq!(stream.state(), StreamState::Complete);
    }

    #[test]
    fn empty_answer_streams_nothing() {
        let mut stream = AnswerStream::new("", FormatPolicy::Structured, Duration::ZERO);
        assert!(stream.next().is_none());
        assert_eq!(stream.state(), StreamState::Complete);
    }
}
