//! Output channel for end-user messages.

/// Receives every message the engine produces, in order: prompts, intro
/// messages, validation errors and confirmation prompts.
pub trait MessageSink {
    fn emit(&mut self, message: &str);
}

/// Any `FnMut(&str)` is a sink, so callers can forward straight to a chat
/// client or a terminal.
impl<F> MessageSink for F
where
    F: FnMut(&str),
{
    fn emit(&mut self, message: &str) {
        self(message);
    }
}

/// Default sink: buffers messages until the caller drains them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuffer {
    messages: Vec<String>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all buffered messages, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageSink for MessageBuffer {
    fn emit(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
