//! Conversation controller.
//!
//! The [`Engine`] owns a set of question templates and walks them one answer at
//! a time. It never reads input or blocks: the caller feeds raw answers through
//! [`Engine::answer`] and relays whatever the engine emitted through its
//! [`MessageSink`].
//!
//! ```text
//! NotStarted -> AwaitingAnswer <-> AwaitingConfirmation -> Complete
//! ```

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::core::flow::validate_flow;
use crate::core::question::{Question, is_affirmative};
use crate::core::value::Value;
use crate::error::EngineError;
use crate::sink::{MessageBuffer, MessageSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    NotStarted,
    AwaitingAnswer,
    AwaitingConfirmation,
    Complete,
}

/// Per-conversation state for one question.
#[derive(Debug, Clone, Default, PartialEq)]
struct AnswerSlot {
    /// `None` until an answer is stored; `Some(Value::Bool(false))` is a real "no".
    value: Option<Value>,
    error: Option<String>,
}

pub struct Engine<S = MessageBuffer> {
    questions: HashMap<String, Question>,
    slots: HashMap<String, AnswerSlot>,
    current: Option<String>,
    state: EngineState,
    config: EngineConfig,
    sink: S,
}

impl Engine<MessageBuffer> {
    /// Engine that buffers its messages; read them with [`drain_messages`](Self::drain_messages).
    pub fn new() -> Self {
        Self::with_sink(MessageBuffer::new())
    }

    pub fn drain_messages(&mut self) -> Vec<String> {
        self.sink.drain()
    }
}

impl Default for Engine<MessageBuffer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MessageSink> Engine<S> {
    pub fn with_sink(sink: S) -> Self {
        Self {
            questions: HashMap::new(),
            slots: HashMap::new(),
            current: None,
            state: EngineState::NotStarted,
            config: EngineConfig::default(),
            sink,
        }
    }

    /// Replace the default wording. The confirmation template must render and
    /// echo the answer back.
    pub fn with_config(mut self, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Add a question. Only allowed before [`start`](Self::start); names must
    /// be non-empty and unique.
    pub fn register(&mut self, question: Question) -> Result<(), EngineError> {
        if self.state != EngineState::NotStarted {
            warn!(question = question.name(), "register after start");
            return Err(EngineError::AlreadyStarted);
        }
        if question.name().is_empty() {
            return Err(EngineError::EmptyName);
        }
        if self.questions.contains_key(question.name()) {
            warn!(question = question.name(), "duplicate question name");
            return Err(EngineError::DuplicateQuestion(question.name().to_string()));
        }
        debug!(
            question = question.name(),
            kind = question.kind().label(),
            "registered question"
        );
        self.slots
            .insert(question.name().to_string(), AnswerSlot::default());
        self.questions.insert(question.name().to_string(), question);
        Ok(())
    }

    /// Check the question graph and move to `entry`, emitting its prompt.
    pub fn start(&mut self, entry: &str) -> Result<(), EngineError> {
        if self.state != EngineState::NotStarted {
            warn!(entry, "start called twice");
            return Err(EngineError::AlreadyStarted);
        }
        let errors = validate_flow(&self.questions, entry);
        if !errors.is_empty() {
            warn!(error_count = errors.len(), "flow failed validation");
            return Err(EngineError::InvalidFlow(errors));
        }
        info!(entry, questions = self.questions.len(), "conversation started");
        self.state = EngineState::AwaitingAnswer;
        self.advance(Some(entry))
    }

    /// Feed one raw answer to the current question.
    ///
    /// Invalid input is not an error: the engine emits the validation message
    /// and the prompt again and stays put.
    pub fn answer(&mut self, raw: &str) -> Result<(), EngineError> {
        match self.state {
            EngineState::NotStarted => {
                warn!("answer before start");
                return Err(EngineError::NotStarted);
            }
            EngineState::Complete => {
                warn!("answer after completion");
                return Err(EngineError::Complete);
            }
            EngineState::AwaitingAnswer | EngineState::AwaitingConfirmation => {}
        }
        let name = self.current.clone().ok_or(EngineError::NotStarted)?;

        if self.state == EngineState::AwaitingConfirmation {
            return self.resolve_confirmation(&name, raw);
        }

        let question = self
            .questions
            .get(&name)
            .ok_or_else(|| EngineError::UnknownQuestion(name.clone()))?;
        let slot = self.slots.entry(name.clone()).or_default();

        if let Err(message) = question.validate(raw) {
            debug!(question = %name, error = %message, "answer rejected");
            self.sink.emit(&self.config.format_error(&message));
            self.sink.emit(question.prompt());
            slot.error = Some(message);
            return Ok(());
        }

        let value = question.parse(raw)?;
        let confirmation = if question.requires_confirmation() {
            Some(self.config.render_confirmation(raw)?)
        } else {
            None
        };
        debug!(question = %name, value = %value, "answer stored");
        slot.value = Some(value);
        slot.error = None;

        match confirmation {
            Some(text) => {
                self.sink.emit(&text);
                self.state = EngineState::AwaitingConfirmation;
                Ok(())
            }
            None => self.advance(None),
        }
    }

    /// A "yes" moves on using the value stored from the original answer.
    /// Anything else re-asks the question; the stored value stays until a new
    /// answer replaces it.
    fn resolve_confirmation(&mut self, name: &str, raw: &str) -> Result<(), EngineError> {
        self.state = EngineState::AwaitingAnswer;
        if is_affirmative(raw) {
            debug!(question = name, "answer confirmed");
            return self.advance(None);
        }
        debug!(question = name, "confirmation declined");
        let question = self
            .questions
            .get(name)
            .ok_or_else(|| EngineError::UnknownQuestion(name.to_string()))?;
        self.sink.emit(question.prompt());
        Ok(())
    }

    /// Move to `explicit`, or to wherever the current question's stored value
    /// points. No target ends the flow; so does landing on a prompt-less node.
    fn advance(&mut self, explicit: Option<&str>) -> Result<(), EngineError> {
        let target = match explicit {
            Some(name) => Some(name.to_string()),
            None => self.current.as_deref().and_then(|name| {
                let value = self.slots.get(name).and_then(|slot| slot.value.as_ref());
                self.questions
                    .get(name)
                    .and_then(|question| question.next_target(value))
                    .map(str::to_string)
            }),
        };

        let Some(target) = target else {
            self.finish();
            return Ok(());
        };

        let question = self
            .questions
            .get(&target)
            .ok_or_else(|| EngineError::UnknownQuestion(target.clone()))?;
        if !question.prompt().is_empty() {
            self.sink.emit(question.prompt());
        }
        if let Some(intro) = question.intro_message() {
            self.sink.emit(intro);
        }
        let terminal = question.is_terminal();
        debug!(question = %target, terminal, "advanced");
        self.current = Some(target);

        if terminal {
            self.finish();
        }
        Ok(())
    }

    fn finish(&mut self) {
        if self.state != EngineState::Complete {
            info!(answered = self.results().len(), "conversation complete");
            self.state = EngineState::Complete;
        }
    }

    /// Every stored answer by question name, including partial progress.
    pub fn results(&self) -> BTreeMap<String, Value> {
        self.slots
            .iter()
            .filter_map(|(name, slot)| slot.value.clone().map(|value| (name.clone(), value)))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.state == EngineState::Complete
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn pending_confirmation(&self) -> bool {
        self.state == EngineState::AwaitingConfirmation
    }

    /// Name of the question awaiting an answer (or the node the flow ended on).
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn question(&self, name: &str) -> Option<&Question> {
        self.questions.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).and_then(|slot| slot.value.as_ref())
    }

    /// Message of the most recent failed validation for `name`, cleared by the
    /// next accepted answer.
    pub fn last_error(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|slot| slot.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::question::{POSITIVE_ERROR, YES_NO_ERROR};
    use crate::test_support::{started_tos_engine, tos_engine};

    const TOS_PROMPT: &str = "Do you agree to the TOS?";
    const EMAIL_PROMPT: &str = "What is your email address?";
    const EMAIL_INTRO: &str = "We will not share this with bad people";
    const AGE_PROMPT: &str = "How old are you?";

    #[test]
    fn start_emits_entry_prompt() {
        let mut engine = started_tos_engine();
        assert_eq!(engine.drain_messages(), vec![TOS_PROMPT.to_string()]);
        assert_eq!(engine.state(), EngineState::AwaitingAnswer);
        assert_eq!(engine.current(), Some("TOS"));
    }

    /// The full TOS/email/age walk-through, message by message.
    #[test]
    fn tos_flow_end_to_end() {
        let mut engine = started_tos_engine();
        engine.drain_messages();

        engine.answer("yes").expect("answer");
        assert_eq!(
            engine.drain_messages(),
            vec![EMAIL_PROMPT.to_string(), EMAIL_INTRO.to_string()]
        );

        engine.answer("not-an-email").expect("answer");
        assert_eq!(
            engine.drain_messages(),
            vec!["Error: Invalid address.".to_string(), EMAIL_PROMPT.to_string()]
        );
        assert!(!engine.is_complete());

        engine.answer("a@b.com").expect("answer");
        assert_eq!(
            engine.drain_messages(),
            vec!["You entered a@b.com.  Are you certain? [yes/no]".to_string()]
        );
        assert!(engine.pending_confirmation());

        engine.answer("yes").expect("answer");
        assert_eq!(engine.drain_messages(), vec![AGE_PROMPT.to_string()]);

        engine.answer("-5").expect("answer");
        assert_eq!(
            engine.drain_messages(),
            vec![format!("Error: {}", POSITIVE_ERROR), AGE_PROMPT.to_string()]
        );

        engine.answer("30").expect("answer");
        assert!(engine.is_complete());
        assert!(engine.drain_messages().is_empty());

        let results = engine.results();
        assert_eq!(results.len(), 3);
        assert_eq!(results["TOS"], Value::Bool(true));
        assert_eq!(results["email"], Value::from("a@b.com"));
        assert_eq!(results["age"], Value::Int(30));
    }

    #[test]
    fn declining_tos_lands_on_terminal_message() {
        let mut engine = started_tos_engine();
        engine.drain_messages();

        engine.answer("no").expect("answer");
        assert_eq!(
            engine.drain_messages(),
            vec!["Well, that's unfortunate. Bye!".to_string()]
        );
        assert!(engine.is_complete());
        assert_eq!(engine.current(), Some("noTOS"));
        assert_eq!(engine.value("TOS"), Some(&Value::Bool(false)));
        assert!(!engine.results().contains_key("noTOS"));
    }

    #[test]
    fn repeated_invalid_input_is_idempotent() {
        let mut engine = started_tos_engine();
        engine.drain_messages();

        for _ in 0..3 {
            engine.answer("maybe").expect("answer");
            assert_eq!(
                engine.drain_messages(),
                vec![format!("Error: {}", YES_NO_ERROR), TOS_PROMPT.to_string()]
            );
            assert_eq!(engine.current(), Some("TOS"));
            assert_eq!(engine.value("TOS"), None);
            assert_eq!(engine.last_error("TOS"), Some(YES_NO_ERROR));
        }
        assert!(engine.results().is_empty());
    }

    #[test]
    fn accepted_answer_clears_last_error() {
        let mut engine = started_tos_engine();
        engine.answer("maybe").expect("answer");
        engine.answer("yes").expect("answer");
        assert_eq!(engine.last_error("TOS"), None);
    }

    /// Confirmation advances with the value from the original answer, not the "yes".
    #[test]
    fn confirmation_uses_originally_stored_value() {
        let mut engine = started_tos_engine();
        engine.answer("yes").expect("answer");
        engine.answer("  a@b.com ").expect("answer");
        engine.answer("Y").expect("confirm");
        assert_eq!(engine.value("email"), Some(&Value::from("a@b.com")));
        assert_eq!(engine.current(), Some("age"));
    }

    #[test]
    fn declined_confirmation_reasks_and_keeps_value() {
        let mut engine = started_tos_engine();
        engine.answer("yes").expect("answer");
        engine.answer("a@b.com").expect("answer");
        engine.drain_messages();

        engine.answer("no").expect("decline");
        assert_eq!(engine.drain_messages(), vec![EMAIL_PROMPT.to_string()]);
        assert_eq!(engine.state(), EngineState::AwaitingAnswer);
        assert_eq!(engine.current(), Some("email"));
        assert_eq!(engine.value("email"), Some(&Value::from("a@b.com")));

        // A fresh valid answer re-enters confirmation.
        engine.answer("c@d.org").expect("answer");
        assert!(engine.pending_confirmation());
        assert_eq!(engine.value("email"), Some(&Value::from("c@d.org")));
    }

    #[test]
    fn declined_confirmation_with_invalid_followup_stays_on_question() {
        let mut engine = started_tos_engine();
        engine.answer("yes").expect("answer");
        engine.answer("a@b.com").expect("answer");
        engine.answer("nope").expect("decline");
        engine.answer("").expect("answer");
        assert_eq!(engine.state(), EngineState::AwaitingAnswer);
        assert_eq!(engine.current(), Some("email"));
    }

    #[test]
    fn unconfirmed_question_never_pends() {
        let mut engine = started_tos_engine();
        engine.answer("yes").expect("answer");
        assert!(!engine.pending_confirmation());
        assert_eq!(engine.current(), Some("email"));
    }

    #[test]
    fn partial_results_are_visible_mid_flow() {
        let mut engine = started_tos_engine();
        engine.answer("yes").expect("answer");
        engine.answer("a@b.com").expect("answer");
        let results = engine.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results["email"], Value::from("a@b.com"));
    }

    #[test]
    fn answer_before_start_is_a_usage_error() {
        let mut engine = tos_engine();
        assert_eq!(engine.answer("yes"), Err(EngineError::NotStarted));
        assert!(engine.drain_messages().is_empty());
    }

    #[test]
    fn answer_after_completion_is_a_usage_error() {
        let mut engine = started_tos_engine();
        engine.answer("no").expect("answer");
        assert!(engine.is_complete());
        engine.drain_messages();
        assert_eq!(engine.answer("yes"), Err(EngineError::Complete));
        assert!(engine.drain_messages().is_empty());
        assert!(engine.is_complete());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut engine = started_tos_engine();
        assert_eq!(engine.start("TOS"), Err(EngineError::AlreadyStarted));
    }

    #[test]
    fn register_after_start_is_rejected() {
        let mut engine = started_tos_engine();
        let err = engine
            .register(Question::text("late", "Too late?"))
            .expect_err("register after start");
        assert_eq!(err, EngineError::AlreadyStarted);
    }

    #[test]
    fn duplicate_and_empty_names_are_rejected() {
        let mut engine = tos_engine();
        assert_eq!(
            engine.register(Question::text("email", "Again?")),
            Err(EngineError::DuplicateQuestion("email".to_string()))
        );
        assert_eq!(
            engine.register(Question::text("", "Nameless?")),
            Err(EngineError::EmptyName)
        );
        // The original registration survives.
        assert_eq!(
            engine.question("email").map(Question::prompt),
            Some(EMAIL_PROMPT)
        );
    }

    #[test]
    fn start_rejects_dangling_targets() {
        let mut engine = Engine::new();
        engine
            .register(Question::yes_no("a", "A?").default_next("ghost"))
            .expect("register");
        let err = engine.start("a").expect_err("invalid flow");
        assert_eq!(
            err,
            EngineError::InvalidFlow(vec!["a: default_next 'ghost' is not registered".to_string()])
        );
        assert_eq!(engine.state(), EngineState::NotStarted);
    }

    /// Prompt-less nodes end the flow even when they point somewhere else.
    #[test]
    fn message_node_mid_flow_is_terminal() {
        let mut engine = Engine::new();
        engine
            .register(Question::text("name", "Name?").default_next("hello"))
            .expect("register");
        engine
            .register(Question::message("hello", "Nice to meet you.").default_next("more"))
            .expect("register");
        engine
            .register(Question::text("more", "Anything else?"))
            .expect("register");
        engine.start("name").expect("start");
        engine.answer("Ada").expect("answer");

        assert!(engine.is_complete());
        assert_eq!(engine.current(), Some("hello"));
        assert_eq!(
            engine.drain_messages(),
            vec!["Name?".to_string(), "Nice to meet you.".to_string()]
        );
    }

    #[test]
    fn starting_on_a_message_node_completes_immediately() {
        let mut engine = Engine::new();
        engine
            .register(Question::message("closed", "Registration is closed."))
            .expect("register");
        engine.start("closed").expect("start");
        assert!(engine.is_complete());
        assert_eq!(
            engine.drain_messages(),
            vec!["Registration is closed.".to_string()]
        );
    }

    #[test]
    fn intro_is_not_repeated_on_validation_failure() {
        let mut engine = started_tos_engine();
        engine.answer("yes").expect("answer");
        engine.drain_messages();
        engine.answer("").expect("answer");
        let messages = engine.drain_messages();
        assert!(!messages.iter().any(|m| m == EMAIL_INTRO));
    }

    #[test]
    fn closure_sink_receives_messages() {
        let mut seen: Vec<String> = Vec::new();
        {
            let mut engine = Engine::with_sink(|message: &str| seen.push(message.to_string()));
            engine
                .register(Question::yes_no("ok", "OK?"))
                .expect("register");
            engine.start("ok").expect("start");
            engine.answer("y").expect("answer");
            assert!(engine.is_complete());
        }
        assert_eq!(seen, vec!["OK?".to_string()]);
    }

    #[test]
    fn custom_config_changes_wording() {
        let config = EngineConfig {
            confirm_template: "Is {{ value }} right?".to_string(),
            error_prefix: "Sorry: ".to_string(),
        };
        let mut engine = tos_engine().with_config(config).expect("valid config");
        engine.start("TOS").expect("start");
        engine.answer("what").expect("answer");
        engine.answer("yes").expect("answer");
        engine.answer("a@b.com").expect("answer");
        let messages = engine.drain_messages();
        assert!(messages.contains(&format!("Sorry: {}", YES_NO_ERROR)));
        assert_eq!(messages.last().map(String::as_str), Some("Is a@b.com right?"));
    }

    #[test]
    fn config_that_drops_the_answer_is_rejected() {
        let config = EngineConfig {
            confirm_template: "Sure?".to_string(),
            ..EngineConfig::default()
        };
        let err = Engine::new().with_config(config).err();
        assert!(matches!(err, Some(EngineError::Template(_))));
    }

    #[test]
    fn config_that_fails_to_compile_is_rejected_up_front() {
        let config = EngineConfig {
            confirm_template: "{{ value".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            tos_engine().with_config(config).err(),
            Some(EngineError::Template(_))
        ));
    }

    #[test]
    fn numeric_branches_follow_parsed_value() {
        let mut engine = Engine::new();
        engine
            .register(
                Question::number("pets", "How many pets?")
                    .branch(0, "none")
                    .default_next("names"),
            )
            .expect("register");
        engine
            .register(Question::message("none", "No pets, no problem."))
            .expect("register");
        engine
            .register(Question::text("names", "Their names?"))
            .expect("register");
        engine.start("pets").expect("start");
        engine.answer(" 0.0 ").expect("answer");
        assert_eq!(engine.current(), Some("none"));
        assert!(engine.is_complete());
    }
}
