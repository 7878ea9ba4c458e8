//! Structural invariants of a question graph.

use std::collections::HashMap;

use crate::core::question::Question;

/// Check a registered question set before a conversation starts:
/// - The entry question exists
/// - Every `default_next` and branch target names a registered question
/// - Branch keys have a type the question can actually produce
/// - Message nodes carry no branches
///
/// Returns stable, name-ordered messages (empty on success).
pub fn validate_flow(questions: &HashMap<String, Question>, entry: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if !questions.contains_key(entry) {
        errors.push(format!("entry question '{}' is not registered", entry));
    }

    let mut names: Vec<&String> = questions.keys().collect();
    names.sort();

    for name in names {
        let question = &questions[name];

        if let Some(target) = question.default_target() {
            if !questions.contains_key(target) {
                errors.push(format!(
                    "{}: default_next '{}' is not registered",
                    name, target
                ));
            }
        }

        for (when, target) in question.branches() {
            if !questions.contains_key(target) {
                errors.push(format!(
                    "{}: branch target '{}' is not registered",
                    name, target
                ));
            }
            if !question.kind().accepts_branch_key(when) {
                errors.push(format!(
                    "{}: branch key {} ({}) can never match a {} answer",
                    name,
                    when,
                    when.type_label(),
                    question.kind().label()
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tos_questions;

    fn index(questions: Vec<Question>) -> HashMap<String, Question> {
        questions
            .into_iter()
            .map(|q| (q.name().to_string(), q))
            .collect()
    }

    #[test]
    fn tos_flow_is_valid() {
        assert!(validate_flow(&index(tos_questions()), "TOS").is_empty());
    }

    #[test]
    fn reports_missing_entry() {
        let errors = validate_flow(&index(tos_questions()), "start");
        assert_eq!(errors, vec!["entry question 'start' is not registered".to_string()]);
    }

    #[test]
    fn reports_dangling_targets_in_name_order() {
        let questions = index(vec![
            Question::yes_no("b", "B?").branch(true, "nowhere"),
            Question::text("a", "A?").default_next("missing"),
        ]);
        let errors = validate_flow(&questions, "a");
        assert_eq!(
            errors,
            vec![
                "a: default_next 'missing' is not registered".to_string(),
                "b: branch target 'nowhere' is not registered".to_string(),
            ]
        );
    }

    #[test]
    fn reports_branches_on_message_nodes() {
        let questions = index(vec![
            Question::message("bye", "Bye.").branch(true, "bye"),
        ]);
        assert_eq!(
            validate_flow(&questions, "bye"),
            vec!["bye: branch key true (bool) can never match a message answer".to_string()]
        );
    }

    #[test]
    fn reports_branch_keys_of_the_wrong_type() {
        let questions = index(vec![
            Question::yes_no("tos", "Agree?").branch("yes", "done"),
            Question::message("done", "Bye."),
        ]);
        let errors = validate_flow(&questions, "tos");
        assert_eq!(
            errors,
            vec!["tos: branch key yes (text) can never match a yes_no answer".to_string()]
        );
    }
}
