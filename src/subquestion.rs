//! Sub-question resolution over the exclusive post shapes

use crate::types::*;

/// Options the user must pick from before a target question is known.
/// Empty means no sub-selection is needed.
pub fn parse_sub_question_options(post: &Post) -> Vec<SubQuestionOption> {
    match &post.content {
        PostContent::GroupOfQuestions(group) => group
            .questions
            .iter()
            .map(|q| SubQuestionOption {
                value: SubQuestionValue::Id(q.id),
                label: q.label.clone(),
            })
            .collect(),
        PostContent::Conditional(pair) => vec![
            SubQuestionOption {
                value: SubQuestionValue::Id(pair.question_yes.id),
                label: "if yes".to_string(),
            },
            SubQuestionOption {
                value: SubQuestionValue::Id(pair.question_no.id),
                label: "if no".to_string(),
            },
        ],
        PostContent::Question(q) if q.question_type == QuestionType::MultipleChoice => q
            .options
            .iter()
            .map(|opt| SubQuestionOption {
                value: SubQuestionValue::Label(opt.clone()),
                label: opt.clone(),
            })
            .collect(),
        PostContent::Question(_) => Vec::new(),
    }
}

/// Question id to fetch for, or `None` when the caller must not fetch yet
pub fn derive_question_id(post: &Post, selected: Option<&SubQuestionValue>) -> Option<u64> {
    if let Some(id) = selected.and_then(SubQuestionValue::as_id) {
        return Some(id);
    }
    match &post.content {
        PostContent::Question(q) => Some(q.id),
        _ => None,
    }
}

/// Resolve the concrete target question. A numeric selection that matches
/// no member yields `None`, which callers treat as "not yet resolvable".
pub fn derive_question<'a>(post: &'a Post, selected: Option<&SubQuestionValue>) -> Option<&'a Question> {
    if let Some(id) = selected.and_then(SubQuestionValue::as_id) {
        return match &post.content {
            PostContent::GroupOfQuestions(group) => group.questions.iter().find(|q| q.id == id),
            PostContent::Conditional(pair) => [&pair.question_yes, &pair.question_no]
                .into_iter()
                .find(|q| q.id == id),
            PostContent::Question(_) => None,
        };
    }
    match &post.content {
        PostContent::Question(q) => Some(q),
        _ => None,
    }
}

/// The multiple-choice option label in focus, if the selection names one
/// that exists on the question.
pub fn focused_option<'a>(question: &Question, selected: Option<&'a SubQuestionValue>) -> Option<&'a str> {
    let label = selected.and_then(SubQuestionValue::as_label)?;
    if question.question_type == QuestionType::MultipleChoice && question.options.iter().any(|o| o == label) {
        Some(label)
    } else {
        None
    }
}
