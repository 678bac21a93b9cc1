// src/utils/html.rs

use crate::models::paper::{CreatePaperRequest, CreateQuestionRequest, UpdatePaperRequest};

/// Whitelist-sanitizes teacher-authored rich text with ammonia.
/// Safe formatting tags survive, scripts and event handlers are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

fn clean_questions(questions: &mut [CreateQuestionRequest]) {
    for q in questions {
        q.question_text = clean_html(&q.question_text);
        if let Some(explanation) = q.explanation.as_mut() {
            *explanation = clean_html(explanation);
        }
        for o in &mut q.options {
            o.option_text = clean_html(&o.option_text);
        }
    }
}

/// Sanitizes every free-text field of a new paper in place.
pub fn clean_paper_request(req: &mut CreatePaperRequest) {
    req.title = clean_html(&req.title);
    if let Some(description) = req.description.as_mut() {
        *description = clean_html(description);
    }
    clean_questions(&mut req.questions);
}

pub fn clean_paper_update(req: &mut UpdatePaperRequest) {
    if let Some(title) = req.title.as_mut() {
        *title = clean_html(title);
    }
    if let Some(description) = req.description.as_mut() {
        *description = clean_html(description);
    }
    if let Some(questions) = req.questions.as_mut() {
        clean_questions(questions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_is_stripped() {
        let cleaned = clean_html("<b>x²</b><script>alert(1)</script>");
        assert_eq!(cleaned, "<b>x²</b>");
    }
}
