use std::collections::HashMap;

use feedback_core::model::{Answer, Question, QuestionId, QuestionKind};

/// Shown in place of a multiple-choice question that has nothing to pick.
pub const MALFORMED_QUESTION_WARNING: &str =
    "This question has no options configured. You can skip it.";

/// One-question-at-a-time walk through a feedback form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackFormVm {
    questions: Vec<Question>,
    answers: HashMap<QuestionId, Answer>,
    current: usize,
}

impl FeedbackFormVm {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            answers: HashMap::new(),
            current: 0,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    /// Blank text answers clear the slot rather than counting as answered.
    pub fn set_answer(&mut self, question_id: QuestionId, answer: Answer) {
        if let Answer::Text(text) = &answer
            && text.trim().is_empty()
        {
            self.answers.remove(&question_id);
            return;
        }
        self.answers.insert(question_id, answer);
    }

    #[must_use]
    pub fn answer(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    #[must_use]
    pub fn is_answered(&self, question: &Question) -> bool {
        question.is_malformed() || self.answers.contains_key(&question.id())
    }

    #[must_use]
    pub fn can_go_next(&self) -> bool {
        self.current_question().is_some_and(|q| self.is_answered(q))
    }

    pub fn next(&mut self) {
        if self.can_go_next() && !self.is_last() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| self.is_answered(q)).count()
    }

    /// Progress through the form in whole percent.
    #[must_use]
    pub fn progress_percent(&self) -> u32 {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let answered = u32::try_from(self.answered_count()).unwrap_or(u32::MAX);
        super::time_fmt::percent_of(answered, total)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.questions.iter().all(|q| self.is_answered(q))
    }

    /// Answers in question order, ready for submission.
    #[must_use]
    pub fn answers(&self) -> Vec<(QuestionId, Answer)> {
        self.questions
            .iter()
            .filter_map(|q| self.answers.get(&q.id()).map(|a| (q.id(), a.clone())))
            .collect()
    }
}

/// Rating buttons for a question, `1..=max`.
#[must_use]
pub fn rating_choices(question: &Question) -> Vec<u8> {
    match question.kind() {
        QuestionKind::Rating { scale } => (1..=scale.max()).collect(),
        QuestionKind::Text | QuestionKind::MultipleChoice { .. } => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_core::model::{RatingScale, SessionId};

    fn question(id: u64, kind: QuestionKind) -> Question {
        Question::new(QuestionId::new(id), SessionId::new(1), "Q", kind, false).unwrap()
    }

    fn questions() -> Vec<Question> {
        vec![
            question(1, QuestionKind::rating()),
            question(
                2,
                QuestionKind::MultipleChoice {
                    options: vec!["Yes".into(), "No".into()],
                },
            ),
            question(3, QuestionKind::Text),
        ]
    }

    #[test]
    fn next_waits_for_an_answer() {
        let mut vm = FeedbackFormVm::new(questions());
        vm.next();
        assert_eq!(vm.current_index(), 0);

        vm.set_answer(QuestionId::new(1), Answer::Rating(4));
        vm.next();
        assert_eq!(vm.current_index(), 1);

        vm.previous();
        vm.previous();
        assert!(vm.is_first());
    }

    #[test]
    fn progress_and_completion() {
        let mut vm = FeedbackFormVm::new(questions());
        assert_eq!(vm.progress_percent(), 0);
        vm.set_answer(QuestionId::new(1), Answer::Rating(2));
        vm.set_answer(QuestionId::new(2), Answer::Choice("No".into()));
        assert_eq!(vm.progress_percent(), 67);
        assert!(!vm.is_complete());

        vm.set_answer(QuestionId::new(3), Answer::Text("  ".into()));
        assert!(!vm.is_complete());
        vm.set_answer(QuestionId::new(3), Answer::Text("More demos".into()));
        assert!(vm.is_complete());

        let ids: Vec<u64> = vm.answers().iter().map(|(id, _)| id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn malformed_questions_count_as_answered() {
        let mut vm = FeedbackFormVm::new(vec![
            question(1, QuestionKind::MultipleChoice { options: vec![] }),
            question(2, QuestionKind::Rating { scale: RatingScale::Ten }),
        ]);
        assert!(vm.can_go_next());
        vm.next();
        assert_eq!(rating_choices(vm.current_question().unwrap()).len(), 10);
        vm.set_answer(QuestionId::new(2), Answer::Rating(9));
        assert!(vm.is_complete());
        assert_eq!(vm.answers().len(), 1);
    }
}
