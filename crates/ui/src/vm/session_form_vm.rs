use chrono::NaiveDate;
use feedback_core::model::{
    DEFAULT_QUESTIONS, DefaultQuestionSelection, QuestionDraft, QuestionKind, QuestionType,
    RatingScale, TimeLimit, UserId,
};
use services::SessionDraft;

/// One teacher-authored question while the form is being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomQuestionVm {
    pub text: String,
    pub question_type: QuestionType,
    pub scale: RatingScale,
    pub options: Vec<String>,
}

impl CustomQuestionVm {
    /// Multiple-choice questions start with two empty option fields.
    #[must_use]
    pub fn new(question_type: QuestionType) -> Self {
        let options = match question_type {
            QuestionType::MultipleChoice => vec![String::new(), String::new()],
            QuestionType::Text | QuestionType::Rating => Vec::new(),
        };
        Self {
            text: String::new(),
            question_type,
            scale: RatingScale::default(),
            options,
        }
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    #[must_use]
    pub fn filled_options(&self) -> usize {
        self.options.iter().filter(|o| !o.trim().is_empty()).count()
    }

    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        let kind = match self.question_type {
            QuestionType::Text => QuestionKind::Text,
            QuestionType::Rating => QuestionKind::Rating { scale: self.scale },
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice {
                options: self.options.clone(),
            },
        };
        QuestionDraft::custom(self.text.clone(), kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeLimitChoice {
    Preset(u32),
    Custom,
}

/// State of the create-session form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateSessionFormVm {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD` as typed; blank means no due date.
    pub due_date: String,
    pub time_limit: TimeLimitChoice,
    pub custom_minutes: String,
    pub defaults: DefaultQuestionSelection,
    pub custom_questions: Vec<CustomQuestionVm>,
    pub selected_students: Vec<UserId>,
}

impl Default for CreateSessionFormVm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: String::new(),
            time_limit: TimeLimitChoice::Preset(TimeLimit::default().minutes()),
            custom_minutes: String::new(),
            defaults: DefaultQuestionSelection::all(),
            custom_questions: Vec::new(),
            selected_students: Vec::new(),
        }
    }
}

impl CreateSessionFormVm {
    pub fn toggle_student(&mut self, id: UserId) {
        if let Some(pos) = self.selected_students.iter().position(|s| *s == id) {
            self.selected_students.remove(pos);
        } else {
            self.selected_students.push(id);
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: UserId) -> bool {
        self.selected_students.contains(&id)
    }

    pub fn add_question(&mut self, question_type: QuestionType) {
        self.custom_questions
            .push(CustomQuestionVm::new(question_type));
    }

    pub fn remove_question(&mut self, index: usize) {
        if index < self.custom_questions.len() {
            self.custom_questions.remove(index);
        }
    }

    pub fn add_option(&mut self, question: usize) {
        if let Some(q) = self.custom_questions.get_mut(question) {
            q.options.push(String::new());
        }
    }

    pub fn remove_option(&mut self, question: usize, option: usize) {
        if let Some(q) = self.custom_questions.get_mut(question)
            && option < q.options.len()
        {
            q.options.remove(option);
        }
    }

    /// Number of questions the session will have, counting only non-blank custom ones.
    #[must_use]
    pub fn question_count(&self) -> usize {
        let defaults = (0..DEFAULT_QUESTIONS.len())
            .filter(|i| self.defaults.is_enabled(*i))
            .count();
        defaults + self.custom_questions.iter().filter(|q| !q.is_blank()).count()
    }

    /// # Errors
    ///
    /// Returns a message when the preset or custom minutes are out of range.
    pub fn parsed_time_limit(&self) -> Result<TimeLimit, String> {
        let minutes = match self.time_limit {
            TimeLimitChoice::Preset(m) => m,
            TimeLimitChoice::Custom => self
                .custom_minutes
                .trim()
                .parse::<u32>()
                .map_err(|_| time_limit_message())?,
        };
        TimeLimit::from_minutes(minutes).map_err(|_| time_limit_message())
    }

    /// # Errors
    ///
    /// Returns a message when the date cannot be parsed.
    pub fn parsed_due_date(&self) -> Result<Option<NaiveDate>, String> {
        let raw = self.due_date.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| "Due date must look like 2024-05-31.".to_string())
    }

    /// Build the service draft, checking what can be checked locally.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, phrased for the form.
    pub fn to_draft(&self) -> Result<SessionDraft, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required.".to_string());
        }
        let time_limit = self.parsed_time_limit()?;
        let due_date = self.parsed_due_date()?;

        for q in &self.custom_questions {
            if !q.is_blank()
                && q.question_type == QuestionType::MultipleChoice
                && q.filled_options() == 0
            {
                return Err(format!(
                    "\"{}\" needs at least one option.",
                    q.text.trim()
                ));
            }
        }

        let description = self.description.trim();
        Ok(SessionDraft {
            title: title.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            due_date,
            time_limit,
            defaults: self.defaults,
            custom_questions: self
                .custom_questions
                .iter()
                .map(CustomQuestionVm::to_draft)
                .collect(),
            student_ids: self.selected_students.clone(),
        })
    }
}

fn time_limit_message() -> String {
    format!(
        "Time limit must be between {} and {} minutes.",
        TimeLimit::MIN_MINUTES,
        TimeLimit::MAX_MINUTES
    )
}
