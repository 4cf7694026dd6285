use chrono::{DateTime, Utc};
use feedback_core::lifecycle::{is_expired, session_time_remaining};
use feedback_core::model::QuestionId;
use feedback_core::results::{ChoiceResult, RatingResult, TextResult, TimelineBucket};
use services::SessionReport;

use crate::vm::time_fmt::{format_datetime, format_percent, percent_of};

/// One horizontal bar: a label, its count and its width relative to the largest bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarVm {
    pub label: String,
    pub count: u32,
    pub width_percent: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingCardVm {
    pub question_id: QuestionId,
    pub text: String,
    /// e.g. `4.2 / 5`, or `No ratings yet`.
    pub average_label: String,
    pub response_count: u32,
    pub bars: Vec<BarVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceCardVm {
    pub question_id: QuestionId,
    pub text: String,
    pub total: u32,
    pub bars: Vec<BarVm>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextCardVm {
    pub question_id: QuestionId,
    pub text: String,
    /// `(answer, submitted at)`, oldest first.
    pub answers: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultsVm {
    pub title: String,
    pub code: String,
    pub created_at: String,
    pub status: String,
    pub response_rate: String,
    pub respondents: String,
    pub overall_average: String,
    pub satisfaction_rate: String,
    pub rating: Vec<RatingCardVm>,
    pub choice: Vec<ChoiceCardVm>,
    pub text: Vec<TextCardVm>,
    pub timeline: Vec<BarVm>,
    pub has_responses: bool,
}

#[must_use]
pub fn map_session_results(report: &SessionReport, now: DateTime<Utc>) -> ResultsVm {
    let session = &report.session;
    let results = &report.results;

    let status = if is_expired(session, now) {
        "Closed".to_string()
    } else {
        session_time_remaining(session, now).unwrap_or_else(|| "Open".to_string())
    };

    ResultsVm {
        title: session.title().to_string(),
        code: session.code().to_string(),
        created_at: format_datetime(session.created_at()),
        status,
        response_rate: format_percent(results.response_rate),
        respondents: format!("{} of {}", results.fully_responded, results.assigned),
        overall_average: if results.rating.iter().any(|r| r.response_count > 0) {
            format!("{:.1}", results.overall_average)
        } else {
            "-".to_string()
        },
        satisfaction_rate: format_percent(results.satisfaction_rate),
        rating: results.rating.iter().map(rating_card).collect(),
        choice: results.choice.iter().map(choice_card).collect(),
        text: results.text.iter().map(text_card).collect(),
        timeline: timeline_bars(&results.timeline),
        has_responses: results.fully_responded > 0 || !results.timeline.is_empty(),
    }
}

fn bars(entries: impl IntoIterator<Item = (String, u32)>) -> Vec<BarVm> {
    let entries: Vec<(String, u32)> = entries.into_iter().collect();
    let max = entries.iter().map(|(_, n)| *n).max().unwrap_or(0);
    entries
        .into_iter()
        .map(|(label, count)| BarVm {
            width_percent: percent_of(count, max),
            label,
            count,
        })
        .collect()
}

fn rating_card(result: &RatingResult) -> RatingCardVm {
    let average_label = if result.response_count == 0 {
        "No ratings yet".to_string()
    } else {
        format!("{:.1} / {}", result.average, result.scale.max())
    };
    RatingCardVm {
        question_id: result.question_id,
        text: result.text.clone(),
        average_label,
        response_count: result.response_count,
        bars: bars(result.histogram.iter().map(|(v, n)| (v.to_string(), *n))),
    }
}

fn choice_card(result: &ChoiceResult) -> ChoiceCardVm {
    ChoiceCardVm {
        question_id: result.question_id,
        text: result.text.clone(),
        total: result.total,
        bars: bars(result.counts.iter().cloned()),
    }
}

fn text_card(result: &TextResult) -> TextCardVm {
    TextCardVm {
        question_id: result.question_id,
        text: result.text.clone(),
        answers: result
            .answers
            .iter()
            .map(|a| (a.answer.clone(), format_datetime(a.submitted_at)))
            .collect(),
    }
}

fn timeline_bars(buckets: &[TimelineBucket]) -> Vec<BarVm> {
    bars(buckets.iter().map(|b| (b.hour.clone(), b.count)))
}
