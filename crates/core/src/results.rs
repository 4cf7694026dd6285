//! Aggregation of raw response rows into the numbers shown on the results
//! screen and the teacher dashboard. Nothing here is persisted; callers
//! recompute from rows on every load.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::model::{Question, QuestionId, QuestionKind, RatingScale, Response, Session, SessionId, UserId};

/// Ratings at or above this value count towards satisfaction.
pub const SATISFIED_THRESHOLD: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RatingResult {
    pub question_id: QuestionId,
    pub text: String,
    pub scale: RatingScale,
    pub average: f64,
    /// `(rating, count)` for every rating in `1..=scale`.
    pub histogram: Vec<(u8, u32)>,
    pub response_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceResult {
    pub question_id: QuestionId,
    pub text: String,
    /// Configured options first, in order, then unlisted answers as first seen.
    pub counts: Vec<(String, u32)>,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAnswer {
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResult {
    pub question_id: QuestionId,
    pub text: String,
    pub answers: Vec<TextAnswer>,
}

/// Students whose latest submission fell within one UTC hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBucket {
    /// `YYYY-MM-DD HH:00`
    pub hour: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionResults {
    pub rating: Vec<RatingResult>,
    pub choice: Vec<ChoiceResult>,
    pub text: Vec<TextResult>,
    /// Students who answered every question.
    pub fully_responded: u32,
    pub assigned: u32,
    pub response_rate: f64,
    pub overall_average: f64,
    pub satisfaction_rate: f64,
    pub timeline: Vec<TimelineBucket>,
}

/// Builds the results for one session from its questions and response rows.
#[must_use]
pub fn aggregate(session: &Session, questions: &[Question], responses: &[Response]) -> SessionResults {
    let mut by_question: HashMap<QuestionId, Vec<&Response>> = HashMap::new();
    for response in responses {
        by_question.entry(response.question_id).or_default().push(response);
    }
    let answers_for = |id: QuestionId| by_question.get(&id).map_or(&[][..], Vec::as_slice);

    let mut rating = Vec::new();
    let mut choice = Vec::new();
    let mut text = Vec::new();
    let mut all_ratings: Vec<f64> = Vec::new();

    for question in questions {
        let rows = answers_for(question.id());
        match question.kind() {
            QuestionKind::Rating { scale } => {
                let values: Vec<f64> = rows.iter().filter_map(|r| parse_rating(&r.answer)).collect();
                all_ratings.extend(&values);
                rating.push(RatingResult {
                    question_id: question.id(),
                    text: question.text().to_string(),
                    scale: *scale,
                    average: mean(&values),
                    histogram: histogram(&values, *scale),
                    response_count: count(values.len()),
                });
            }
            QuestionKind::MultipleChoice { options } => {
                let mut counts: Vec<(String, u32)> =
                    options.iter().map(|o| (o.clone(), 0)).collect();
                for row in rows {
                    match counts.iter_mut().find(|(label, _)| *label == row.answer) {
                        Some((_, n)) => *n += 1,
                        None => counts.push((row.answer.clone(), 1)),
                    }
                }
                choice.push(ChoiceResult {
                    question_id: question.id(),
                    text: question.text().to_string(),
                    counts,
                    total: count(rows.len()),
                });
            }
            QuestionKind::Text => {
                text.push(TextResult {
                    question_id: question.id(),
                    text: question.text().to_string(),
                    answers: rows
                        .iter()
                        .map(|r| TextAnswer {
                            answer: r.answer.clone(),
                            submitted_at: r.submitted_at,
                        })
                        .collect(),
                });
            }
        }
    }

    let fully_responded = fully_responded(questions, responses);
    let assigned = session.assigned_students_count();
    let response_rate = if assigned == 0 || questions.is_empty() {
        0.0
    } else {
        f64::from(fully_responded) / f64::from(assigned) * 100.0
    };
    let satisfied = all_ratings.iter().filter(|v| **v >= SATISFIED_THRESHOLD).count();
    let satisfaction_rate = if all_ratings.is_empty() {
        0.0
    } else {
        ratio(satisfied, all_ratings.len()) * 100.0
    };

    SessionResults {
        rating,
        choice,
        text,
        fully_responded,
        assigned,
        response_rate,
        overall_average: mean(&all_ratings),
        satisfaction_rate,
        timeline: timeline(responses),
    }
}

fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn histogram(values: &[f64], scale: RatingScale) -> Vec<(u8, u32)> {
    (1..=scale.max())
        .map(|star| {
            let hits = values.iter().filter(|v| **v == f64::from(star)).count();
            (star, count(hits))
        })
        .collect()
}

/// Students whose distinct answered questions cover the whole session.
fn fully_responded(questions: &[Question], responses: &[Response]) -> u32 {
    if questions.is_empty() {
        return 0;
    }
    let question_ids: HashSet<QuestionId> = questions.iter().map(Question::id).collect();
    let mut answered: HashMap<UserId, HashSet<QuestionId>> = HashMap::new();
    for response in responses {
        if question_ids.contains(&response.question_id) {
            answered
                .entry(response.student_id)
                .or_default()
                .insert(response.question_id);
        }
    }
    count(
        answered
            .values()
            .filter(|ids| ids.len() == question_ids.len())
            .count(),
    )
}

fn timeline(responses: &[Response]) -> Vec<TimelineBucket> {
    let mut latest: HashMap<UserId, DateTime<Utc>> = HashMap::new();
    for response in responses {
        latest
            .entry(response.student_id)
            .and_modify(|at| *at = (*at).max(response.submitted_at))
            .or_insert(response.submitted_at);
    }
    let mut buckets: BTreeMap<String, u32> = BTreeMap::new();
    for at in latest.values() {
        *buckets.entry(at.format("%Y-%m-%d %H:00").to_string()).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(hour, count)| TimelineBucket { hour, count })
        .collect()
}

//
// ─── DASHBOARD ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub session_id: SessionId,
    pub respondents: u32,
    pub assigned: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub sessions: Vec<SessionStats>,
    pub active_count: u32,
    pub completed_count: u32,
    /// Whole percent, rounded.
    pub overall_response_rate: u32,
}

impl DashboardStats {
    #[must_use]
    pub fn for_session(&self, id: SessionId) -> Option<&SessionStats> {
        self.sessions.iter().find(|s| s.session_id == id)
    }
}

/// Summarises a teacher's sessions given the `(session, student)` pairs that
/// have at least one response row.
#[must_use]
pub fn dashboard_stats(
    sessions: &[Session],
    response_pairs: &[(SessionId, UserId)],
    now: DateTime<Utc>,
) -> DashboardStats {
    let mut respondents: HashMap<SessionId, HashSet<UserId>> = HashMap::new();
    for (session_id, student_id) in response_pairs {
        respondents.entry(*session_id).or_default().insert(*student_id);
    }

    let mut stats = DashboardStats::default();
    let mut total_respondents: u64 = 0;
    let mut total_assigned: u64 = 0;

    for session in sessions {
        let is_active = session.expires_at().is_some_and(|at| at > now);
        let is_completed = session.expires_at().is_some_and(|at| at <= now);
        if is_active {
            stats.active_count += 1;
        }
        if is_completed {
            stats.completed_count += 1;
        }
        let answered = respondents.get(&session.id()).map_or(0, HashSet::len);
        let answered = count(answered);
        total_respondents += u64::from(answered);
        total_assigned += u64::from(session.assigned_students_count());
        stats.sessions.push(SessionStats {
            session_id: session.id(),
            respondents: answered,
            assigned: session.assigned_students_count(),
            is_active,
        });
    }

    stats.overall_response_rate = if total_assigned == 0 {
        0
    } else {
        let rate = total_respondents as f64 / total_assigned as f64 * 100.0;
        rate.round() as u32
    };
    stats
}
