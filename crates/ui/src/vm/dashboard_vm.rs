use chrono::{DateTime, Utc};
use feedback_core::lifecycle::{is_expired, session_time_remaining};
use feedback_core::model::{AssignedSession, Session, SessionId};
use feedback_core::results::DashboardStats;
use services::TeacherDashboard;

use crate::vm::time_fmt::{format_date, format_datetime, percent_of};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeacherSessionCardVm {
    pub id: SessionId,
    pub title: String,
    pub code: String,
    pub created_at: String,
    pub due_date: Option<String>,
    pub time_remaining: Option<String>,
    pub is_active: bool,
    pub respondents: u32,
    pub assigned: u32,
    pub response_percent: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeacherDashboardVm {
    pub total_sessions: usize,
    pub active_count: u32,
    pub completed_count: u32,
    pub overall_response_rate: String,
    pub cards: Vec<TeacherSessionCardVm>,
}

#[must_use]
pub fn map_teacher_dashboard(dashboard: &TeacherDashboard, now: DateTime<Utc>) -> TeacherDashboardVm {
    TeacherDashboardVm {
        total_sessions: dashboard.sessions.len(),
        active_count: dashboard.stats.active_count,
        completed_count: dashboard.stats.completed_count,
        overall_response_rate: format!("{}%", dashboard.stats.overall_response_rate),
        cards: dashboard
            .sessions
            .iter()
            .map(|s| teacher_card(s, &dashboard.stats, now))
            .collect(),
    }
}

fn teacher_card(session: &Session, stats: &DashboardStats, now: DateTime<Utc>) -> TeacherSessionCardVm {
    let (respondents, assigned) = stats
        .for_session(session.id())
        .map_or((0, session.assigned_students_count()), |s| {
            (s.respondents, s.assigned)
        });
    TeacherSessionCardVm {
        id: session.id(),
        title: session.title().to_string(),
        code: session.code().to_string(),
        created_at: format_datetime(session.created_at()),
        due_date: session.due_date().map(format_date),
        time_remaining: session_time_remaining(session, now),
        is_active: !is_expired(session, now),
        respondents,
        assigned,
        response_percent: percent_of(respondents, assigned),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentSessionCardVm {
    pub id: SessionId,
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub due_date: Option<String>,
    pub time_remaining: Option<String>,
}

#[must_use]
pub fn map_student_session(assigned: &AssignedSession, now: DateTime<Utc>) -> StudentSessionCardVm {
    let session = &assigned.session;
    StudentSessionCardVm {
        id: session.id(),
        title: session.title().to_string(),
        description: session.description().map(str::to_string),
        code: session.code().to_string(),
        due_date: session.due_date().map(format_date),
        time_remaining: session_time_remaining(session, now),
    }
}

#[must_use]
pub fn map_student_sessions(sessions: &[AssignedSession], now: DateTime<Utc>) -> Vec<StudentSessionCardVm> {
    sessions.iter().map(|s| map_student_session(s, now)).collect()
}
