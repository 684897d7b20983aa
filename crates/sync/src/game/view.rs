use super::phase::{ActionWindow, GamePhase, GameSnapshot, PlayerScore};
use crate::net::corrected_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerMark {
    Neutral,
    Correct,
    Wrong,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub selected: bool,
    pub mark: AnswerMark,
    pub markings: Vec<&'a str>,
}

/// Per-answer rendering state for `viewer`. Empty outside of question rounds.
///
/// An answer is `Correct` when the correct id is known and matches, and `Wrong`
/// when the correct id is known, differs, and the viewer picked it. With
/// `hide_answers` set, the markings only ever list the viewer.
pub fn answer_views<'a>(snapshot: &'a GameSnapshot, viewer: &str) -> Vec<AnswerView<'a>> {
    let Some(round) = snapshot.phase.round() else {
        return Vec::new();
    };
    let correct = round.question.correct.as_deref();

    round
        .question
        .answers
        .iter()
        .map(|answer| {
            let selected = round
                .given_answers
                .iter()
                .any(|given| given.user == viewer && given.answer_id == answer.id);

            let mark = match correct {
                Some(id) if id == answer.id => AnswerMark::Correct,
                Some(_) if selected => AnswerMark::Wrong,
                _ => AnswerMark::Neutral,
            };

            let markings = round
                .given_answers
                .iter()
                .filter(|given| given.answer_id == answer.id)
                .filter(|given| !snapshot.hide_answers || given.user == viewer)
                .map(|given| given.user.as_str())
                .collect();

            AnswerView {
                id: &answer.id,
                text: &answer.text,
                selected,
                mark,
                markings,
            }
        })
        .collect()
}

/// Share of the action window already elapsed, in server time.
pub fn elapsed_fraction(window: ActionWindow, now_ms: u64, offset_ms: i64) -> Option<f64> {
    let total = window.duration_ms();
    if total == 0 {
        return None;
    }

    let server_now = corrected_timestamp(now_ms, offset_ms);
    let elapsed = server_now.saturating_sub(window.action_start);
    Some((elapsed as f64 / total as f64).clamp(0.0, 1.0))
}

pub fn remaining_secs(window: ActionWindow, now_ms: u64, offset_ms: i64) -> u64 {
    let server_now = corrected_timestamp(now_ms, offset_ms);
    let remaining = window.next_action.saturating_sub(server_now);
    remaining.saturating_add(500) / 1000
}

pub fn headline(snapshot: &GameSnapshot) -> String {
    match &snapshot.phase {
        GamePhase::Shutdown => "Waiting for server...".to_string(),
        GamePhase::Ready => "Waiting for game start...".to_string(),
        GamePhase::Preparing => "Preparing round...".to_string(),
        GamePhase::BeforeGame { .. } => "Get ready".to_string(),
        GamePhase::InGameAnswerPending(round) => format!(
            "({}/{}) {}",
            round.question.index.saturating_add(1),
            round.question.total_questions,
            round.question.text
        ),
        GamePhase::InGameWaitForNextQuestion(round) => format!(
            "({}/{}) Solution: {}",
            round.question.index.saturating_add(1),
            round.question.total_questions,
            round.question.solution.as_deref().unwrap_or("-")
        ),
        GamePhase::BetweenRounds => "Final standings".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandingRow<'a> {
    pub rank: usize,
    pub score: &'a PlayerScore,
    pub ratio: f64,
    pub last_ratio: f64,
}

/// Score bars relative to the leader. Rows keep the server's order.
pub fn standings(players: &[PlayerScore]) -> Vec<StandingRow<'_>> {
    let max = players.iter().map(|p| p.points).max().unwrap_or(0);
    let max = if max <= 0 { 1.0 } else { max as f64 };

    players
        .iter()
        .enumerate()
        .map(|(index, score)| StandingRow {
            rank: index + 1,
            score,
            ratio: (score.points as f64 / max).clamp(0.0, 1.0),
            last_ratio: (score.last_points.unwrap_or(0) as f64 / max).clamp(0.0, 1.0),
        })
        .collect()
}
