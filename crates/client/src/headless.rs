use tokio::io::{AsyncBufReadExt, BufReader};

use quizsync::game::view::headline;
use quizsync::{SyncHandle, SyncStatus, SyncView};

/// Log view changes and submit answers typed on stdin, one per line.
///
/// A line is either the 1-based position of an answer or its id.
pub async fn run(handle: SyncHandle) -> anyhow::Result<()> {
    let mut view = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut last: Option<(String, SyncStatus)> = None;

    report(&view.borrow_and_update().clone(), &mut last);

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow_and_update().clone();
                report(&current, &mut last);
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let current = view.borrow().clone();
                    match resolve_answer(&current, input) {
                        Some(id) => {
                            log::info!("Submitting answer {}", id);
                            handle.submit(id);
                        }
                        None => log::warn!("No answer matches {:?}", input),
                    }
                }
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    Ok(())
}

fn report(view: &SyncView, last: &mut Option<(String, SyncStatus)>) {
    let current = (headline(&view.snapshot), view.status);
    if last.as_ref() == Some(&current) {
        return;
    }

    log::info!("[{:?}] {}", current.1, current.0);
    if let Some(round) = view.snapshot.phase.round() {
        for (index, answer) in round.question.answers.iter().enumerate() {
            log::info!("  {}. {} ({})", index + 1, answer.text, answer.id);
        }
    }
    log::debug!(
        "latency {:?} ms, offset {} ms, {} frames received",
        view.latency_ms,
        view.offset_ms,
        view.stats.frames_received
    );
    *last = Some(current);
}

pub fn resolve_answer(view: &SyncView, input: &str) -> Option<String> {
    let round = view.snapshot.phase.round()?;
    let answers = &round.question.answers;

    if let Ok(position) = input.parse::<usize>() {
        if (1..=answers.len()).contains(&position) {
            return Some(answers[position - 1].id.clone());
        }
    }

    answers
        .iter()
        .find(|answer| answer.id == input)
        .map(|answer| answer.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizsync::{ActionWindow, AnswerOption, GamePhase, GameSnapshot, Question, Round};

    fn view_with_round() -> SyncView {
        let question = Question {
            text: "Which year?".to_string(),
            answers: vec![
                AnswerOption {
                    text: "1979".to_string(),
                    id: "a".to_string(),
                },
                AnswerOption {
                    text: "1984".to_string(),
                    id: "b".to_string(),
                },
            ],
            correct: None,
            solution: None,
            index: 0,
            total_questions: 5,
        };

        SyncView {
            snapshot: GameSnapshot {
                phase: GamePhase::InGameAnswerPending(Round {
                    question,
                    window: ActionWindow::new(1000, 11000),
                    given_answers: Vec::new(),
                }),
                ..GameSnapshot::default()
            },
            ..SyncView::default()
        }
    }

    #[test]
    fn test_resolve_by_position_and_id() {
        let view = view_with_round();

        assert_eq!(resolve_answer(&view, "2"), Some("b".to_string()));
        assert_eq!(resolve_answer(&view, "a"), Some("a".to_string()));
        assert_eq!(resolve_answer(&view, "3"), None);
        assert_eq!(resolve_answer(&view, "0"), None);
    }

    #[test]
    fn test_nothing_to_answer_outside_round() {
        assert_eq!(resolve_answer(&SyncView::default(), "1"), None);
    }
}
