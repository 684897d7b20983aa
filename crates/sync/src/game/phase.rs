use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::net::{FrameError, GameStateFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Shutdown,
    Ready,
    BeforeGame,
    Preparing,
    InGameAnswerPending,
    InGameWaitForNextQuestion,
    BetweenRounds,
}

impl Status {
    pub fn has_window(&self) -> bool {
        matches!(
            self,
            Status::BeforeGame | Status::InGameAnswerPending | Status::InGameWaitForNextQuestion
        )
    }

    pub fn has_question(&self) -> bool {
        matches!(
            self,
            Status::InGameAnswerPending | Status::InGameWaitForNextQuestion
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub answers: Vec<AnswerOption>,
    #[serde(default)]
    pub correct: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    pub index: i32,
    pub total_questions: u32,
}

impl Question {
    pub fn is_correct_known(&self) -> bool {
        self.correct.is_some()
    }

    pub fn answer(&self, id: &str) -> Option<&AnswerOption> {
        self.answers.iter().find(|a| a.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player: String,
    pub points: i32,
    pub correct: u32,
    pub answers_given: u32,
    #[serde(default)]
    pub last_points: Option<i32>,
    #[serde(default)]
    pub last_time: Option<f32>,
}

impl PlayerScore {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            points: 0,
            correct: 0,
            answers_given: 0,
            last_points: None,
            last_time: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub answer_id: String,
    pub user: String,
    pub ts: u64,
}

/// Server-clock interval between the start of the current action and the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionWindow {
    pub action_start: u64,
    pub next_action: u64,
}

impl ActionWindow {
    pub fn new(action_start: u64, next_action: u64) -> Self {
        Self {
            action_start,
            next_action,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.next_action.saturating_sub(self.action_start)
    }

    pub fn contains(&self, server_ms: u64) -> bool {
        server_ms >= self.action_start && server_ms <= self.next_action
    }
}

/// Question round in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub question: Question,
    pub window: ActionWindow,
    pub given_answers: Vec<UserAnswer>,
}

impl Round {
    pub fn answer_of(&self, user: &str) -> Option<&UserAnswer> {
        self.given_answers.iter().find(|a| a.user == user)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GamePhase {
    #[default]
    Shutdown,
    Ready,
    BeforeGame {
        window: ActionWindow,
    },
    Preparing,
    InGameAnswerPending(Round),
    InGameWaitForNextQuestion(Round),
    BetweenRounds,
}

impl GamePhase {
    pub fn status(&self) -> Status {
        match self {
            GamePhase::Shutdown => Status::Shutdown,
            GamePhase::Ready => Status::Ready,
            GamePhase::BeforeGame { .. } => Status::BeforeGame,
            GamePhase::Preparing => Status::Preparing,
            GamePhase::InGameAnswerPending(_) => Status::InGameAnswerPending,
            GamePhase::InGameWaitForNextQuestion(_) => Status::InGameWaitForNextQuestion,
            GamePhase::BetweenRounds => Status::BetweenRounds,
        }
    }

    pub fn window(&self) -> Option<ActionWindow> {
        match self {
            GamePhase::BeforeGame { window } => Some(*window),
            GamePhase::InGameAnswerPending(round) | GamePhase::InGameWaitForNextQuestion(round) => {
                Some(round.window)
            }
            _ => None,
        }
    }

    pub fn round(&self) -> Option<&Round> {
        match self {
            GamePhase::InGameAnswerPending(round) | GamePhase::InGameWaitForNextQuestion(round) => {
                Some(round)
            }
            _ => None,
        }
    }

    pub fn is_answering(&self) -> bool {
        matches!(self, GamePhase::InGameAnswerPending(_))
    }
}

/// Everything the server says about the game at one instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub players: Vec<PlayerScore>,
    pub hide_answers: bool,
}

impl GameSnapshot {
    pub fn status(&self) -> Status {
        self.phase.status()
    }

    pub fn player(&self, name: &str) -> Option<&PlayerScore> {
        self.players.iter().find(|p| p.player == name)
    }
}

impl TryFrom<GameStateFrame> for GameSnapshot {
    type Error = FrameError;

    fn try_from(frame: GameStateFrame) -> Result<Self, Self::Error> {
        check_unique_players(&frame.players)?;

        let window = ActionWindow::new(frame.action_start, frame.next_action);
        if frame.status.has_window() && window.next_action < window.action_start {
            return Err(FrameError::InvalidWindow {
                start: window.action_start,
                end: window.next_action,
            });
        }

        let round = |question: Option<Question>, given_answers: Vec<UserAnswer>| {
            question
                .map(|question| Round {
                    question,
                    window,
                    given_answers,
                })
                .ok_or(FrameError::MissingQuestion(frame.status))
        };

        let phase = match frame.status {
            Status::Shutdown => GamePhase::Shutdown,
            Status::Ready => GamePhase::Ready,
            Status::BeforeGame => GamePhase::BeforeGame { window },
            Status::Preparing => GamePhase::Preparing,
            Status::InGameAnswerPending => {
                GamePhase::InGameAnswerPending(round(frame.current_question, frame.given_answers)?)
            }
            Status::InGameWaitForNextQuestion => GamePhase::InGameWaitForNextQuestion(round(
                frame.current_question,
                frame.given_answers,
            )?),
            Status::BetweenRounds => GamePhase::BetweenRounds,
        };

        Ok(Self {
            phase,
            players: frame.players,
            hide_answers: frame.hide_answers,
        })
    }
}

fn check_unique_players(players: &[PlayerScore]) -> Result<(), FrameError> {
    let mut seen = HashSet::with_capacity(players.len());
    for score in players {
        if !seen.insert(score.player.as_str()) {
            return Err(FrameError::DuplicatePlayer(score.player.clone()));
        }
    }
    Ok(())
}

impl From<&GameSnapshot> for GameStateFrame {
    fn from(snapshot: &GameSnapshot) -> Self {
        let window = snapshot.phase.window().unwrap_or_default();
        let (current_question, given_answers) = match snapshot.phase.round() {
            Some(round) => (Some(round.question.clone()), round.given_answers.clone()),
            None => (None, Vec::new()),
        };

        Self {
            status: snapshot.status(),
            action_start: window.action_start,
            next_action: window.next_action,
            current_question,
            players: snapshot.players.clone(),
            given_answers,
            hide_answers: snapshot.hide_answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            text: "Name the title".to_string(),
            answers: vec![
                AnswerOption {
                    text: "Help".to_string(),
                    id: "Help".to_string(),
                },
                AnswerOption {
                    text: "Blind Man".to_string(),
                    id: "Blind Man".to_string(),
                },
            ],
            correct: None,
            solution: None,
            index: 0,
            total_questions: 5,
        }
    }

    fn frame(status: Status) -> GameStateFrame {
        GameStateFrame {
            status,
            action_start: 1000,
            next_action: 6000,
            current_question: None,
            players: vec![PlayerScore::new("lars")],
            given_answers: Vec::new(),
            hide_answers: false,
        }
    }

    #[test]
    fn test_before_game_keeps_window() {
        let snapshot = GameSnapshot::try_from(frame(Status::BeforeGame)).unwrap();
        assert_eq!(
            snapshot.phase,
            GamePhase::BeforeGame {
                window: ActionWindow::new(1000, 6000)
            }
        );
        assert_eq!(snapshot.phase.window().unwrap().duration_ms(), 5000);
    }

    #[test]
    fn test_in_game_requires_question() {
        let err = GameSnapshot::try_from(frame(Status::InGameAnswerPending)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::MissingQuestion(Status::InGameAnswerPending)
        ));

        let mut with_question = frame(Status::InGameAnswerPending);
        with_question.current_question = Some(question());
        with_question.given_answers.push(UserAnswer {
            answer_id: "Help".to_string(),
            user: "lars".to_string(),
            ts: 2000,
        });
        let snapshot = GameSnapshot::try_from(with_question).unwrap();
        let round = snapshot.phase.round().unwrap();
        assert_eq!(round.given_answers.len(), 1);
        assert_eq!(round.answer_of("lars").unwrap().answer_id, "Help");
    }

    #[test]
    fn test_answers_outside_round_are_dropped() {
        let mut ready = frame(Status::Ready);
        ready.given_answers.push(UserAnswer {
            answer_id: "Help".to_string(),
            user: "lars".to_string(),
            ts: 2000,
        });

        let snapshot = GameSnapshot::try_from(ready).unwrap();
        assert_eq!(snapshot.phase, GamePhase::Ready);
        assert!(snapshot.phase.round().is_none());
    }

    #[test]
    fn test_rejects_duplicate_players() {
        let mut duplicated = frame(Status::BetweenRounds);
        duplicated.players.push(PlayerScore::new("lars"));

        let err = GameSnapshot::try_from(duplicated).unwrap_err();
        assert!(matches!(err, FrameError::DuplicatePlayer(name) if name == "lars"));
    }

    #[test]
    fn test_rejects_inverted_window() {
        let mut inverted = frame(Status::BeforeGame);
        inverted.next_action = 500;

        let err = GameSnapshot::try_from(inverted).unwrap_err();
        assert!(matches!(
            err,
            FrameError::InvalidWindow {
                start: 1000,
                end: 500
            }
        ));

        // untimed phases carry no window to validate
        let mut ready = frame(Status::Ready);
        ready.next_action = 500;
        assert!(GameSnapshot::try_from(ready).is_ok());
    }

    #[test]
    fn test_frame_from_snapshot() {
        let mut source = frame(Status::InGameWaitForNextQuestion);
        source.current_question = Some(question());
        let snapshot = GameSnapshot::try_from(source.clone()).unwrap();

        assert_eq!(GameStateFrame::from(&snapshot), source);
    }
}
