mod phase;
mod store;
pub mod view;

pub use phase::{
    ActionWindow, AnswerOption, GamePhase, GameSnapshot, PlayerScore, Question, Round, Status,
    UserAnswer,
};
pub use store::{GamePhaseStore, Observer};
pub use view::{AnswerMark, AnswerView, StandingRow};
