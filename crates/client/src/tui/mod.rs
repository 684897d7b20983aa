mod screens;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::runtime::Runtime;
use tokio::sync::watch;

use quizsync::{Clock, SyncHandle, SyncView, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,
    MoveUp,
    MoveDown,
    SubmitSelected,
    SubmitIndex(usize),
}

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    view: watch::Receiver<SyncView>,
    clock: SystemClock,
    selected_index: usize,
    should_quit: bool,
    restored: bool,
}

impl Tui {
    pub fn new(view: watch::Receiver<SyncView>) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            view,
            clock: SystemClock,
            selected_index: 0,
            should_quit: false,
            restored: false,
        })
    }

    pub fn run(&mut self, handle: &SyncHandle) -> io::Result<()> {
        while !self.should_quit {
            let view = self.view.borrow_and_update().clone();
            self.clamp_selection(&view);
            self.draw(&view)?;

            // redraw at least every 100ms so the timebar keeps moving
            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = self.handle_key(key.code, key.modifiers);
                        self.process_action(action, &view, handle);
                    }
                }
            }
        }

        Ok(())
    }

    fn draw(&mut self, view: &SyncView) -> io::Result<()> {
        let now_ms = self.clock.now_ms();
        let selected = self.selected_index;

        self.terminal.draw(|frame| {
            screens::render(frame, view, now_ms, selected);
        })?;

        Ok(())
    }

    fn handle_key(&self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match code {
            KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
            KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
            KeyCode::Enter => Action::SubmitSelected,
            KeyCode::Char(c @ '1'..='9') => Action::SubmitIndex(c as usize - '1' as usize),
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            _ => Action::None,
        }
    }

    fn process_action(&mut self, action: Action, view: &SyncView, handle: &SyncHandle) {
        match action {
            Action::None => {}
            Action::Quit => {
                self.should_quit = true;
            }
            Action::MoveUp => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            Action::MoveDown => {
                self.selected_index += 1;
                self.clamp_selection(view);
            }
            Action::SubmitSelected => self.submit(self.selected_index, view, handle),
            Action::SubmitIndex(index) => {
                self.selected_index = index;
                self.clamp_selection(view);
                self.submit(index, view, handle);
            }
        }
    }

    fn submit(&self, index: usize, view: &SyncView, handle: &SyncHandle) {
        let Some(round) = view.snapshot.phase.round() else {
            return;
        };
        if let Some(answer) = round.question.answers.get(index) {
            log::debug!("Submitting answer {}", answer.id);
            handle.submit(answer.id.clone());
        }
    }

    fn clamp_selection(&mut self, view: &SyncView) {
        let count = view
            .snapshot
            .phase
            .round()
            .map(|round| round.question.answers.len())
            .unwrap_or(0);
        self.selected_index = self.selected_index.min(count.saturating_sub(1));
    }

    /// Leave raw mode and the alternate screen. Later calls are no-ops, so
    /// the explicit call in `run` and the one in `Drop` restore only once.
    pub fn restore_terminal(&mut self) -> io::Result<()> {
        let backend = self.terminal.backend_mut();
        restore_once(&mut self.restored, || {
            terminal::disable_raw_mode()?;
            execute!(backend, LeaveAlternateScreen, cursor::Show)
        })
    }
}

fn restore_once<F>(restored: &mut bool, restore: F) -> io::Result<()>
where
    F: FnOnce() -> io::Result<()>,
{
    if *restored {
        return Ok(());
    }
    restore()?;
    *restored = true;
    Ok(())
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

pub fn run(handle: SyncHandle, runtime: &Runtime) -> io::Result<()> {
    let mut tui = Tui::new(handle.subscribe())?;
    let result = tui.run(&handle);
    tui.restore_terminal()?;

    runtime.block_on(handle.shutdown());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_runs_once() {
        let mut restored = false;
        let mut calls = 0;

        // explicit restore followed by the one from Drop
        for _ in 0..2 {
            restore_once(&mut restored, || {
                calls += 1;
                Ok(())
            })
            .unwrap();
        }

        assert!(restored);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failed_restore_is_retried() {
        let mut restored = false;
        let mut calls = 0;

        let failed = restore_once(&mut restored, || {
            calls += 1;
            Err(io::Error::other("tty gone"))
        });
        assert!(failed.is_err());
        assert!(!restored);

        restore_once(&mut restored, || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert!(restored);
        assert_eq!(calls, 2);
    }
}
