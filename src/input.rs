use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::Phase;

/// Events the session accepts while a problem is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    Digit(char),
    Delete,
    Submit,
    Shuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Choice {
    Play,
    Skip,
}

/// What a key press means to the host, given the session's phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Choose(Choice),
    Input(SessionInput),
    Acknowledge,
    Restart,
    Quit,
}

/// Map a terminal key to a command. Keys with no meaning in the current
/// phase map to `None` rather than reaching the session.
pub fn command_for(phase: Phase, key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match phase {
        Phase::Intro | Phase::Choice => match key.code {
            KeyCode::Char('p') | KeyCode::Enter => Some(Command::Choose(Choice::Play)),
            KeyCode::Char('s') | KeyCode::Esc => Some(Command::Choose(Choice::Skip)),
            _ => None,
        },
        Phase::Active => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => Some(Command::Input(SessionInput::Digit(c))),
            KeyCode::Backspace | KeyCode::Delete => Some(Command::Input(SessionInput::Delete)),
            KeyCode::Enter => Some(Command::Input(SessionInput::Submit)),
            KeyCode::Tab => Some(Command::Input(SessionInput::Shuffle)),
            _ => None,
        },
        Phase::Results => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Acknowledge),
            _ => None,
        },
        Phase::Closing => None,
        Phase::Finished | Phase::Destroyed => match key.code {
            KeyCode::Char('r') => Some(Command::Restart),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn ctrl_c_always_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        for phase in [Phase::Intro, Phase::Active, Phase::Closing, Phase::Finished] {
            assert_eq!(command_for(phase, ctrl_c), Some(Command::Quit));
        }
    }

    #[test]
    fn choice_keys() {
        assert_eq!(
            command_for(Phase::Choice, key(KeyCode::Char('p'))),
            Some(Command::Choose(Choice::Play))
        );
        assert_eq!(
            command_for(Phase::Intro, key(KeyCode::Esc)),
            Some(Command::Choose(Choice::Skip))
        );
        assert_eq!(command_for(Phase::Choice, key(KeyCode::Char('7'))), None);
    }

    #[test]
    fn active_keys() {
        assert_eq!(
            command_for(Phase::Active, key(KeyCode::Char('7'))),
            Some(Command::Input(SessionInput::Digit('7')))
        );
        assert_eq!(
            command_for(Phase::Active, key(KeyCode::Backspace)),
            Some(Command::Input(SessionInput::Delete))
        );
        assert_eq!(
            command_for(Phase::Active, key(KeyCode::Enter)),
            Some(Command::Input(SessionInput::Submit))
        );
        assert_eq!(
            command_for(Phase::Active, key(KeyCode::Tab)),
            Some(Command::Input(SessionInput::Shuffle))
        );
        assert_eq!(command_for(Phase::Active, key(KeyCode::Char('a'))), None);
    }

    #[test]
    fn results_and_finished_keys() {
        assert_eq!(
            command_for(Phase::Results, key(KeyCode::Enter)),
            Some(Command::Acknowledge)
        );
        assert_eq!(command_for(Phase::Closing, key(KeyCode::Enter)), None);
        assert_eq!(
            command_for(Phase::Finished, key(KeyCode::Char('r'))),
            Some(Command::Restart)
        );
        assert_eq!(
            command_for(Phase::Finished, key(KeyCode::Char('q'))),
            Some(Command::Quit)
        );
    }
}
