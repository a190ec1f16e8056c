use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use divvy::session::{Feedback, Phase};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Pad every line to the widest one so centering keeps ascii art aligned.
fn pad_frame(frame: &str) -> Vec<Line<'static>> {
    let width = frame.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
    frame
        .lines()
        .map(|l| Line::from(format!("{l}{}", " ".repeat(width - l.width()))))
        .collect()
}

/// Split `area` into a centered column of the given heights.
fn centered(area: Rect, heights: &[u16]) -> Vec<Rect> {
    let content: u16 = heights.iter().sum();
    let pad = area.height.saturating_sub(content) / 2;
    let constraints = std::iter::once(Constraint::Length(pad))
        .chain(heights.iter().map(|h| Constraint::Length(*h)))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect::<Vec<_>>();

    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(constraints)
        .split(area)
        .iter()
        .skip(1)
        .take(heights.len())
        .copied()
        .collect()
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = &self.session;

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        match session.phase() {
            Phase::Intro | Phase::Choice => {
                let art = session
                    .surface()
                    .visible_frame()
                    .map(String::as_str)
                    .map(pad_frame)
                    .unwrap_or_default();
                let chunks = centered(area, &[art.len() as u16, 2, 1, 1]);

                Paragraph::new(art)
                    .style(Style::default().fg(Color::Magenta))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);

                if session.phase() == Phase::Choice {
                    Paragraph::new(Span::styled(
                        format!(
                            "solve as many divisions as you can in {} seconds",
                            session.config().duration_secs
                        ),
                        bold_style,
                    ))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .render(chunks[1], buf);
                }

                Paragraph::new(Span::styled("(p)lay / (s)kip", italic_style))
                    .alignment(Alignment::Center)
                    .render(chunks[3], buf);
            }
            Phase::Active => {
                let chunks = centered(area, &[2, 2, 2, 2, 1]);

                let timer_style = if session.time_remaining() <= 5 {
                    red_bold_style
                } else {
                    dim_bold_style
                };
                Paragraph::new(Span::styled(
                    format!("{}s", session.time_remaining()),
                    timer_style,
                ))
                .alignment(Alignment::Center)
                .render(chunks[0], buf);

                if let Some(problem) = session.problem() {
                    Paragraph::new(Span::styled(problem.to_string(), bold_style))
                        .alignment(Alignment::Center)
                        .render(chunks[1], buf);
                }

                Paragraph::new(Line::from(vec![
                    Span::styled(session.user_input().to_string(), bold_style),
                    Span::styled("_", dim_bold_style),
                ]))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);

                let feedback = match session.feedback() {
                    Some(Feedback::Correct) => Span::styled("✓ correct", green_bold_style),
                    Some(Feedback::Wrong { expected }) => {
                        Span::styled(format!("✗ it was {expected}"), red_bold_style)
                    }
                    None => Span::raw(""),
                };
                Paragraph::new(feedback)
                    .alignment(Alignment::Center)
                    .render(chunks[3], buf);

                Paragraph::new(Span::styled(
                    format!(
                        "{}/{} correct   (tab) shuffle x{}   (enter) submit",
                        session.correct_answers(),
                        session.total_problems(),
                        session.shuffles_remaining()
                    ),
                    italic_style,
                ))
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
            }
            Phase::Results => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Length(2), // headline
                        Constraint::Length(2), // tally
                        Constraint::Min(1),    // mistakes
                        Constraint::Length(1), // legend
                    ])
                    .split(area);

                Paragraph::new(Span::styled("time's up!", red_bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);

                if let Some(summary) = session.summary() {
                    Paragraph::new(Span::styled(
                        format!(
                            "{} / {} correct",
                            summary.correct_answers, summary.total_problems
                        ),
                        bold_style,
                    ))
                    .alignment(Alignment::Center)
                    .render(chunks[1], buf);
                }

                let mistakes = session
                    .mistakes()
                    .iter()
                    .map(|m| {
                        format!(
                            "{} = {} (you said {})",
                            m.question, m.correct_answer, m.user_answer
                        )
                    })
                    .join("\n");
                Paragraph::new(mistakes)
                    .style(Style::default().fg(Color::Gray))
                    .alignment(Alignment::Center)
                    .render(chunks[2], buf);

                Paragraph::new(Span::styled("(enter) continue", italic_style))
                    .render(chunks[3], buf);
            }
            Phase::Closing => {
                let chunks = centered(area, &[1]);
                Paragraph::new(Span::styled("skipping...", dim_bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);
            }
            Phase::Finished | Phase::Destroyed => {
                let chunks = centered(area, &[2, 2, 1]);

                let headline = match self.last_record {
                    Some(ref r) if r.skipped => "skipped: no points this round".to_string(),
                    Some(ref r) => format!(
                        "{} correct out of {} ({}%)",
                        r.correct_answers,
                        r.total_problems,
                        r.accuracy()
                    ),
                    None => "session over".to_string(),
                };
                Paragraph::new(Span::styled(headline, bold_style))
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);

                if let Some(best) = self.best {
                    Paragraph::new(Span::styled(format!("best: {best}"), dim_bold_style))
                        .alignment(Alignment::Center)
                        .render(chunks[1], buf);
                }

                Paragraph::new(Span::styled("(r)etry / (q)uit", italic_style))
                    .alignment(Alignment::Center)
                    .render(chunks[2], buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use divvy::config::Config;
    use divvy::input::{Choice, Command};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .join("\n")
    }

    fn app() -> App {
        App::new(Config::default(), Some(1), None)
    }

    #[test]
    fn test_pad_frame_equalizes_widths() {
        let lines = pad_frame("a\nabc\n");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.width() == 3));
    }

    #[test]
    fn test_intro_shows_prompt() {
        let screen = render(&app());
        assert!(screen.contains("(p)lay / (s)kip"));
    }

    #[test]
    fn test_active_shows_problem_and_timer() {
        let mut app = app();
        app.apply(Command::Choose(Choice::Play));
        let question = app.session.problem().unwrap().question.clone();

        let screen = render(&app);
        assert!(screen.contains(&question));
        assert!(screen.contains("60s"));
        assert!(screen.contains("shuffle x3"));
    }

    #[test]
    fn test_finished_shows_accuracy() {
        let mut app = app();
        app.apply(Command::Choose(Choice::Play));
        let answer = app.session.problem().unwrap().answer;
        for c in answer.to_string().chars() {
            app.apply(Command::Input(divvy::input::SessionInput::Digit(c)));
        }
        app.apply(Command::Input(divvy::input::SessionInput::Submit));
        app.on_tick(std::time::Duration::from_secs(60));
        app.apply(Command::Acknowledge);

        let screen = render(&app);
        assert!(screen.contains("1 correct out of 1 (100%)"));
    }

    #[test]
    fn test_finished_shows_retry() {
        let mut app = app();
        app.apply(Command::Choose(Choice::Skip));
        app.on_tick(std::time::Duration::from_secs(1));

        let screen = render(&app);
        assert!(screen.contains("skipped"));
        assert!(screen.contains("(r)etry / (q)uit"));
    }
}
