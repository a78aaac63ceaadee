pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{App, LEADERBOARD_SIZE};
use trivium::game_mode::GameModeConfig;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.state).render(app, f);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn format_secs(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

/// Mode-specific progress: time left, questions left, or questions so far.
fn progress_label(app: &App) -> String {
    let controller = app.session.controller();
    match controller.config() {
        GameModeConfig::TimeLimited { .. } => controller
            .timer()
            .remaining_ms
            .map(format_secs)
            .unwrap_or_default(),
        GameModeConfig::QuestionLimited { total_questions } => format!(
            "question {}/{}",
            (controller.progress().questions_answered + 1).min(*total_questions),
            total_questions
        ),
        GameModeConfig::Unlimited => {
            format!("question {}", controller.progress().questions_answered + 1)
        }
    }
}

pub struct PlayView<'a>(pub &'a App);

impl Widget for PlayView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let session = &app.session;
        let settings = session.settings();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Length(1), // padding
                Constraint::Min(2),    // question
                Constraint::Length(6), // answers
                Constraint::Length(1), // countdown
                Constraint::Length(1), // feedback
                Constraint::Length(1), // legend
            ])
            .split(area);

        let status = Line::from(vec![
            Span::styled(format!("{}  ", settings.topic), bold()),
            Span::styled(
                format!("{} {}  ", settings.difficulty, session.multiplier()),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(progress_label(app), dim_bold()),
            Span::raw("  "),
            Span::styled(
                format!(
                    "{} pts  streak {}",
                    session.score().total_score,
                    session.score().streak
                ),
                bold().fg(Color::Magenta),
            ),
        ]);
        Paragraph::new(status)
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let Some(question) = session.current_question() else {
            Paragraph::new(Span::styled("Loading question...", italic()))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
            return;
        };

        // short questions read better centered
        let fits = question.question.width() <= chunks[2].width as usize;
        Paragraph::new(Span::styled(question.question.as_str(), bold()))
            .alignment(if fits {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let feedback = session.last_feedback().filter(|_| session.is_answered());
        let answers: Vec<Line> = question
            .answers
            .iter()
            .enumerate()
            .map(|(idx, answer)| {
                let style = match feedback {
                    Some(_) if answer.is_correct => bold().fg(Color::Green),
                    Some(fb) if fb.chosen == idx => bold().fg(Color::Red),
                    Some(_) => dim_bold(),
                    None => Style::default(),
                };
                Line::from(Span::styled(format!("({}) {}", idx + 1, answer.text), style))
            })
            .collect();
        Paragraph::new(answers).render(chunks[3], buf);

        if settings.scoring.time_bonus && !session.is_answered() {
            if let Some(remaining) = session.question_remaining_ms(app.now_ms) {
                Paragraph::new(Span::styled(format_secs(remaining), dim_bold()))
                    .alignment(Alignment::Center)
                    .render(chunks[4], buf);
            }
        }

        if let Some(fb) = feedback {
            let text = if fb.is_correct {
                Span::styled(
                    format!(
                        "correct! +{} (time bonus {})  streak {}",
                        fb.score.points_awarded, fb.score.time_bonus, fb.score.new_streak
                    ),
                    bold().fg(Color::Green),
                )
            } else {
                Span::styled("wrong, streak reset", bold().fg(Color::Red))
            };
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .render(chunks[5], buf);
        }

        Paragraph::new(Span::styled(
            "(1-5) answer / (p)ause / (esc)ape",
            italic(),
        ))
        .render(chunks[6], buf);
    }
}

pub struct PausedView<'a>(pub &'a App);

impl Widget for PausedView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(45),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "PAUSED - press (p) to resume",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(progress_label(self.0), dim_bold()))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }
}

pub struct ResultsView<'a>(pub &'a App);

impl Widget for ResultsView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.0;
        let summary = app.session.summary();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // headline
                Constraint::Length(1), // stats
                Constraint::Length(1), // rank
                Constraint::Length(1), // padding
                Constraint::Min(3),    // leaderboard
                Constraint::Length(1), // legend
            ])
            .split(area);

        let reason = summary
            .reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "game over".to_string());
        Paragraph::new(Span::styled(
            format!("{} pts  ({reason})", summary.score),
            bold().fg(Color::Magenta),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            format!(
                "{}/{} correct   {:.0}% acc   best streak {}   {}",
                summary.correct,
                summary.answered,
                summary.accuracy,
                summary.best_streak,
                format_secs(summary.elapsed_ms)
            ),
            bold(),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        if let Some(rank) = app.rank {
            Paragraph::new(Span::styled(
                format!("leaderboard rank #{rank}"),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
        }

        render_leaderboard(app, chunks[4], buf);

        Paragraph::new(Span::styled("(r)estart / (q)uit / (esc)ape", italic()))
            .render(chunks[5], buf);
    }
}

fn render_leaderboard(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title("Leaderboard");
    let Some(board) = app.leaderboard.as_ref().filter(|b| !b.is_empty()) else {
        Paragraph::new("No results yet")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .render(area, buf);
        return;
    };

    let header = Row::new(vec!["#", "Player", "Score", "Acc", "Topic", "Difficulty"])
        .style(bold().fg(Color::Yellow));
    let rows: Vec<Row> = board
        .top(LEADERBOARD_SIZE)
        .into_iter()
        .enumerate()
        .map(|(idx, result)| {
            let style = if app.rank == Some(idx + 1) {
                bold().fg(Color::Green)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from((idx + 1).to_string()),
                Cell::from(result.player.clone()),
                Cell::from(result.score.to_string()),
                Cell::from(format!("{:.0}%", result.accuracy())),
                Cell::from(result.topic.clone()),
                Cell::from(result.difficulty.clone()),
            ])
            .style(style)
        })
        .collect();

    Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(14),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .render(area, buf);
}
