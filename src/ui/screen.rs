use ratatui::Frame;

use crate::{
    ui::{PausedView, PlayView, ResultsView},
    App, AppState,
};

/// A UI screen boundary: one renderer per app state.
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct PlayScreen;

impl Screen for PlayScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(PlayView(app), f.area());
    }
}

pub struct PausedScreen;

impl Screen for PausedScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(PausedView(app), f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(ResultsView(app), f.area());
    }
}

pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(PlayScreen),
        AppState::Paused => Box::new(PausedScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
