mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trivium::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::{classify_description, validate_description, CUSTOM_PREFIX},
    game_mode::GameOverReason,
    leaderboard::{GameResult, Leaderboard},
    question::{QuestionBank, QuestionPack},
    runtime::{Clock, CrosstermEventSource, FixedTicker, GameEvent, MonotonicClock, Runner},
    scoring::ScoringPolicy,
    session::{AnswerFeedback, Session, SessionSettings},
};

const LEADERBOARD_SIZE: usize = 10;

/// terminal trivia with streak scoring and a local leaderboard
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "Terminal trivia: pick a topic and a difficulty (standard or described in your own words), play against the clock or a question quota, and chase your best streak on the local leaderboard."
)]
pub struct Cli {
    /// end the session after this many seconds
    #[clap(short = 's', long, conflicts_with = "questions")]
    time_secs: Option<u64>,

    /// end the session after this many answered questions
    #[clap(short = 'q', long)]
    questions: Option<u32>,

    /// play until the question pool runs dry or you quit
    #[clap(short = 'u', long, conflicts_with_all = ["time_secs", "questions"])]
    unlimited: bool,

    /// easy, medium, hard or custom:<description>
    #[clap(short = 'd', long)]
    difficulty: Option<String>,

    /// question topic, "any" for all topics
    #[clap(short = 't', long)]
    topic: Option<String>,

    /// number of answer options per question (3, 4 or 5)
    #[clap(short = 'o', long)]
    options: Option<usize>,

    /// disable the bonus for answering quickly
    #[clap(long)]
    no_time_bonus: bool,

    /// points policy
    #[clap(long, value_enum)]
    scoring: Option<ScoringPolicy>,

    /// per-question countdown used for the time bonus
    #[clap(long)]
    question_secs: Option<u64>,

    /// name recorded on the leaderboard
    #[clap(long)]
    player: Option<String>,

    /// extra question pack (JSON) to play instead of the bundled ones
    #[clap(long)]
    pack: Option<PathBuf>,

    /// check a custom difficulty description and exit
    #[clap(long, value_name = "TEXT")]
    validate: Option<String>,

    /// print the top results and exit
    #[clap(long)]
    leaderboard: bool,

    /// write logs here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Layers the command line over the persisted settings.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(secs) = self.time_secs {
            cfg.time_secs = Some(secs);
            cfg.questions = None;
        }
        if let Some(questions) = self.questions {
            cfg.questions = Some(questions);
            cfg.time_secs = None;
        }
        if self.unlimited {
            cfg.time_secs = None;
            cfg.questions = None;
        }
        if let Some(difficulty) = &self.difficulty {
            cfg.difficulty = difficulty.clone();
        }
        if let Some(topic) = &self.topic {
            cfg.topic = topic.clone();
        }
        if let Some(options) = self.options {
            cfg.answer_options = options;
        }
        if self.no_time_bonus {
            cfg.time_bonus = false;
        }
        if let Some(scoring) = self.scoring {
            cfg.scoring = scoring;
        }
        if let Some(secs) = self.question_secs {
            cfg.question_secs = secs;
        }
        if let Some(player) = &self.player {
            cfg.player = player.clone();
        }
        cfg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Paused,
    Results,
}

#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub bank: QuestionBank,
    pub player: String,
    pub leaderboard: Option<Leaderboard>,
    pub state: AppState,
    /// Leaderboard position of the last finished game.
    pub rank: Option<usize>,
    pub now_ms: u64,
}

impl App {
    pub fn new(
        settings: SessionSettings,
        bank: QuestionBank,
        player: String,
        leaderboard: Option<Leaderboard>,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            session: Session::new(settings)?,
            bank,
            player,
            leaderboard,
            state: AppState::Playing,
            rank: None,
            now_ms: 0,
        })
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), Box<dyn Error>> {
        self.now_ms = now_ms;
        self.session.start(now_ms, &mut self.bank)?;
        self.sync_state();
        Ok(())
    }

    pub fn restart(&mut self, now_ms: u64) -> Result<(), Box<dyn Error>> {
        self.now_ms = now_ms;
        self.rank = None;
        self.state = AppState::Playing;
        self.session.restart(now_ms, &mut self.bank)?;
        self.sync_state();
        Ok(())
    }

    pub fn on_tick(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        if self.state == AppState::Playing {
            self.session.tick(now_ms, &mut self.bank);
            self.sync_state();
        }
    }

    pub fn answer(&mut self, index: usize, now_ms: u64) -> Option<AnswerFeedback> {
        self.now_ms = now_ms;
        if self.state != AppState::Playing {
            return None;
        }
        let feedback = self.session.answer(index, now_ms);
        self.sync_state();
        feedback
    }

    pub fn toggle_pause(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        match self.state {
            AppState::Playing if self.session.pause(now_ms) => self.state = AppState::Paused,
            AppState::Paused if self.session.resume(now_ms) => self.state = AppState::Playing,
            _ => {}
        }
        // pausing catches the clock up and may end a timed game
        self.sync_state();
    }

    /// Quitting mid-game abandons the session; abandoned games are not ranked.
    pub fn quit(&mut self) {
        if self.state != AppState::Results {
            self.session.abandon();
        }
    }

    fn sync_state(&mut self) {
        if self.session.is_over() && self.state != AppState::Results {
            self.state = AppState::Results;
            self.record_result();
        }
    }

    fn record_result(&mut self) {
        let summary = self.session.summary();
        info!(
            score = summary.score,
            answered = summary.answered,
            reason = ?summary.reason,
            "game finished"
        );
        if summary.reason == Some(GameOverReason::Abandoned) {
            return;
        }
        let Some(board) = self.leaderboard.as_mut() else {
            return;
        };
        let result = GameResult::from_summary(&summary, &self.player, chrono::Local::now());
        match board.record(result.clone()) {
            Ok(()) => self.rank = board.rank_of(&result),
            Err(err) => warn!(%err, path = %board.path().display(), "could not record result"),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(text) = &cli.validate {
        return print_validation(text);
    }
    if cli.leaderboard {
        return print_leaderboard(&AppDirs::results_path());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(err) = init_logging(&log_path) {
        eprintln!("logging disabled: {err}");
    }

    let store = FileConfigStore::new();
    let cfg = cli.apply(store.load());
    let settings = match cfg.to_settings() {
        Ok(settings) => settings,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err).exit();
        }
    };

    let bank = match &cli.pack {
        Some(path) => QuestionBank::new(vec![QuestionPack::load(path)?], StdRng::from_entropy()),
        None => QuestionBank::bundled()?,
    };
    let leaderboard = match Leaderboard::open(AppDirs::results_path()) {
        Ok(board) => Some(board),
        Err(err) => {
            warn!(%err, "leaderboard unavailable");
            None
        }
    };

    let clock = MonotonicClock::new();
    let mut app = App::new(settings, bank, cfg.player.clone(), leaderboard)?;
    app.start(clock.now_ms())?;
    if let Err(err) = store.save(&cfg) {
        warn!(%err, "could not save config");
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app, &clock);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

fn init_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })?;
    Ok(())
}

fn print_validation(text: &str) -> Result<(), Box<dyn Error>> {
    let description = text.strip_prefix(CUSTOM_PREFIX).unwrap_or(text);
    let validation = validate_description(description);
    if let Some(error) = &validation.error {
        eprintln!("invalid: {error}");
        std::process::exit(1);
    }

    let classification = classify_description(description);
    match classification.matched_keyword {
        Some(keyword) => println!(
            "tier: {} {} (matched \"{keyword}\")",
            classification.tier,
            classification.multiplier()
        ),
        None => println!(
            "tier: {} {} (no keyword matched)",
            classification.tier,
            classification.multiplier()
        ),
    }
    for suggestion in &validation.suggestions {
        println!("hint: {suggestion}");
    }
    Ok(())
}

fn print_leaderboard(path: &Path) -> Result<(), Box<dyn Error>> {
    let board = Leaderboard::open(path)?;
    if board.is_empty() {
        println!("no results yet");
        return Ok(());
    }
    for (idx, result) in board.top(LEADERBOARD_SIZE).iter().enumerate() {
        println!(
            "{:>2}. {:<12} {:>6} pts  {:>3.0}% acc  {} / {} / {}",
            idx + 1,
            result.player,
            result.score,
            result.accuracy(),
            result.topic,
            result.difficulty,
            result.mode,
        );
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Answer(usize),
    TogglePause,
    Restart,
    Quit,
    Ignore,
}

fn key_action(key: KeyEvent, state: AppState) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    match (key.code, state) {
        (KeyCode::Esc, _) => KeyAction::Quit,
        (KeyCode::Char(c @ '1'..='5'), AppState::Playing) => {
            KeyAction::Answer(c as usize - '1' as usize)
        }
        (KeyCode::Char('p'), AppState::Playing | AppState::Paused) => KeyAction::TogglePause,
        (KeyCode::Char('r'), AppState::Results) => KeyAction::Restart,
        (KeyCode::Char('q'), AppState::Results) => KeyAction::Quit,
        _ => KeyAction::Ignore,
    }
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    clock: &impl Clock,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            GameEvent::Tick => app.on_tick(clock.now_ms()),
            GameEvent::Resize => {}
            GameEvent::Key(key) => match key_action(key, app.state) {
                KeyAction::Answer(index) => {
                    app.answer(index, clock.now_ms());
                }
                KeyAction::TogglePause => app.toggle_pause(clock.now_ms()),
                KeyAction::Restart => app.restart(clock.now_ms())?,
                KeyAction::Quit => {
                    app.quit();
                    break;
                }
                KeyAction::Ignore => {}
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trivium::game_mode::GameModeConfig;
    use trivium::scoring::ScoreSettings;

    fn app_with(mode: GameModeConfig, leaderboard: Option<Leaderboard>) -> App {
        let settings = SessionSettings {
            mode,
            scoring: ScoreSettings {
                time_bonus: false,
                ..ScoreSettings::default()
            },
            ..SessionSettings::default()
        };
        let bank = QuestionBank::bundled_with_seed(7).unwrap();
        App::new(settings, bank, "tester".to_string(), leaderboard).unwrap()
    }

    fn correct_index(app: &App) -> usize {
        app.session
            .current_question()
            .and_then(|q| q.correct_index())
            .unwrap()
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["trivium"]);

        assert_eq!(cli.time_secs, None);
        assert_eq!(cli.questions, None);
        assert!(!cli.unlimited);
        assert!(!cli.no_time_bonus);
        assert!(cli.validate.is_none());
        assert!(!cli.leaderboard);
    }

    #[test]
    fn test_cli_flags_parse() {
        let cli = Cli::parse_from([
            "trivium",
            "-s",
            "90",
            "-d",
            "custom:phd level chemistry",
            "--topic",
            "Science",
            "-o",
            "5",
            "--scoring",
            "tiered",
            "--no-time-bonus",
        ]);
        assert_eq!(cli.time_secs, Some(90));
        assert_eq!(cli.difficulty.as_deref(), Some("custom:phd level chemistry"));
        assert_eq!(cli.topic.as_deref(), Some("Science"));
        assert_eq!(cli.options, Some(5));
        assert_eq!(cli.scoring, Some(ScoringPolicy::Tiered));
        assert!(cli.no_time_bonus);
    }

    #[test]
    fn test_cli_limits_conflict() {
        assert!(Cli::try_parse_from(["trivium", "-s", "60", "-q", "5"]).is_err());
        assert!(Cli::try_parse_from(["trivium", "-u", "-q", "5"]).is_err());
    }

    #[test]
    fn test_cli_overrides_persisted_config() {
        let saved = Config {
            time_secs: Some(60),
            questions: None,
            ..Config::default()
        };

        let cfg = Cli::parse_from(["trivium", "-q", "3", "--player", "zed"]).apply(saved.clone());
        assert_eq!(cfg.questions, Some(3));
        assert_eq!(cfg.time_secs, None);
        assert_eq!(cfg.player, "zed");

        let cfg = Cli::parse_from(["trivium", "-u"]).apply(saved.clone());
        assert_eq!(cfg.mode().unwrap(), GameModeConfig::Unlimited);

        let cfg = Cli::parse_from(["trivium"]).apply(saved.clone());
        assert_eq!(cfg, saved);
    }

    #[test]
    fn test_key_actions() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(
            key_action(key(KeyCode::Char('1')), AppState::Playing),
            KeyAction::Answer(0)
        );
        assert_eq!(
            key_action(key(KeyCode::Char('5')), AppState::Playing),
            KeyAction::Answer(4)
        );
        assert_eq!(
            key_action(key(KeyCode::Char('1')), AppState::Paused),
            KeyAction::Ignore
        );
        assert_eq!(
            key_action(key(KeyCode::Char('p')), AppState::Paused),
            KeyAction::TogglePause
        );
        assert_eq!(
            key_action(key(KeyCode::Char('r')), AppState::Playing),
            KeyAction::Ignore
        );
        assert_eq!(
            key_action(key(KeyCode::Char('r')), AppState::Results),
            KeyAction::Restart
        );
        assert_eq!(key_action(key(KeyCode::Esc), AppState::Playing), KeyAction::Quit);
        assert_eq!(
            key_action(
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                AppState::Paused
            ),
            KeyAction::Quit
        );
    }

    #[test]
    fn test_app_plays_to_results_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let board = Leaderboard::open(dir.path().join("results.csv")).unwrap();
        let mut app = app_with(
            GameModeConfig::QuestionLimited { total_questions: 2 },
            Some(board),
        );
        app.start(0).unwrap();
        assert_eq!(app.state, AppState::Playing);

        let idx = correct_index(&app);
        assert!(app.answer(idx, 1000).unwrap().is_correct);
        app.on_tick(3000);
        let idx = correct_index(&app);
        assert!(app.answer(idx, 4000).unwrap().is_correct);

        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.rank, Some(1));
        assert_eq!(app.leaderboard.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_app_pause_blocks_answers() {
        let mut app = app_with(GameModeConfig::Unlimited, None);
        app.start(0).unwrap();

        app.toggle_pause(100);
        assert_eq!(app.state, AppState::Paused);
        assert!(app.answer(0, 200).is_none());

        app.toggle_pause(300);
        assert_eq!(app.state, AppState::Playing);
        assert!(app.answer(0, 400).is_some());
    }

    #[test]
    fn test_app_quit_abandons_without_recording() {
        let dir = tempfile::tempdir().unwrap();
        let board = Leaderboard::open(dir.path().join("results.csv")).unwrap();
        let mut app = app_with(GameModeConfig::Unlimited, Some(board));
        app.start(0).unwrap();
        app.answer(0, 100);

        app.quit();
        app.on_tick(200);
        assert!(app.session.is_over());
        assert!(app.leaderboard.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_app_pause_after_time_ran_out_shows_results() {
        let mut app = app_with(GameModeConfig::TimeLimited { total_time_ms: 1000 }, None);
        app.start(0).unwrap();

        app.toggle_pause(1500);
        assert_eq!(app.state, AppState::Results);
        assert!(app.session.is_over());
    }

    #[test]
    fn test_init_logging_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("trivium.log");

        init_logging(&path).unwrap();
        info!("logging ready");
        assert!(path.exists());
    }

    #[test]
    fn test_app_restart_after_time_expired() {
        let mut app = app_with(GameModeConfig::TimeLimited { total_time_ms: 1000 }, None);
        app.start(0).unwrap();
        app.on_tick(1000);
        assert_eq!(app.state, AppState::Results);

        app.restart(5000).unwrap();
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.session.score().total_score, 0);
        assert!(app.session.current_question().is_some());
    }
}
