use chrono::Local;
use tempfile::tempdir;

use trivium::config::{Config, ConfigStore, FileConfigStore};
use trivium::game_mode::GameModeConfig;
use trivium::leaderboard::{GameResult, Leaderboard};
use trivium::question::{QuestionBank, QuestionPack};
use trivium::scoring::ScoringPolicy;
use trivium::Session;

/// Saved settings drive a session whose result lands on the leaderboard.
#[test]
fn saved_config_plays_and_records() {
    let dir = tempdir().unwrap();
    let store = FileConfigStore::with_path(dir.path().join("config.json"));
    store
        .save(&Config {
            time_secs: None,
            questions: Some(2),
            difficulty: "custom:university level geography".to_string(),
            topic: "geography".to_string(),
            answer_options: 3,
            time_bonus: false,
            scoring: ScoringPolicy::Tiered,
            question_secs: 20,
            player: "ana".to_string(),
        })
        .unwrap();

    let cfg = store.load();
    let settings = cfg.to_settings().unwrap();
    assert_eq!(
        settings.mode,
        GameModeConfig::QuestionLimited { total_questions: 2 }
    );

    let mut bank = QuestionBank::bundled_with_seed(42).unwrap();
    let mut session = Session::new(settings).unwrap();
    session.start(0, &mut bank).unwrap();

    let question = session.current_question().unwrap().clone();
    assert!(question.topic.eq_ignore_ascii_case("geography"));
    assert_eq!(question.answers.len(), 3);
    assert_eq!(question.difficulty.to_string(), "custom:university level geography");

    let first = session.answer(question.correct_index().unwrap(), 1000).unwrap();
    // tiered policy: university tier is worth 30 flat
    assert_eq!(first.score.points_awarded, 30);

    session.tick(3000, &mut bank);
    let next = session.current_question().unwrap().clone();
    assert_ne!(next.question, question.question);
    session.answer(next.correct_index().unwrap(), 4000).unwrap();
    assert!(session.is_over());

    let results = dir.path().join("results.csv");
    let mut board = Leaderboard::open(&results).unwrap();
    let result = GameResult::from_summary(&session.summary(), &cfg.player, Local::now());
    board.record(result.clone()).unwrap();

    let reloaded = Leaderboard::open(&results).unwrap();
    assert_eq!(reloaded.len(), 1);
    let top = reloaded.top(10);
    assert_eq!(top[0].player, "ana");
    assert_eq!(top[0].score, 60);
    assert_eq!(top[0].mode, "2 questions");
    assert_eq!(top[0].correct, 2);
}

#[test]
fn custom_pack_from_disk_is_served() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cats.json");
    std::fs::write(
        &path,
        r#"{
            "topic": "Cats",
            "questions": [
                {
                    "question": "How many lives does a cat proverbially have?",
                    "answers": [
                        {"text": "Nine", "isCorrect": true},
                        {"text": "Seven", "isCorrect": false},
                        {"text": "Three", "isCorrect": false},
                        {"text": "One", "isCorrect": false}
                    ],
                    "difficulty": "easy"
                }
            ]
        }"#,
    )
    .unwrap();

    let pack = QuestionPack::load(&path).unwrap();
    let bank = QuestionBank::new(vec![pack], rand::SeedableRng::seed_from_u64(1));
    assert_eq!(bank.topics(), vec!["Cats".to_string()]);
    assert_eq!(bank.len(), 1);
}
