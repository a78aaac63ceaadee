//! Difficulty labels and the keyword classifier that turns them into scoring
//! multipliers.
//!
//! A label is either one of the standard levels or a free-text description
//! tagged with [`CUSTOM_PREFIX`]. Labels are parsed once at the boundary and
//! carried as [`DifficultyLabel`] from then on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TriviaError};

pub const CUSTOM_PREFIX: &str = "custom:";
pub const MIN_DESCRIPTION_CHARS: usize = 3;
pub const MAX_DESCRIPTION_CHARS: usize = 200;
pub const EMPTY_DESCRIPTION_MESSAGE: &str = "Please enter a difficulty description";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StandardDifficulty {
    Easy,
    Medium,
    Hard,
}

impl StandardDifficulty {
    pub const ALL: [StandardDifficulty; 3] = [
        StandardDifficulty::Easy,
        StandardDifficulty::Medium,
        StandardDifficulty::Hard,
    ];

    /// The tier whose multiplier this level shares.
    pub fn tier(self) -> Tier {
        match self {
            StandardDifficulty::Easy => Tier::Elementary,
            StandardDifficulty::Medium => Tier::HighSchool,
            StandardDifficulty::Hard => Tier::University,
        }
    }

    pub fn multiplier(self) -> DifficultyMultiplier {
        self.tier().multiplier()
    }
}

/// Keyword tiers, listed in match precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum_macros::Display)]
pub enum Tier {
    #[strum(to_string = "Expert")]
    Expert,
    #[strum(to_string = "University")]
    University,
    #[strum(to_string = "High school")]
    HighSchool,
    #[strum(to_string = "Elementary")]
    Elementary,
}

impl Tier {
    pub const PRECEDENCE: [Tier; 4] = [
        Tier::Expert,
        Tier::University,
        Tier::HighSchool,
        Tier::Elementary,
    ];

    /// Tier used when a custom description names no keyword.
    pub const FALLBACK: Tier = Tier::University;

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Tier::Expert => &[
                "expert",
                "professional",
                "advanced",
                "phd",
                "doctorate",
                "master",
                "graduate",
            ],
            Tier::University => &["university", "college", "bachelor", "undergraduate"],
            Tier::HighSchool => &["high school", "secondary", "intermediate"],
            Tier::Elementary => &["elementary", "beginner", "basic", "simple", "easy"],
        }
    }

    pub fn multiplier(self) -> DifficultyMultiplier {
        DifficultyMultiplier(match self {
            Tier::Expert => 2.5,
            Tier::University => 2.0,
            Tier::HighSchool => 1.5,
            Tier::Elementary => 1.0,
        })
    }
}

/// Scoring multiplier derived from a difficulty label.
///
/// Only obtainable through [`Tier::multiplier`], so it is always one of the
/// tier values and never zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct DifficultyMultiplier(f64);

impl DifficultyMultiplier {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for DifficultyMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{:.1}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DifficultyLabel {
    Standard(StandardDifficulty),
    /// Trimmed free-text description, never empty.
    Custom(String),
}

impl DifficultyLabel {
    pub fn custom(description: &str) -> Result<Self> {
        let trimmed = description.trim();
        if trimmed.is_empty() {
            return Err(TriviaError::Validation(EMPTY_DESCRIPTION_MESSAGE.to_string()));
        }
        Ok(DifficultyLabel::Custom(trimmed.to_string()))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, DifficultyLabel::Custom(_))
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            DifficultyLabel::Standard(_) => None,
            DifficultyLabel::Custom(text) => Some(text),
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            DifficultyLabel::Standard(level) => level.tier(),
            DifficultyLabel::Custom(text) => classify_description(text).tier,
        }
    }

    pub fn multiplier(&self) -> DifficultyMultiplier {
        classify(self)
    }

    /// Form validation for the label: standard levels always pass.
    pub fn validate(&self) -> ValidationResult {
        match self {
            DifficultyLabel::Standard(_) => ValidationResult::valid(),
            DifficultyLabel::Custom(text) => validate_description(text),
        }
    }
}

impl Default for DifficultyLabel {
    fn default() -> Self {
        DifficultyLabel::Standard(StandardDifficulty::Medium)
    }
}

impl From<StandardDifficulty> for DifficultyLabel {
    fn from(level: StandardDifficulty) -> Self {
        DifficultyLabel::Standard(level)
    }
}

impl FromStr for DifficultyLabel {
    type Err = TriviaError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(description) = s.strip_prefix(CUSTOM_PREFIX) {
            return DifficultyLabel::custom(description);
        }

        match s.to_lowercase().as_str() {
            "easy" => Ok(StandardDifficulty::Easy.into()),
            "medium" => Ok(StandardDifficulty::Medium.into()),
            "hard" => Ok(StandardDifficulty::Hard.into()),
            _ => Err(TriviaError::Validation(format!(
                "Unknown difficulty \"{s}\"; expected easy, medium, hard or {CUSTOM_PREFIX}<description>"
            ))),
        }
    }
}

impl TryFrom<String> for DifficultyLabel {
    type Error = TriviaError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DifficultyLabel> for String {
    fn from(label: DifficultyLabel) -> Self {
        label.to_string()
    }
}

impl fmt::Display for DifficultyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifficultyLabel::Standard(level) => write!(f, "{level}"),
            DifficultyLabel::Custom(text) => write!(f, "{CUSTOM_PREFIX}{text}"),
        }
    }
}

/// Outcome of classifying a free-text description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub tier: Tier,
    /// The keyword that decided the tier, `None` when the fallback applied.
    pub matched_keyword: Option<&'static str>,
}

impl Classification {
    pub fn multiplier(&self) -> DifficultyMultiplier {
        self.tier.multiplier()
    }

    pub fn is_fallback(&self) -> bool {
        self.matched_keyword.is_none()
    }
}

pub fn classify(label: &DifficultyLabel) -> DifficultyMultiplier {
    match label {
        DifficultyLabel::Standard(level) => level.multiplier(),
        DifficultyLabel::Custom(text) => classify_description(text).multiplier(),
    }
}

pub fn classify_description(text: &str) -> Classification {
    let tokens = tokenize(text);
    match match_keyword(&tokens) {
        Some((tier, keyword)) => Classification {
            tier,
            matched_keyword: Some(keyword),
        },
        None => Classification {
            tier: Tier::FALLBACK,
            matched_keyword: None,
        },
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| c.is_ascii_punctuation())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn match_keyword(tokens: &[String]) -> Option<(Tier, &'static str)> {
    Tier::PRECEDENCE.iter().find_map(|&tier| {
        tier.keywords()
            .iter()
            .find(|keyword| contains_phrase(tokens, keyword))
            .map(|&keyword| (tier, keyword))
    })
}

// Multi-word keywords must appear as consecutive tokens.
fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    tokens
        .windows(words.len())
        .any(|window| window.iter().zip(&words).all(|(token, word)| token == word))
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
    /// Non-blocking hints; present only on valid input.
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(message.into()),
            suggestions: Vec::new(),
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(message) if !self.is_valid => Err(TriviaError::Validation(message)),
            _ => Ok(()),
        }
    }
}

/// Form validation for a custom difficulty description.
///
/// Length is measured in characters on the trimmed raw text. A description
/// without any tier keyword is still valid but carries suggestions.
pub fn validate_description(text: &str) -> ValidationResult {
    let trimmed = text.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        return ValidationResult::invalid(EMPTY_DESCRIPTION_MESSAGE);
    }
    if length < MIN_DESCRIPTION_CHARS {
        return ValidationResult::invalid(format!(
            "Difficulty description must be at least {MIN_DESCRIPTION_CHARS} characters"
        ));
    }
    if length > MAX_DESCRIPTION_CHARS {
        return ValidationResult::invalid(format!(
            "Difficulty description must be at most {MAX_DESCRIPTION_CHARS} characters"
        ));
    }

    let mut result = ValidationResult::valid();
    if classify_description(trimmed).is_fallback() {
        result.suggestions = vec![
            "Add a level keyword such as \"beginner\", \"high school\", \"university\" or \"expert\""
                .to_string(),
            format!(
                "Without a level keyword this description scores as {} ({})",
                Tier::FALLBACK,
                Tier::FALLBACK.multiplier()
            ),
        ];
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn custom(text: &str) -> DifficultyLabel {
        DifficultyLabel::custom(text).unwrap()
    }

    #[test]
    fn standard_labels_use_fixed_multipliers() {
        for _ in 0..3 {
            assert_eq!(classify(&StandardDifficulty::Easy.into()).value(), 1.0);
            assert_eq!(classify(&StandardDifficulty::Medium.into()).value(), 1.5);
            assert_eq!(classify(&StandardDifficulty::Hard.into()).value(), 2.0);
        }
    }

    #[test]
    fn expert_keyword_wins() {
        let label = custom("expert level quantum physics");
        assert_eq!(label.tier(), Tier::Expert);
        assert_eq!(label.multiplier().value(), 2.5);
    }

    #[test]
    fn unmatched_text_falls_back_to_university() {
        let classification = classify_description("just a topic");
        assert!(classification.is_fallback());
        assert_eq!(classification.tier, Tier::University);
        assert_eq!(classification.multiplier().value(), 2.0);
    }

    #[test]
    fn university_matches_regardless_of_case_and_surroundings() {
        for text in [
            "university",
            "First year UNIVERSITY chemistry",
            "stuff you'd see at University, roughly",
        ] {
            assert_eq!(classify(&custom(text)).value(), 2.0, "{text}");
            assert_eq!(classify_description(text).matched_keyword, Some("university"));
        }
    }

    #[test]
    fn precedence_is_by_tier_not_position() {
        let classification = classify_description("beginner friendly but advanced topics");
        assert_eq!(classification.tier, Tier::Expert);
        assert_eq!(classification.matched_keyword, Some("advanced"));

        let classification = classify_description("easy college algebra");
        assert_eq!(classification.tier, Tier::University);
    }

    #[test]
    fn high_school_needs_both_words_in_order() {
        assert_eq!(classify_description("high school biology").tier, Tier::HighSchool);
        assert_eq!(classify_description("High-School biology").tier, Tier::University);
        assert!(classify_description("school is high").is_fallback());
        assert_eq!(classify_description("basic stuff").tier, Tier::Elementary);
    }

    #[test]
    fn keywords_match_whole_tokens_only() {
        assert!(classify_description("masterful cooking").is_fallback());
        assert_eq!(classify_description("master chef").tier, Tier::Expert);
    }

    #[test]
    fn parse_standard_and_custom_labels() {
        assert_eq!(
            "hard".parse::<DifficultyLabel>().unwrap(),
            DifficultyLabel::Standard(StandardDifficulty::Hard)
        );
        assert_eq!(
            " Easy ".parse::<DifficultyLabel>().unwrap(),
            DifficultyLabel::Standard(StandardDifficulty::Easy)
        );
        assert_eq!(
            "custom:  phd chemistry ".parse::<DifficultyLabel>().unwrap(),
            DifficultyLabel::Custom("phd chemistry".into())
        );
    }

    #[test]
    fn parse_rejects_empty_custom_and_unknown_labels() {
        assert_matches!(
            "custom:   ".parse::<DifficultyLabel>(),
            Err(TriviaError::Validation(msg)) if msg == EMPTY_DESCRIPTION_MESSAGE
        );
        assert_matches!(
            "extreme".parse::<DifficultyLabel>(),
            Err(TriviaError::Validation(_))
        );
    }

    #[test]
    fn label_display_roundtrips_through_serde() {
        let label = custom("graduate level economics");
        assert_eq!(label.to_string(), "custom:graduate level economics");

        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(json, "\"custom:graduate level economics\"");
        let back: DifficultyLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);

        let medium: DifficultyLabel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(medium, DifficultyLabel::default());
    }

    #[test]
    fn validate_empty_text() {
        let result = validate_description("");
        assert!(!result.is_valid);
        assert_eq!(result.error.as_deref(), Some(EMPTY_DESCRIPTION_MESSAGE));

        let result = validate_description("    ");
        assert_eq!(result.error.as_deref(), Some(EMPTY_DESCRIPTION_MESSAGE));
    }

    #[test]
    fn validate_length_bounds() {
        assert!(!validate_description("ab").is_valid);
        assert!(validate_description("abc").is_valid);
        assert!(validate_description(&"a".repeat(200)).is_valid);

        let result = validate_description(&"a".repeat(201));
        assert!(!result.is_valid);
        assert!(result.error.unwrap().contains("200"));
    }

    #[test]
    fn validate_measures_trimmed_raw_text() {
        assert!(!validate_description("  ab  ").is_valid);
        assert!(!validate_description(" !! ").is_valid);
        assert!(!validate_description(" .. ").is_valid);
        // Punctuation counts toward length; it just matches no keyword.
        let result = validate_description("?!?");
        assert!(result.is_valid);
        assert!(!result.suggestions.is_empty());
    }

    #[test]
    fn validate_keyword_text_has_no_suggestions() {
        let result = validate_description("beginner cooking");
        assert!(result.is_valid);
        assert_eq!(result.error, None);
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn validate_unmatched_text_is_valid_with_hints() {
        let result = validate_description("medieval castles");
        assert!(result.is_valid);
        assert_eq!(result.error, None);
        assert_eq!(result.suggestions.len(), 2);
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn into_result_surfaces_validation_error() {
        assert_matches!(
            validate_description("ab").into_result(),
            Err(TriviaError::Validation(_))
        );
    }

    #[test]
    fn standard_labels_always_validate() {
        for level in StandardDifficulty::ALL {
            assert!(DifficultyLabel::from(level).validate().is_valid);
        }
        assert!(!custom("ab").validate().is_valid);
    }
}
