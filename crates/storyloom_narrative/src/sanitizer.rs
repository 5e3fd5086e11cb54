//! Text sanitization for noisy edit summaries.
//!
//! Raw edit text goes through an ordered list of removal rules, is normalized,
//! and is then split into tokens that must each pass an ordered list of
//! acceptance rules. Both rule lists are plain data so they can be inspected
//! and tested on their own.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

/// Vocabulary that shows up in nearly every edit summary and carries no story.
pub const BANNED_TERMS: &[&str] = &[
    "edit",
    "edits",
    "edited",
    "added",
    "redirect",
    "page",
    "category",
    "citation",
    "update",
    "wikidata",
    "fixed",
    "article",
    "reference",
    "references",
    "release",
    "spam",
    "class",
    "usage",
    "property",
    "monarchy",
    "duplicate",
    "uploader",
    "template",
    "user",
    "request",
    "reporting",
    "navigation",
    "discussed",
    "discussion",
    "discussions",
    "removed",
    "changed",
    "moved",
    "created",
    "deleted",
    "modified",
    "stub",
    "wiki",
    "wp",
    "talk",
    "forum",
    "archived",
    "standalone",
    "offtopic",
    "undetected",
    "file",
    "content",
    "as",
    "when",
    "the",
    "and",
    "in",
    "of",
    "to",
    "for",
    "with",
    "by",
    "at",
    "from",
];

/// Fragments of feed jargon; any token containing one is rejected.
pub const JARGON_FRAGMENTS: &[&str] = &[
    "wiki", "template", "bot", "tishreen", "albanian", "filenoah", "draftwme", "mosamp", "amp",
    "cs",
];

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

/// Sanitizer tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Shortest acceptable token
    #[serde(default = "default_min_token_length")]
    pub min_token_length: usize,

    /// Longest acceptable token
    #[serde(default = "default_max_token_length")]
    pub max_token_length: usize,

    /// Longest acceptable token when building prompt vocabulary
    #[serde(default = "default_vocabulary_max_token_length")]
    pub vocabulary_max_token_length: usize,

    /// Deployment-specific additions to [`BANNED_TERMS`]
    #[serde(default)]
    pub extra_banned_terms: Vec<String>,
}

fn default_min_token_length() -> usize {
    3
}

fn default_max_token_length() -> usize {
    20
}

fn default_vocabulary_max_token_length() -> usize {
    15
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: default_min_token_length(),
            max_token_length: default_max_token_length(),
            vocabulary_max_token_length: default_vocabulary_max_token_length(),
            extra_banned_terms: vec![],
        }
    }
}

impl SanitizerConfig {
    /// Same config with the prompt-vocabulary length bound applied.
    pub fn for_vocabulary(&self) -> Self {
        Self {
            max_token_length: self.vocabulary_max_token_length,
            ..self.clone()
        }
    }
}

/// Structural noise removed from raw text, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RemovalKind {
    /// `[[...]]` link markup
    LinkMarkup,
    /// `{{...}}` template markup
    TemplateMarkup,
    /// Absolute URLs
    Url,
    /// Runs of two or more digits
    NumericRun,
    /// ALL-CAPS acronyms of two or more letters
    Acronym,
    /// `talk:`, `user:`, `file:`, `category:`, `template:` prefixes
    NamespacePrefix,
    /// Anything that is not a word character, whitespace or hyphen
    Punctuation,
}

impl RemovalKind {
    fn pattern(self) -> &'static str {
        match self {
            RemovalKind::LinkMarkup => r"\[\[.*?\]\]",
            RemovalKind::TemplateMarkup => r"\{\{.*?\}\}",
            RemovalKind::Url => r"https?://\S+",
            RemovalKind::NumericRun => r"\d{2,}",
            RemovalKind::Acronym => r"\b[A-Z]{2,}\b",
            RemovalKind::NamespacePrefix => r"(?i)\b(?:talk|user|file|category|template):",
            RemovalKind::Punctuation => r"[^\w\s-]",
        }
    }
}

/// One compiled removal rule.
#[derive(Debug, Clone)]
pub struct RemovalRule {
    kind: RemovalKind,
    pattern: Regex,
}

impl RemovalRule {
    fn compile(kind: RemovalKind) -> Self {
        Self {
            kind,
            pattern: Regex::new(kind.pattern()).expect("Valid removal regex"),
        }
    }

    /// What this rule removes.
    pub fn kind(&self) -> RemovalKind {
        self.kind
    }

    /// Replace every match with a space so neighbouring words stay apart.
    pub fn apply(&self, text: &str) -> String {
        self.pattern.replace_all(text, " ").into_owned()
    }
}

/// Why a token was refused, in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TokenRejection {
    /// Listed in the banned-term set
    Banned,
    /// Shorter than the minimum length
    TooShort,
    /// Longer than the maximum length
    TooLong,
    /// Contains no vowel
    NoVowel,
    /// Contains four or more consecutive consonants
    ConsonantCluster,
    /// Contains a feed-jargon fragment
    Jargon,
    /// Contains something other than letters and hyphens
    InvalidCharacter,
}

type TokenCheck = fn(&Sanitizer, &str) -> bool;

/// Acceptance rules; each check returns `true` when the token must be rejected.
const TOKEN_RULES: &[(TokenRejection, TokenCheck)] = &[
    (TokenRejection::Banned, is_banned_token),
    (TokenRejection::TooShort, is_too_short),
    (TokenRejection::TooLong, is_too_long),
    (TokenRejection::NoVowel, has_no_vowel),
    (TokenRejection::ConsonantCluster, has_consonant_cluster),
    (TokenRejection::Jargon, has_jargon),
    (TokenRejection::InvalidCharacter, has_invalid_character),
];

fn is_banned_token(sanitizer: &Sanitizer, token: &str) -> bool {
    sanitizer.banned.contains(token)
}

fn is_too_short(sanitizer: &Sanitizer, token: &str) -> bool {
    token.chars().count() < sanitizer.config.min_token_length
}

fn is_too_long(sanitizer: &Sanitizer, token: &str) -> bool {
    token.chars().count() > sanitizer.config.max_token_length
}

fn has_no_vowel(_: &Sanitizer, token: &str) -> bool {
    !token.contains(VOWELS)
}

fn has_consonant_cluster(sanitizer: &Sanitizer, token: &str) -> bool {
    sanitizer.consonant_cluster.is_match(token)
}

fn has_jargon(_: &Sanitizer, token: &str) -> bool {
    JARGON_FRAGMENTS
        .iter()
        .any(|fragment| token.contains(fragment))
}

fn has_invalid_character(_: &Sanitizer, token: &str) -> bool {
    !token.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}

/// Normalized, lowercase, whitespace-collapsed text made of accepted tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SanitizedText(String);

impl SanitizedText {
    fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        Self(tokens.into_iter().collect::<Vec<_>>().join(" "))
    }

    /// The text itself.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accepted tokens in order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    /// Number of accepted tokens.
    pub fn len(&self) -> usize {
        self.tokens().count()
    }

    /// True when nothing survived sanitization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take ownership of the text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic, I/O-free text cleaner.
///
/// # Examples
///
/// ```
/// use storyloom_narrative::Sanitizer;
///
/// let sanitizer = Sanitizer::default();
/// let text = sanitizer.sanitize("Added [[Category:Test]] information about ancient temples 123");
/// assert_eq!(text.as_str(), "information about ancient temples");
/// ```
#[derive(Debug, Clone)]
pub struct Sanitizer {
    config: SanitizerConfig,
    rules: Vec<RemovalRule>,
    banned: HashSet<String>,
    consonant_cluster: Regex,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(SanitizerConfig::default())
    }
}

impl Sanitizer {
    /// Compile a sanitizer from its configuration.
    pub fn new(config: SanitizerConfig) -> Self {
        use strum::IntoEnumIterator;

        let banned = BANNED_TERMS
            .iter()
            .map(|term| term.to_string())
            .chain(
                config
                    .extra_banned_terms
                    .iter()
                    .map(|term| term.trim().to_lowercase()),
            )
            .collect();

        Self {
            rules: RemovalKind::iter().map(RemovalRule::compile).collect(),
            banned,
            consonant_cluster: Regex::new(r"[bcdfghjklmnpqrstvwxyz]{4,}")
                .expect("Valid consonant regex"),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    /// Removal rules in application order.
    pub fn rules(&self) -> &[RemovalRule] {
        &self.rules
    }

    /// True when `word` is in the banned-term set (case-insensitive).
    pub fn is_banned(&self, word: &str) -> bool {
        self.banned.contains(&word.to_lowercase())
    }

    /// Apply the removal rules, then collapse whitespace, trim and lowercase.
    pub fn clean(&self, raw: &str) -> String {
        let stripped = self
            .rules
            .iter()
            .fold(raw.to_string(), |text, rule| rule.apply(&text));

        stripped
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Run the acceptance rules against a single token.
    ///
    /// # Errors
    ///
    /// Returns the first rule the token fails.
    pub fn check_token(&self, token: &str) -> Result<(), TokenRejection> {
        let token = token.to_lowercase();
        match TOKEN_RULES
            .iter()
            .find(|(_, rejects)| rejects(self, &token))
        {
            Some((reason, _)) => Err(*reason),
            None => Ok(()),
        }
    }

    /// True when the token passes every acceptance rule.
    pub fn is_acceptable_token(&self, token: &str) -> bool {
        self.check_token(token).is_ok()
    }

    /// Clean `raw` and keep only acceptable tokens, in order.
    #[instrument(skip(self, raw), fields(raw_len = raw.len()))]
    pub fn sanitize(&self, raw: &str) -> SanitizedText {
        let cleaned = self.clean(raw);
        let accepted = cleaned.split_whitespace().filter(|token| {
            match self.check_token(token) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(token, %reason, "Rejected token");
                    false
                }
            }
        });
        SanitizedText::from_tokens(accepted)
    }

    /// Like [`Sanitizer::sanitize`], but each token appears once, at its first
    /// position.
    pub fn vocabulary(&self, raw: &str) -> SanitizedText {
        let text = self.sanitize(raw);
        let mut seen = HashSet::new();
        SanitizedText::from_tokens(text.tokens().filter(|token| seen.insert(*token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_follow_declared_order() {
        use strum::IntoEnumIterator;

        let sanitizer = Sanitizer::default();
        let kinds: Vec<_> = sanitizer.rules().iter().map(RemovalRule::kind).collect();
        assert_eq!(kinds, RemovalKind::iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_acronyms_are_removed_before_lowercasing() {
        let sanitizer = Sanitizer::default();
        assert_eq!(sanitizer.clean("NATO summit"), "summit");
    }

    #[test]
    fn test_rejection_order() {
        let sanitizer = Sanitizer::default();
        // banned wins over every later rule
        assert_eq!(sanitizer.check_token("as"), Err(TokenRejection::Banned));
        assert_eq!(sanitizer.check_token("ox"), Err(TokenRejection::TooShort));
        assert_eq!(sanitizer.check_token("strengths"), Err(TokenRejection::ConsonantCluster));
    }
}
