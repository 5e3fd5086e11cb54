//! Tests for edit-text sanitization and token acceptance.

use storyloom_narrative::{Sanitizer, SanitizerConfig, TokenRejection};

#[test]
fn test_token_acceptance_basics() {
    let sanitizer = Sanitizer::default();

    assert!(!sanitizer.is_acceptable_token("edit"));
    assert!(!sanitizer.is_acceptable_token("xyz"));
    assert!(sanitizer.is_acceptable_token("castle"));
    assert!(sanitizer.is_acceptable_token("Castle"));
}

#[test]
fn test_token_rejection_reasons() {
    let sanitizer = Sanitizer::default();

    assert_eq!(sanitizer.check_token("template"), Err(TokenRejection::Banned));
    assert_eq!(sanitizer.check_token("rhythm"), Err(TokenRejection::NoVowel));
    assert_eq!(
        sanitizer.check_token("internationalizations"),
        Err(TokenRejection::TooLong)
    );
    assert_eq!(sanitizer.check_token("bottle"), Err(TokenRejection::Jargon));
    assert_eq!(sanitizer.check_token("camping"), Err(TokenRejection::Jargon));
    assert_eq!(
        sanitizer.check_token("snake_case"),
        Err(TokenRejection::InvalidCharacter)
    );
    assert_eq!(sanitizer.check_token("well-known"), Ok(()));
}

#[test]
fn test_structural_noise_removed() {
    let sanitizer = Sanitizer::default();

    assert_eq!(
        sanitizer
            .sanitize("Added [[Category:Test]] information about ancient temples 123")
            .as_str(),
        "information about ancient temples"
    );
    assert_eq!(
        sanitizer
            .sanitize("{{cite web}} see https://example.com/x castle walls")
            .as_str(),
        "see castle walls"
    );
    assert_eq!(
        sanitizer.sanitize("Talk:Dragons are fierce creatures").as_str(),
        "dragons are fierce creatures"
    );
    assert_eq!(
        sanitizer.sanitize("NASA launched rockets").as_str(),
        "launched rockets"
    );
}

#[test]
fn test_sanitize_is_deterministic_and_markup_free() {
    let sanitizer = Sanitizer::default();
    let inputs = [
        "[[Foo|bar]] {{Infobox castle}} http://a.b/c?d=e",
        "Reverted edits by [[Special:Contributions/1.2.3.4]] to last version",
        "/* History */ expanded section on medieval {{citation needed}} towers",
        "https://en.wikipedia.org/wiki/Dragon [[File:x.png]] golden hoard",
        "",
    ];

    for input in inputs {
        let first = sanitizer.sanitize(input);
        let second = sanitizer.sanitize(input);
        assert_eq!(first, second);

        let text = first.as_str();
        assert!(!text.contains("[["), "{text}");
        assert!(!text.contains("{{"), "{text}");
        assert!(!text.contains("http"), "{text}");
        assert_eq!(text, text.to_lowercase());
        assert!(!text.contains("  "));
    }
}

#[test]
fn test_zero_tokens_is_not_an_error() {
    let sanitizer = Sanitizer::default();
    let text = sanitizer.sanitize("Added category, fixed template 2024");

    assert!(text.is_empty());
    assert_eq!(text.len(), 0);
}

#[test]
fn test_vocabulary_deduplicates_in_first_occurrence_order() {
    let sanitizer = Sanitizer::default();
    let vocabulary = sanitizer.vocabulary("temples ancient temples rituals ancient");

    assert_eq!(vocabulary.as_str(), "temples ancient rituals");
    assert_eq!(
        vocabulary.tokens().collect::<Vec<_>>(),
        vec!["temples", "ancient", "rituals"]
    );
}

#[test]
fn test_vocabulary_length_bound() {
    let config = SanitizerConfig::default();
    let general = Sanitizer::new(config.clone());
    let vocabulary = Sanitizer::new(config.for_vocabulary());

    // 16 letters: inside the general bound, outside the prompt bound
    assert!(general.is_acceptable_token("extraterrestrial"));
    assert_eq!(
        vocabulary.check_token("extraterrestrial"),
        Err(TokenRejection::TooLong)
    );
}

#[test]
fn test_extra_banned_terms() {
    let sanitizer = Sanitizer::new(SanitizerConfig {
        extra_banned_terms: vec![" Castle ".to_string()],
        ..SanitizerConfig::default()
    });

    assert!(sanitizer.is_banned("castle"));
    assert_eq!(sanitizer.sanitize("castle walls").as_str(), "walls");
}
