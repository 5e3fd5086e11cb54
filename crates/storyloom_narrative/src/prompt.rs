//! Prompt construction for phrase synthesis.

use crate::SanitizedText;

/// One worked example shown to the model.
struct FewShot {
    story: &'static str,
    words: &'static str,
    phrase: &'static str,
}

const FEW_SHOTS: &[FewShot] = &[
    FewShot {
        story: "The dragon slept quietly",
        words: "armor, weapons",
        phrase: "while armor gathered ancient dust",
    },
    FewShot {
        story: "She opened the book",
        words: "compartments, furniture",
        phrase: "finding compartments behind old walls",
    },
    FewShot {
        story: "The explorer found artifacts",
        words: "temples, rituals",
        phrase: "inside temples of sacred light",
    },
];

/// The last `n` whitespace tokens of `text`, space-joined.
///
/// # Examples
///
/// ```
/// use storyloom_narrative::story_tail;
///
/// assert_eq!(story_tail("a b c d", 2), "c d");
/// assert_eq!(story_tail("a b", 10), "a b");
/// ```
pub fn story_tail(text: &str, n: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let start = tokens.len().saturating_sub(n);
    tokens[start..].join(" ")
}

/// Directive prompt asking for one short continuation that uses exactly one
/// candidate word.
pub fn build_prompt(tail: &str, vocabulary: &SanitizedText) -> String {
    let story = if tail.trim().is_empty() {
        "(the story has not started yet)"
    } else {
        tail.trim()
    };
    let words = vocabulary.tokens().collect::<Vec<_>>().join(", ");

    let mut prompt = format!(
        "Continue a story one short phrase at a time.\n\n\
         Story so far: \"{story}\"\n\
         Available words (MUST use exactly one): {words}\n\n\
         Rules:\n\
         - Write 4 to 6 words that continue the story naturally\n\
         - Use exactly one of the available words\n\
         - Use only simple, common words otherwise\n\
         - No labels, quotes or punctuation\n\n\
         Examples:\n"
    );

    for shot in FEW_SHOTS {
        prompt.push_str(&format!(
            "Story: \"{}\" | Words: {} -> {}\n",
            shot.story, shot.words, shot.phrase
        ));
    }

    prompt.push_str("\nPhrase:");
    prompt
}
