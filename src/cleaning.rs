use std::collections::HashSet;

use log::debug;
use regex::Regex;

use crate::models::Message;

/// Normalizes message content into whitespace-tokenizable text.
pub trait TextCleaner {
    fn clean(&self, messages: Vec<Message>) -> Vec<Message>;
}

/// Leaves content untouched, for input that is already clean.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCleaner;

impl TextCleaner for PassthroughCleaner {
    fn clean(&self, messages: Vec<Message>) -> Vec<Message> {
        messages
    }
}

impl<C: TextCleaner + ?Sized> TextCleaner for Box<C> {
    fn clean(&self, messages: Vec<Message>) -> Vec<Message> {
        (**self).clean(messages)
    }
}

const STOP_WORDS: &[&str] = &[
    // Common English stop words
    "the", "and", "for", "are", "but", "not", "you", "your", "all", "can", "had",
    "her", "was", "one", "our", "out", "get", "has", "him", "his", "how", "its",
    "may", "now", "see", "who", "did", "way", "what", "when", "where", "will",
    "with", "this", "that", "have", "from", "they", "been", "some", "very", "here",
    "just", "than", "them", "well", "were", "there", "would", "could", "should",
    "does", "done", "being", "also", "too", "even", "still", "yet", "again", "into",
    "about", "which", "their", "then", "these", "those", "only", "any", "each",
    // Chat filler
    "thanks", "thank", "please", "hello", "halo", "okay", "yes", "yeah", "hmm",
    "haha", "hehe", "wkwk", "sis", "gan", "kak", "min",
];

/// Lowercases, strips links, e-mail addresses and digits, then keeps
/// alphabetic words of at least `min_word_len` letters that are not stop words.
#[derive(Debug, Clone)]
pub struct RegexCleaner {
    link_re: Regex,
    word_re: Regex,
    stop_words: HashSet<String>,
}

impl RegexCleaner {
    pub fn new(min_word_len: usize) -> Result<Self, regex::Error> {
        let link_re = Regex::new(r"(?:https?://|www\.)\S+|\S+@\S+\.\S+")?;
        let word_re = Regex::new(&format!(r"\b[a-z]{{{},}}\b", min_word_len.max(1)))?;
        Ok(RegexCleaner {
            link_re,
            word_re,
            stop_words: STOP_WORDS.iter().map(|word| word.to_string()).collect(),
        })
    }

    pub fn with_stop_words<I, W>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        self.stop_words
            .extend(extra.into_iter().map(|word| word.into().to_lowercase()));
        self
    }

    pub fn clean_text(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let without_links = self.link_re.replace_all(&lowered, " ");
        self.word_re
            .find_iter(&without_links)
            .map(|m| m.as_str())
            .filter(|word| !self.stop_words.contains(*word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TextCleaner for RegexCleaner {
    fn clean(&self, messages: Vec<Message>) -> Vec<Message> {
        let cleaned: Vec<Message> = messages
            .iter()
            .map(|message| message.with_content(self.clean_text(&message.content)))
            .collect();
        let emptied = cleaned.iter().filter(|m| m.content.is_empty()).count();
        debug!("Cleaned {} messages, {} left without content", cleaned.len(), emptied);
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> RegexCleaner {
        RegexCleaner::new(3).expect("cleaner")
    }

    #[test]
    fn strips_links_digits_and_stop_words() {
        let text = "Hello! Where is my ORDER #1234? see https://shop.example/o/1234 or mail cs@shop.id";
        assert_eq!(cleaner().clean_text(text), "order mail");
    }

    #[test]
    fn drops_short_words() {
        assert_eq!(cleaner().clean_text("an ox is big"), "big");
        assert_eq!(RegexCleaner::new(2).unwrap().clean_text("an ox is big"), "an ox is big");
    }

    #[test]
    fn extra_stop_words_are_case_insensitive() {
        let cleaner = cleaner().with_stop_words(["Order"]);
        assert_eq!(cleaner.clean_text("order refund"), "refund");
    }

    #[test]
    fn keeps_every_message() {
        let messages = vec![
            Message::new("shop", "thanks!!"),
            Message::new("shop", "Payment failed again"),
        ];
        let cleaned = cleaner().clean(messages);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].content, "");
        assert_eq!(cleaned[1].content, "payment failed");
        assert_eq!(cleaned[1].name, "shop");
    }

    #[test]
    fn passthrough_is_identity() {
        let messages = vec![Message::new("shop", "Raw  Text")];
        assert_eq!(PassthroughCleaner.clean(messages.clone()), messages);
    }
}
