//! Secret word selection.
//!
//! The curated list is the default bank; a deployment can swap in its own
//! newline-separated list. Draws are uniform and never exclude earlier picks.

use crate::game::{GameError, GameResult, RandomSource};
use std::path::Path;

pub const CURATED_WORDS: &[&str] = &[
    "Apple", "Banana", "Carrot", "Donut", "Eggplant", "Fig", "Grape", "Honeydew",
    "Internet", "Java", "Kiwi", "Lemon", "Mango", "Nectarine", "Orange", "Peach",
    "Quantum", "Raspberry", "Strawberry", "Tomato", "Ugli Fruit", "Vanilla", "Watermelon",
    "Xigua", "Yam", "Zucchini", "Sun", "Moon", "Star", "Planet", "Comet", "Galaxy",
    "Nebula", "Orbit", "Gravity", "Telescope", "Rocket", "Astronaut", "Alien", "Earth",
    "Mars", "Jupiter", "Saturn", "Venus", "Mercury", "Neptune", "Uranus", "Pluto",
    "Dog", "Cat", "Fish", "Bird", "Lion", "Tiger", "Bear", "Elephant", "Monkey",
    "Giraffe", "Zebra", "Kangaroo", "Penguin", "Dolphin", "Whale", "Shark", "Octopus",
    "Car", "Bicycle", "Motorcycle", "Bus", "Train", "Airplane", "Boat", "Submarine",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBank {
    words: Vec<String>,
}

impl Default for WordBank {
    fn default() -> Self {
        Self::curated()
    }
}

impl WordBank {
    pub fn curated() -> Self {
        Self {
            words: CURATED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Build a bank from arbitrary words. Blank entries are dropped; at least one must remain.
    pub fn new<I, S>(words: I) -> GameResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Err(GameError::InvalidInput(
                "word bank needs at least one word".to_string(),
            ));
        }
        Ok(Self { words })
    }

    /// Load a newline-separated word list
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::new(text.lines())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn pick_random_word<R: RandomSource + ?Sized>(&self, rng: &mut R) -> &str {
        &self.words[rng.pick_index(self.words.len())]
    }
}
