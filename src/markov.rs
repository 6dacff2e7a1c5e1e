//! Character-level Markov chain text generation.
//!
//! A [`MarkovGenerator`] keeps every `depth`-character window of its training
//! texts. Generation starts from a random window and repeatedly looks for windows
//! whose first `depth - 1` characters equal the tail of the output so far,
//! appending the last character of one of them.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::capture::NamedGenerator;
use crate::utils::{RestrError, Result};

/// The trained state of a Markov generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkovModel {
    depth: usize,
    excluded: HashSet<char>,
    texts: HashMap<String, String>,
    windows: Vec<Vec<char>>,
}

impl MarkovModel {
    /// Create an empty model of the given window width.
    ///
    /// # Errors
    /// Returns `InvalidDepth` if `depth < 2`.
    pub fn new<I: IntoIterator<Item = char>>(depth: usize, excluded: I) -> Result<Self> {
        if depth < 2 {
            return Err(RestrError::InvalidDepth(depth));
        }
        Ok(MarkovModel {
            depth,
            excluded: excluded.into_iter().collect(),
            texts: HashMap::new(),
            windows: Vec::new(),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn excluded(&self) -> &HashSet<char> {
        &self.excluded
    }

    /// Processed training texts keyed by title
    pub fn texts(&self) -> &HashMap<String, String> {
        &self.texts
    }

    pub fn text(&self, title: &str) -> Option<&str> {
        self.texts.get(title).map(String::as_str)
    }

    pub fn windows(&self) -> &[Vec<char>] {
        &self.windows
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Add a training text.
    ///
    /// Excluded characters are stripped first; the remainder is repeated
    /// `multiplier` times and every `depth`-wide window of it joins the model.
    ///
    /// # Errors
    /// - `InvalidMultiplier` if `multiplier` is zero.
    /// - `TextTooShort` if fewer than `depth` characters survive stripping.
    pub fn apply(&mut self, title: &str, text: &str, multiplier: usize) -> Result<()> {
        if multiplier == 0 {
            return Err(RestrError::InvalidMultiplier);
        }

        let cleaned: String = text.chars().filter(|c| !self.excluded.contains(c)).collect();
        let length = cleaned.chars().count();
        if length < self.depth {
            return Err(RestrError::TextTooShort {
                title: title.to_string(),
                length,
                depth: self.depth,
            });
        }

        let repeated = cleaned.repeat(multiplier);
        let chars: Vec<char> = repeated.chars().collect();
        let before = self.windows.len();
        self.windows
            .extend(chars.windows(self.depth).map(|window| window.to_vec()));
        debug!(
            "trained {:?}: {} chars, {} new windows, {} total",
            title,
            chars.len(),
            self.windows.len() - before,
            self.windows.len()
        );

        self.texts.insert(title.to_string(), repeated);
        Ok(())
    }

    /// Pick the character to follow `prefix`.
    ///
    /// Only the last `depth - 1` characters of `prefix` are considered, aligned so
    /// they end just before a window's final character. When no window matches,
    /// the first prefix character is dropped and the search repeats one position
    /// further into the windows; an exhausted prefix matches every window.
    pub fn next<R: Rng + ?Sized>(&self, prefix: &[char], rng: &mut R) -> Result<char> {
        let tail = self.depth - 1;
        let keep = prefix.len().min(tail);
        let mut prefix = &prefix[prefix.len() - keep..];
        let mut relaxation = tail - keep;

        loop {
            let candidates: Vec<char> = self
                .windows
                .iter()
                .filter(|window| window[relaxation..].starts_with(prefix))
                .map(|window| window[tail])
                .collect();
            if let Some(&c) = candidates.choose(rng) {
                return Ok(c);
            }
            if prefix.is_empty() {
                return Err(RestrError::EmptyModel);
            }
            prefix = &prefix[1..];
            relaxation += 1;
        }
    }

    /// Sample a text of at least `length` characters.
    ///
    /// The result starts with `depth - 1` characters of a random window and may
    /// overshoot `length`; it is never truncated.
    pub fn sample<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> Result<String> {
        let seed = self.windows.choose(rng).ok_or(RestrError::EmptyModel)?;
        let tail = self.depth - 1;

        let mut output: Vec<char> = seed[..tail].to_vec();
        while output.len() < length {
            let c = self.next(&output[output.len() - tail..], rng)?;
            output.push(c);
        }
        Ok(output.into_iter().collect())
    }
}

/// Markov chain text generator with its own random source
#[derive(Debug, Clone)]
pub struct MarkovGenerator {
    model: MarkovModel,
    rng: StdRng,
}

impl MarkovGenerator {
    /// Create a generator seeded from system entropy.
    ///
    /// `depth` is the window width and must be at least 2; larger values
    /// reproduce longer runs of the training text. Characters in `excluded` are
    /// stripped from every training text.
    pub fn new<I: IntoIterator<Item = char>>(depth: usize, excluded: I) -> Result<Self> {
        Ok(MarkovGenerator {
            model: MarkovModel::new(depth, excluded)?,
            rng: StdRng::from_entropy(),
        })
    }

    /// Create a generator whose samples are fully determined by `seed`
    pub fn with_seed<I: IntoIterator<Item = char>>(
        depth: usize,
        excluded: I,
        seed: u64,
    ) -> Result<Self> {
        Ok(MarkovGenerator {
            model: MarkovModel::new(depth, excluded)?,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Train on `text`, stored under `title`
    pub fn train_on(&mut self, title: &str, text: &str, multiplier: usize) -> Result<&mut Self> {
        self.model.apply(title, text, multiplier)?;
        Ok(self)
    }

    pub fn model(&self) -> &MarkovModel {
        &self.model
    }

    /// Sample one text of at least `length` characters
    pub fn sample(&mut self, length: usize) -> Result<String> {
        self.model.sample(length, &mut self.rng)
    }

    /// Create a producer yielding a fresh text of at least `length` characters
    /// on every call.
    ///
    /// The producer works on a snapshot of the current model; later training does
    /// not affect it.
    ///
    /// # Errors
    /// Returns `EmptyModel` if nothing has been trained yet.
    pub fn generate(&mut self, length: usize) -> Result<MarkovProducer> {
        if self.model.is_empty() {
            return Err(RestrError::EmptyModel);
        }
        Ok(MarkovProducer {
            model: Arc::new(self.model.clone()),
            length,
            rng: StdRng::seed_from_u64(self.rng.r#gen()),
        })
    }
}

/// Restartable text source over a trained Markov model
#[derive(Debug, Clone)]
pub struct MarkovProducer {
    model: Arc<MarkovModel>,
    length: usize,
    rng: StdRng,
}

impl MarkovProducer {
    pub fn length(&self) -> usize {
        self.length
    }

    /// Sample the next text
    pub fn produce(&mut self) -> Result<String> {
        self.model.sample(self.length, &mut self.rng)
    }
}

impl NamedGenerator for MarkovProducer {
    fn generate(&mut self) -> Result<String> {
        self.produce()
    }
}
