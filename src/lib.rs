//! Restr generates random strings that match regular expressions.
//!
//! Patterns are parsed with `regex-syntax` and walked by a [`PatternGenerator`],
//! which picks characters, repetition counts and alternation branches at random.
//! Named capture groups whose body is a repeated `.` can be bound to external
//! generators, for example a [`MarkovGenerator`] trained on sample prose, so that
//! structured data and chain-generated text compose inside one pattern.
//!
//! # Example
//!
//! ```rust
//! use restr::{MarkovGenerator, PatternGenerator};
//!
//! let mut generator = PatternGenerator::with_seed(7);
//! let id = generator.generate(r"[A-Z]{3}-\d{4}").unwrap();
//! assert_eq!(id.len(), 8);
//!
//! let mut markov = MarkovGenerator::with_seed(3, [' ', ','], 7).unwrap();
//! markov
//!     .train_on("t1", "Tiny love is my favorite toy, I love it and cannot live without it", 1)
//!     .unwrap();
//! generator.register("note", markov.generate(25).unwrap());
//!
//! let text = generator.generate(r"(?P<note>.{10,25})").unwrap();
//! assert!((10..=25).contains(&text.chars().count()));
//! ```

pub mod capture;
pub mod charset;
pub mod config;
pub mod interpreter;
pub mod markov;
pub mod pattern;
pub mod utils;

pub use capture::{CaptureRegistry, Choice, NamedGenerator, one_of};
pub use config::{CaptureSource, GenerationProfile, TrainingText};
pub use interpreter::{GeneratorConfig, InterpretationContext, PatternGenerator};
pub use markov::{MarkovGenerator, MarkovModel, MarkovProducer};
pub use pattern::{PatternNode, full_match};
pub use utils::{RestrError, Result};
