//! JSON profiles describing a ready-to-use pattern generator.
//!
//! ```json
//! {
//!   "seed": 7,
//!   "config": { "max_repeat": 20 },
//!   "captures": {
//!     "word": { "type": "choices", "values": ["alpha", "beta"] },
//!     "prose": {
//!       "type": "markov", "depth": 3, "exclude": " ,", "length": 25,
//!       "texts": [{ "title": "t1", "text": "I love sweets", "multiplier": 1 }]
//!     }
//!   }
//! }
//! ```

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::one_of_seeded;
use crate::interpreter::{GeneratorConfig, PatternGenerator};
use crate::markov::MarkovGenerator;
use crate::utils::{RestrError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationProfile {
    /// Fixes every random choice when present
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub config: GeneratorConfig,
    /// Capture name to generator source
    #[serde(default)]
    pub captures: BTreeMap<String, CaptureSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CaptureSource {
    /// One of a fixed list of strings
    Choices { values: Vec<String> },
    /// Markov chain text trained on the given texts
    Markov {
        depth: usize,
        #[serde(default)]
        exclude: String,
        length: usize,
        texts: Vec<TrainingText>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingText {
    pub title: String,
    /// Inline text
    #[serde(default)]
    pub text: Option<String>,
    /// File to read the text from
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_multiplier")]
    pub multiplier: usize,
}

fn default_multiplier() -> usize {
    1
}

impl TrainingText {
    fn load(&self, base: Option<&Path>) -> Result<String> {
        match (&self.text, &self.file) {
            (Some(text), None) => Ok(text.clone()),
            (None, Some(file)) => {
                let path = match base {
                    Some(base) if file.is_relative() => base.join(file),
                    _ => file.clone(),
                };
                Ok(fs::read_to_string(path)?)
            }
            _ => Err(RestrError::InvalidProfile(format!(
                "training text {:?} needs exactly one of \"text\" or \"file\"",
                self.title
            ))),
        }
    }
}

impl GenerationProfile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a profile from a file.
    ///
    /// Relative training files resolve against the working directory unless the
    /// profile is built with [`build_relative_to`](Self::build_relative_to).
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Build a pattern generator with every capture source registered
    pub fn build(&self) -> Result<PatternGenerator> {
        self.build_relative_to(None)
    }

    /// Like [`build`](Self::build), resolving relative training files against `base`
    pub fn build_relative_to(&self, base: Option<&Path>) -> Result<PatternGenerator> {
        let mut generator = match self.seed {
            Some(seed) => {
                PatternGenerator::from_rng(StdRng::seed_from_u64(seed), self.config.clone())
            }
            None => PatternGenerator::with_config(self.config.clone()),
        };

        for (name, source) in &self.captures {
            let seed = generator.derive_seed();
            match source {
                CaptureSource::Choices { values } => {
                    let choice =
                        one_of_seeded(values.iter().cloned(), StdRng::seed_from_u64(seed))?;
                    generator.register(name, choice);
                }
                CaptureSource::Markov {
                    depth,
                    exclude,
                    length,
                    texts,
                } => {
                    if texts.is_empty() {
                        return Err(RestrError::InvalidProfile(format!(
                            "markov capture {:?} has no training texts",
                            name
                        )));
                    }
                    let mut markov = MarkovGenerator::with_seed(*depth, exclude.chars(), seed)?;
                    for text in texts {
                        markov.train_on(&text.title, &text.load(base)?, text.multiplier)?;
                    }
                    generator.register(name, markov.generate(*length)?);
                }
            }
            debug!("registered capture {:?}", name);
        }

        Ok(generator)
    }
}
