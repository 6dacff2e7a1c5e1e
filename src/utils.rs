use std::io;
use thiserror::Error;

/// Custom error types for pattern and Markov generation
#[derive(Error, Debug)]
pub enum RestrError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Pattern syntax error: {0}")]
    PatternSyntax(#[from] regex_syntax::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Malformed pattern tree: {0}")]
    PatternStructure(String),

    #[error("Repeat bounds inverted: max {max} is less than min {min}")]
    RepeatBounds { min: usize, max: usize },

    #[error("Markov depth must be at least 2, got {0}")]
    InvalidDepth(usize),

    #[error("Training multiplier must be at least 1")]
    InvalidMultiplier,

    #[error("Training text {title:?} has {length} usable characters, depth {depth} needs at least as many")]
    TextTooShort {
        title: String,
        length: usize,
        depth: usize,
    },

    #[error("Markov model is empty")]
    EmptyModel,

    #[error("Generator for capture {0:?} returned an empty string before reaching the minimum length")]
    EmptyCaptureGenerator(String),

    #[error("Choice generator needs at least one value")]
    EmptyChoices,

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, RestrError>;

/// Trait extension for Option<T> to convert to RestrError
pub trait OptionExt<T> {
    fn ok_or_structure_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_structure_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| RestrError::PatternStructure(f()))
    }
}
