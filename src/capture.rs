use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::fmt;

use crate::utils::{RestrError, Result};

/// A zero-argument source of strings bound to a named capture group.
///
/// Any `FnMut() -> String` closure is a generator; types that can fail (such as
/// a Markov producer over an empty model) implement the trait directly.
pub trait NamedGenerator: Send {
    /// Produce the next string
    fn generate(&mut self) -> Result<String>;
}

impl<F> NamedGenerator for F
where
    F: FnMut() -> String + Send,
{
    fn generate(&mut self) -> Result<String> {
        Ok(self())
    }
}

/// Registry mapping capture-group names to generators
#[derive(Default)]
pub struct CaptureRegistry {
    generators: HashMap<String, Box<dyn NamedGenerator>>,
}

impl CaptureRegistry {
    /// Create a new empty capture registry
    pub fn new() -> Self {
        CaptureRegistry {
            generators: HashMap::new(),
        }
    }

    /// Bind a generator to `name`, replacing any previous binding
    pub fn register<G: NamedGenerator + 'static>(&mut self, name: &str, generator: G) -> &mut Self {
        self.generators.insert(name.to_string(), Box::new(generator));
        self
    }

    /// Get the generator bound to `name`
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn NamedGenerator + 'static)> {
        self.generators.get_mut(name).map(|generator| generator.as_mut())
    }

    /// Check if a generator is bound to `name`
    pub fn contains(&self, name: &str) -> bool {
        self.generators.contains_key(name)
    }

    /// Unbind `name`, returning whether a generator was registered
    pub fn remove(&mut self, name: &str) -> bool {
        self.generators.remove(name).is_some()
    }

    /// Get a sorted list of all registered capture names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.generators.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of bound captures
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Check if no capture is bound
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl fmt::Debug for CaptureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Generator returning one of a fixed list of strings, chosen uniformly
#[derive(Debug, Clone)]
pub struct Choice {
    values: Vec<String>,
    rng: StdRng,
}

impl NamedGenerator for Choice {
    fn generate(&mut self) -> Result<String> {
        self.values
            .choose(&mut self.rng)
            .cloned()
            .ok_or(RestrError::EmptyChoices)
    }
}

/// Create a choice generator with an entropy-seeded random source
pub fn one_of<I, S>(values: I) -> Result<Choice>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    one_of_seeded(values, StdRng::from_entropy())
}

/// Create a choice generator drawing from `rng`
pub fn one_of_seeded<I, S>(values: I, rng: StdRng) -> Result<Choice>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Err(RestrError::EmptyChoices);
    }
    Ok(Choice { values, rng })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = CaptureRegistry::new();
        registry.register("name", || "alice".to_string());

        assert!(registry.contains("name"));
        assert!(!registry.contains("other"));
        assert!(registry.get_mut("other").is_none());

        let generator = registry.get_mut("name").unwrap();
        assert_eq!(generator.generate().unwrap(), "alice");
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = CaptureRegistry::new();
        registry
            .register("x", || "first".to_string())
            .register("x", || "second".to_string());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_mut("x").unwrap().generate().unwrap(), "second");
    }

    #[test]
    fn test_stateful_closure() {
        let mut registry = CaptureRegistry::new();
        let mut counter = 0;
        registry.register("n", move || {
            counter += 1;
            counter.to_string()
        });

        let generator = registry.get_mut("n").unwrap();
        assert_eq!(generator.generate().unwrap(), "1");
        assert_eq!(generator.generate().unwrap(), "2");
    }

    #[test]
    fn test_names_and_remove() {
        let mut registry = CaptureRegistry::new();
        registry
            .register("b", || String::new())
            .register("a", || String::new());

        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.names(), vec!["b"]);
    }

    #[test]
    fn test_one_of() {
        let mut choice = one_of_seeded(["xa", "xb"], StdRng::seed_from_u64(3)).unwrap();
        for _ in 0..20 {
            let value = choice.generate().unwrap();
            assert!(value == "xa" || value == "xb");
        }

        assert!(matches!(
            one_of(Vec::<String>::new()),
            Err(RestrError::EmptyChoices)
        ));
    }
}
