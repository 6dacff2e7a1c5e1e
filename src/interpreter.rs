use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::capture::{CaptureRegistry, NamedGenerator};
use crate::charset;
use crate::pattern::PatternNode;
use crate::utils::{OptionExt, RestrError, Result};

/// Configuration options for pattern generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Ceiling substituted for the unbounded side of `*`, `+` and `{n,}`
    pub max_repeat: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig { max_repeat: 100 }
    }
}

/// The capture name in effect for the subtree being interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpretationContext<'a> {
    capture: Option<&'a str>,
}

impl<'a> InterpretationContext<'a> {
    pub fn new() -> Self {
        InterpretationContext { capture: None }
    }

    /// Context for the body of a capture group named `name`
    pub fn enter(self, name: &'a str) -> Self {
        InterpretationContext {
            capture: Some(name),
        }
    }

    pub fn capture(&self) -> Option<&'a str> {
        self.capture
    }
}

/// Generates strings matching regular expressions.
///
/// Each generator owns its random source and its capture registry, so two
/// generators never observe each other's registrations.
#[derive(Debug)]
pub struct PatternGenerator {
    config: GeneratorConfig,
    registry: CaptureRegistry,
    rng: StdRng,
}

impl PatternGenerator {
    /// Create a generator seeded from system entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy(), GeneratorConfig::default())
    }

    /// Create a generator whose output is fully determined by `seed`
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), GeneratorConfig::default())
    }

    /// Create a new generator with custom configuration
    pub fn with_config(config: GeneratorConfig) -> Self {
        Self::from_rng(StdRng::from_entropy(), config)
    }

    pub fn from_rng(rng: StdRng, config: GeneratorConfig) -> Self {
        PatternGenerator {
            config,
            registry: CaptureRegistry::new(),
            rng,
        }
    }

    /// Bind a generator to a named capture group
    pub fn register<G: NamedGenerator + 'static>(&mut self, name: &str, generator: G) -> &mut Self {
        self.registry.register(name, generator);
        self
    }

    pub fn registry(&self) -> &CaptureRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CaptureRegistry {
        &mut self.registry
    }

    /// Get a reference to the generator's configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Set a new configuration
    pub fn set_config(&mut self, config: GeneratorConfig) {
        self.config = config;
    }

    /// Draw a seed for a dependent generator from this generator's random source
    pub fn derive_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    /// Generate a random string matching `pattern`
    pub fn generate(&mut self, pattern: &str) -> Result<String> {
        let tree = PatternNode::parse(pattern)?;
        self.generate_from(&tree)
    }

    /// Generate a random string from an already parsed tree
    pub fn generate_from(&mut self, node: &PatternNode) -> Result<String> {
        self.interpret(node, InterpretationContext::new())
    }

    /// Produce text for `node` under `context`
    pub fn interpret<'n>(
        &mut self,
        node: &'n PatternNode,
        context: InterpretationContext<'n>,
    ) -> Result<String> {
        let mut out = String::new();
        self.emit(node, context, &mut out)?;
        Ok(out)
    }

    fn emit<'n>(
        &mut self,
        node: &'n PatternNode,
        context: InterpretationContext<'n>,
        out: &mut String,
    ) -> Result<()> {
        match node {
            PatternNode::Empty => {}
            PatternNode::Literal(text) => out.push_str(text),
            PatternNode::AnyChar => {
                let c = charset::all()
                    .choose(&mut self.rng)
                    .ok_or_structure_err(|| "character universe is empty".to_string())?;
                out.push(c);
            }
            PatternNode::AnyCharExceptNewline => {
                let c = charset::all_except_newline()
                    .choose(&mut self.rng)
                    .ok_or_structure_err(|| "character universe is empty".to_string())?;
                out.push(c);
            }
            PatternNode::Class(ranges) => {
                let c = charset::choose_from_ranges(ranges, &mut self.rng)
                    .ok_or_structure_err(|| "character class matches nothing".to_string())?;
                out.push(c);
            }
            PatternNode::Capture { name, children } => {
                let context = match name {
                    Some(name) => context.enter(name),
                    None => context,
                };
                for child in children {
                    self.emit(child, context, out)?;
                }
            }
            PatternNode::Alternation(children) => {
                if children.is_empty() {
                    return Err(RestrError::PatternStructure(
                        "alternation has no branches".to_string(),
                    ));
                }
                let index = self.rng.gen_range(0..children.len());
                self.emit(&children[index], context, out)?;
            }
            PatternNode::Concat(children) => {
                for child in children {
                    self.emit(child, context, out)?;
                }
            }
            PatternNode::Optional(child) => self.emit_repeat(child, 0, Some(1), context, out)?,
            PatternNode::Repeat { min, max, child } => {
                self.emit_repeat(child, *min, *max, context, out)?
            }
            PatternNode::OneOrMore(child) => self.emit_repeat(child, 1, None, context, out)?,
            PatternNode::ZeroOrMore(child) => self.emit_repeat(child, 0, None, context, out)?,
        }
        Ok(())
    }

    fn emit_repeat<'n>(
        &mut self,
        child: &'n PatternNode,
        min: usize,
        max: Option<usize>,
        context: InterpretationContext<'n>,
        out: &mut String,
    ) -> Result<()> {
        let max = max.unwrap_or(self.config.max_repeat);
        if max < min {
            return Err(RestrError::RepeatBounds { min, max });
        }

        if let Some(name) = context.capture() {
            let any = matches!(
                child,
                PatternNode::AnyChar | PatternNode::AnyCharExceptNewline
            );
            if any {
                if let Some(generator) = self.registry.get_mut(name) {
                    trace!("capture {:?} filled by registered generator", name);
                    let text = fit_size(name, generator, min, max, &mut self.rng)?;
                    out.push_str(&text);
                    return Ok(());
                }
            }
        }

        let times = if min == max {
            min
        } else {
            self.rng.gen_range(min..=max)
        };
        for _ in 0..times {
            self.emit(child, context, out)?;
        }
        Ok(())
    }
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Call `generator` until its output reaches `min` characters, then cut it to `max`.
///
/// When `min` is zero the capture is optional, and a fair coin decides whether
/// the text is kept or replaced by the empty string.
fn fit_size<R: Rng + ?Sized>(
    name: &str,
    generator: &mut dyn NamedGenerator,
    min: usize,
    max: usize,
    rng: &mut R,
) -> Result<String> {
    let mut text = generator.generate()?;
    let mut length = text.chars().count();
    while length < min {
        let more = generator.generate()?;
        if more.is_empty() {
            return Err(RestrError::EmptyCaptureGenerator(name.to_string()));
        }
        length += more.chars().count();
        text.push_str(&more);
    }

    if length > max {
        text = text.chars().take(max).collect();
    }

    if min == 0 && rng.gen_bool(0.5) {
        return Ok(String::new());
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        let mut generator = PatternGenerator::with_seed(1);
        assert_eq!(generator.generate("hello world").unwrap(), "hello world");
    }

    #[test]
    fn test_digits_repeat() {
        let mut generator = PatternGenerator::with_seed(2);
        for _ in 0..50 {
            let result = generator.generate(r"\d{4,8}").unwrap();
            assert!((4..=8).contains(&result.len()), "bad length: {}", result);
            assert!(result.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_alternation_picks_one_branch() {
        let mut generator = PatternGenerator::with_seed(3);
        for _ in 0..30 {
            let result = generator.generate("(Tik|Tak|Tok)").unwrap();
            assert!(
                result == "Tik" || result == "Tak" || result == "Tok",
                "unexpected: {}",
                result
            );
        }
    }

    #[test]
    fn test_dot_never_emits_newline() {
        let mut generator = PatternGenerator::with_seed(4);
        let result = generator.generate(".{500}").unwrap();
        assert_eq!(result.chars().count(), 500);
        assert!(!result.contains('\n'));
        assert!(
            result
                .chars()
                .all(|c| charset::all_except_newline().contains(c))
        );
    }

    #[test]
    fn test_unbounded_repeat_respects_max_repeat() {
        let mut generator = PatternGenerator::with_config(GeneratorConfig { max_repeat: 5 });
        for _ in 0..50 {
            let plus = generator.generate("a+").unwrap();
            assert!((1..=5).contains(&plus.len()));
            let star = generator.generate("b*").unwrap();
            assert!(star.len() <= 5);
            assert!(star.chars().all(|c| c == 'b'));
        }
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut generator = PatternGenerator::with_seed(5);
        let node = PatternNode::Repeat {
            min: 4,
            max: Some(2),
            child: Box::new(PatternNode::Literal("x".to_string())),
        };
        assert!(matches!(
            generator.generate_from(&node),
            Err(RestrError::RepeatBounds { min: 4, max: 2 })
        ));

        // `{3,}` with a ceiling below three cannot be satisfied either.
        generator.set_config(GeneratorConfig { max_repeat: 2 });
        assert!(matches!(
            generator.generate("x{3,}"),
            Err(RestrError::RepeatBounds { min: 3, max: 2 })
        ));
    }

    #[test]
    fn test_malformed_nodes() {
        let mut generator = PatternGenerator::with_seed(6);
        assert!(matches!(
            generator.generate_from(&PatternNode::Alternation(vec![])),
            Err(RestrError::PatternStructure(_))
        ));
        assert!(matches!(
            generator.generate_from(&PatternNode::Class(vec![])),
            Err(RestrError::PatternStructure(_))
        ));
    }

    #[test]
    fn test_capture_override() {
        let mut generator = PatternGenerator::with_seed(7);
        generator.register("x", || "ZZZZZ".to_string());
        assert_eq!(generator.generate("(?P<x>.{3,3})").unwrap(), "ZZZ");
    }

    #[test]
    fn test_capture_override_concatenates_to_min() {
        let mut generator = PatternGenerator::with_seed(8);
        generator.register("x", || "ab".to_string());
        assert_eq!(generator.generate("(?P<x>.{5,7})").unwrap(), "ababab");
    }

    #[test]
    fn test_capture_override_only_for_dot_bodies() {
        let mut generator = PatternGenerator::with_seed(9);
        generator.register("x", || "ZZZZZ".to_string());
        let result = generator.generate(r"(?P<x>\d{3})").unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_capture_context_does_not_leak() {
        let mut generator = PatternGenerator::with_seed(10);
        generator.register("x", || "Z".to_string());
        let result = generator.generate("(?P<x>.{2})a.{50}").unwrap();
        assert!(result.starts_with("ZZa"));
        assert_eq!(result.chars().count(), 53);
        assert!(result.chars().skip(3).any(|c| c != 'Z'));
    }

    #[test]
    fn test_nested_unnamed_group_keeps_capture() {
        let mut generator = PatternGenerator::with_seed(11);
        generator.register("outer", || "Q".to_string());
        assert_eq!(generator.generate("(?P<outer>(.{2}))").unwrap(), "QQ");
    }

    #[test]
    fn test_optional_capture_coin_flip() {
        let mut generator = PatternGenerator::with_seed(12);
        generator.register("maybe", || "word".to_string());
        let mut empty = 0;
        let mut full = 0;
        for _ in 0..200 {
            match generator.generate("(?P<maybe>.*)").unwrap().as_str() {
                "" => empty += 1,
                "word" => full += 1,
                other => panic!("unexpected output {:?}", other),
            }
        }
        assert!(empty > 0 && full > 0);
    }

    #[test]
    fn test_empty_capture_generator() {
        let mut generator = PatternGenerator::with_seed(13);
        generator.register("x", String::new);
        assert!(matches!(
            generator.generate("(?P<x>.{2})"),
            Err(RestrError::EmptyCaptureGenerator(name)) if name == "x"
        ));
    }

    #[test]
    fn test_seed_determinism() {
        let pattern = r"[a-z]{3}-\d{2,6}(foo|bar)?.*";
        let mut first = PatternGenerator::with_seed(42);
        let mut second = PatternGenerator::with_seed(42);
        for _ in 0..10 {
            assert_eq!(
                first.generate(pattern).unwrap(),
                second.generate(pattern).unwrap()
            );
        }
    }

    #[test]
    fn test_independent_registries() {
        let mut first = PatternGenerator::with_seed(14);
        let mut second = PatternGenerator::with_seed(14);
        first.register("x", || "abc".to_string());

        assert_eq!(first.generate("(?P<x>.{3})").unwrap(), "abc");
        assert!(!second.registry().contains("x"));
        let other = second.generate("(?P<x>[a]{3})").unwrap();
        assert_eq!(other, "aaa");
    }
}
