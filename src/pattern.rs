//! Pattern trees.
//!
//! Patterns are parsed by `regex-syntax` and converted into [`PatternNode`], a tree
//! with one variant per construct the generator knows how to produce text for.

use once_cell::sync::Lazy;
use regex::Regex;
use regex_syntax::ast::{
    self, Ast, ClassAscii, ClassAsciiKind, ClassBracketed, ClassPerl, ClassPerlKind, ClassSet,
    ClassSetItem,
};
use regex_syntax::hir::{self, Class, Dot, Hir, HirKind};
use std::fmt;

use crate::utils::{RestrError, Result};

static ANY_CHAR: Lazy<Hir> = Lazy::new(|| Hir::dot(Dot::AnyChar));
static ANY_CHAR_EXCEPT_NEWLINE: Lazy<Hir> = Lazy::new(|| Hir::dot(Dot::AnyCharExceptLF));

/// A node of a parsed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    /// Matches the empty string; also stands in for zero-width assertions
    Empty,
    /// Literal text
    Literal(String),
    /// Any character, newline included
    AnyChar,
    /// Any character but `\n`
    AnyCharExceptNewline,
    /// Inclusive code-point ranges
    Class(Vec<(char, char)>),
    /// A group, optionally named
    Capture {
        name: Option<String>,
        children: Vec<PatternNode>,
    },
    Alternation(Vec<PatternNode>),
    Concat(Vec<PatternNode>),
    /// `x?`
    Optional(Box<PatternNode>),
    /// `x{min,max}`; `max` of `None` is unbounded
    Repeat {
        min: usize,
        max: Option<usize>,
        child: Box<PatternNode>,
    },
    /// `x+`
    OneOrMore(Box<PatternNode>),
    /// `x*`
    ZeroOrMore(Box<PatternNode>),
}

impl PatternNode {
    /// Parse a pattern string into a tree.
    ///
    /// `\d`, `\s` and `\w` (and their negations) are narrowed to their ASCII
    /// meaning before translation; everything else keeps Unicode semantics.
    pub fn parse(pattern: &str) -> Result<PatternNode> {
        let ast = parse_narrowed(pattern)?;
        let hir = hir::translate::Translator::new()
            .translate(pattern, &ast)
            .map_err(regex_syntax::Error::from)?;
        PatternNode::from_hir(&hir)
    }

    /// Convert a `regex-syntax` HIR into a pattern tree
    pub fn from_hir(hir: &Hir) -> Result<PatternNode> {
        if *hir == *ANY_CHAR {
            return Ok(PatternNode::AnyChar);
        }
        if *hir == *ANY_CHAR_EXCEPT_NEWLINE {
            return Ok(PatternNode::AnyCharExceptNewline);
        }

        let node = match hir.kind() {
            HirKind::Empty | HirKind::Look(_) => PatternNode::Empty,
            HirKind::Literal(hir::Literal(bytes)) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|err| {
                    RestrError::PatternStructure(format!("literal is not valid UTF-8: {}", err))
                })?;
                PatternNode::Literal(text)
            }
            HirKind::Class(Class::Unicode(class)) => PatternNode::Class(
                class
                    .ranges()
                    .iter()
                    .map(|range| (range.start(), range.end()))
                    .collect(),
            ),
            HirKind::Class(Class::Bytes(class)) => {
                let mut ranges = Vec::with_capacity(class.ranges().len());
                for range in class.ranges() {
                    if !range.end().is_ascii() {
                        return Err(RestrError::PatternStructure(format!(
                            "byte class reaches non-ASCII byte {:#04x}",
                            range.end()
                        )));
                    }
                    ranges.push((char::from(range.start()), char::from(range.end())));
                }
                PatternNode::Class(ranges)
            }
            HirKind::Repetition(rep) => {
                let child = Box::new(PatternNode::from_hir(&rep.sub)?);
                match (rep.min, rep.max) {
                    (0, Some(1)) => PatternNode::Optional(child),
                    (0, None) => PatternNode::ZeroOrMore(child),
                    (1, None) => PatternNode::OneOrMore(child),
                    (min, max) => PatternNode::Repeat {
                        min: min as usize,
                        max: max.map(|max| max as usize),
                        child,
                    },
                }
            }
            HirKind::Capture(capture) => PatternNode::Capture {
                name: capture.name.as_deref().map(str::to_string),
                children: vec![PatternNode::from_hir(&capture.sub)?],
            },
            HirKind::Concat(subs) => PatternNode::Concat(
                subs.iter()
                    .map(PatternNode::from_hir)
                    .collect::<Result<Vec<_>>>()?,
            ),
            HirKind::Alternation(subs) => PatternNode::Alternation(
                subs.iter()
                    .map(PatternNode::from_hir)
                    .collect::<Result<Vec<_>>>()?,
            ),
        };
        Ok(node)
    }

    /// Short name of the node kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            PatternNode::Empty => "Empty",
            PatternNode::Literal(_) => "Literal",
            PatternNode::AnyChar => "AnyChar",
            PatternNode::AnyCharExceptNewline => "AnyCharExceptNewline",
            PatternNode::Class(_) => "Class",
            PatternNode::Capture { .. } => "Capture",
            PatternNode::Alternation(_) => "Alternation",
            PatternNode::Concat(_) => "Concat",
            PatternNode::Optional(_) => "Optional",
            PatternNode::Repeat { .. } => "Repeat",
            PatternNode::OneOrMore(_) => "OneOrMore",
            PatternNode::ZeroOrMore(_) => "ZeroOrMore",
        }
    }

    /// Child nodes in order
    pub fn children(&self) -> &[PatternNode] {
        match self {
            PatternNode::Capture { children, .. }
            | PatternNode::Alternation(children)
            | PatternNode::Concat(children) => children,
            PatternNode::Optional(child)
            | PatternNode::Repeat { child, .. }
            | PatternNode::OneOrMore(child)
            | PatternNode::ZeroOrMore(child) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Render the tree one node per line, children indented by a tab
    pub fn explain(&self) -> String {
        self.to_string()
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{}{}) {}", "\t".repeat(depth), depth, self.kind_name())?;
        match self {
            PatternNode::Literal(text) => write!(f, " {:?}", text)?,
            PatternNode::Class(ranges) => {
                let rendered: Vec<String> = ranges
                    .iter()
                    .map(|(start, end)| {
                        if start == end {
                            format!("{:?}", start)
                        } else {
                            format!("{:?}-{:?}", start, end)
                        }
                    })
                    .collect();
                write!(f, " [{}]", rendered.join(" "))?;
            }
            PatternNode::Capture {
                name: Some(name), ..
            } => write!(f, " name={}", name)?,
            PatternNode::Repeat { min, max, .. } => match max {
                Some(max) => write!(f, " min={}, max={}", min, max)?,
                None => write!(f, " min={}, max=unbounded", min)?,
            },
            _ => {}
        }
        writeln!(f)?;

        for child in self.children() {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}

/// Check that `text` matches `pattern` in full, using the `regex` engine.
///
/// `\d`, `\s` and `\w` are read as ASCII, the same way [`PatternNode::parse`]
/// reads them, so every generated string passes.
pub fn full_match(pattern: &str, text: &str) -> Result<bool> {
    let ast = parse_narrowed(pattern)?;
    let mut source = String::new();
    ast::print::Printer::new()
        .print(&ast, &mut source)
        .map_err(|_| RestrError::PatternStructure("cannot print pattern".to_string()))?;

    let anchored = Regex::new(&format!(r"\A(?:{})\z", source))?;
    Ok(anchored.is_match(text))
}

fn parse_narrowed(pattern: &str) -> Result<Ast> {
    let mut ast = ast::parse::Parser::new()
        .parse(pattern)
        .map_err(regex_syntax::Error::from)?;
    narrow_perl_classes(&mut ast);
    Ok(ast)
}

fn narrow_perl_classes(ast: &mut Ast) {
    let replacement = match ast {
        Ast::ClassPerl(perl) => Some(Ast::class_bracketed(ClassBracketed {
            span: perl.span,
            negated: false,
            kind: ClassSet::Item(ClassSetItem::Ascii(ascii_class(perl))),
        })),
        Ast::ClassBracketed(bracketed) => {
            narrow_class_set(&mut bracketed.kind);
            None
        }
        Ast::Repetition(rep) => {
            narrow_perl_classes(&mut rep.ast);
            None
        }
        Ast::Group(group) => {
            narrow_perl_classes(&mut group.ast);
            None
        }
        Ast::Alternation(alternation) => {
            for ast in alternation.asts.iter_mut() {
                narrow_perl_classes(ast);
            }
            None
        }
        Ast::Concat(concat) => {
            for ast in concat.asts.iter_mut() {
                narrow_perl_classes(ast);
            }
            None
        }
        _ => None,
    };
    if let Some(replacement) = replacement {
        *ast = replacement;
    }
}

fn narrow_class_set(set: &mut ClassSet) {
    match set {
        ClassSet::Item(item) => narrow_class_item(item),
        ClassSet::BinaryOp(op) => {
            narrow_class_set(&mut op.lhs);
            narrow_class_set(&mut op.rhs);
        }
    }
}

fn narrow_class_item(item: &mut ClassSetItem) {
    match item {
        ClassSetItem::Perl(perl) => {
            let ascii = ascii_class(perl);
            *item = ClassSetItem::Ascii(ascii);
        }
        ClassSetItem::Bracketed(bracketed) => narrow_class_set(&mut bracketed.kind),
        ClassSetItem::Union(set_union) => {
            for item in set_union.items.iter_mut() {
                narrow_class_item(item);
            }
        }
        _ => {}
    }
}

fn ascii_class(perl: &ClassPerl) -> ClassAscii {
    let kind = match perl.kind {
        ClassPerlKind::Digit => ClassAsciiKind::Digit,
        ClassPerlKind::Space => ClassAsciiKind::Space,
        ClassPerlKind::Word => ClassAsciiKind::Word,
    };
    ClassAscii {
        span: perl.span,
        kind,
        negated: perl.negated,
    }
}
