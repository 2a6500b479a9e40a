//! Computed-style inlining.
//!
//! Supported selectors: type, universal, class and id selectors, compounds of
//! those, and descendant / child combinators. Anything else (pseudo-classes,
//! pseudo-elements, attribute selectors, sibling combinators) is skipped.

use std::cmp::Ordering;

use tracing::debug;

use super::css::{
    Combinator, Declaration, is_ident_char, parse_declarations, split_compounds, split_top_level,
    strip_comments, tokenize,
};
use super::dom::{Element, Node};
use super::style::StyleMap;
use super::types::RenderError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct Specificity(u32, u32, u32);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(source: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut chars = source.char_indices().peekable();

        match chars.peek() {
            Some((_, '*')) => {
                chars.next();
            }
            Some((_, c)) if is_ident_char(*c) => {
                compound.tag = Some(read_ident(source, &mut chars).to_ascii_lowercase());
            }
            _ => {}
        }

        while let Some((_, c)) = chars.next() {
            match c {
                '.' => compound.classes.push(read_ident(source, &mut chars).to_string()),
                '#' => compound.ids.push(read_ident(source, &mut chars).to_string()),
                _ => return None,
            }
        }

        let empty = compound.ids.iter().chain(&compound.classes).any(String::is_empty);
        (!empty).then_some(compound)
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            self.ids.len() as u32,
            self.classes.len() as u32,
            u32::from(self.tag.is_some()),
        )
    }

    fn matches(&self, subject: &Subject) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != subject.tag {
                return false;
            }
        }
        self.ids
            .iter()
            .all(|id| subject.id.as_deref() == Some(id.as_str()))
            && self
                .classes
                .iter()
                .all(|class| subject.classes.iter().any(|own| own == class))
    }
}

fn read_ident<'a>(
    source: &'a str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'a>>,
) -> &'a str {
    let start = chars.peek().map(|(index, _)| *index).unwrap_or(source.len());
    let mut end = start;
    while let Some((index, c)) = chars.peek().copied() {
        if !is_ident_char(c) {
            break;
        }
        end = index + c.len_utf8();
        chars.next();
    }
    &source[start..end]
}

#[derive(Debug, Clone)]
struct Selector {
    /// Left to right; the combinator links a compound to the one before it.
    parts: Vec<(Option<Combinator>, Compound)>,
    specificity: Specificity,
}

impl Selector {
    fn parse(source: &str) -> Option<Self> {
        let mut parts = Vec::new();
        let mut specificity = Specificity::default();
        for part in split_compounds(source) {
            if matches!(
                part.combinator,
                Some(Combinator::Adjacent | Combinator::Sibling)
            ) {
                return None;
            }
            let compound = Compound::parse(part.compound)?;
            let own = compound.specificity();
            specificity = Specificity(
                specificity.0 + own.0,
                specificity.1 + own.1,
                specificity.2 + own.2,
            );
            parts.push((part.combinator, compound));
        }
        (!parts.is_empty()).then_some(Self { parts, specificity })
    }

    /// `chain` lists ancestors from the root down, ending with the subject.
    fn matches(&self, chain: &[Subject]) -> bool {
        match chain.len().checked_sub(1) {
            Some(last) => self.match_at(self.parts.len() - 1, chain, last),
            None => false,
        }
    }

    fn match_at(&self, part: usize, chain: &[Subject], position: usize) -> bool {
        let (combinator, compound) = &self.parts[part];
        if !compound.matches(&chain[position]) {
            return false;
        }
        if part == 0 {
            return true;
        }
        match combinator {
            Some(Combinator::Child) => {
                position > 0 && self.match_at(part - 1, chain, position - 1)
            }
            _ => (0..position)
                .rev()
                .any(|ancestor| self.match_at(part - 1, chain, ancestor)),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    selectors: Vec<Selector>,
    declarations: Vec<Declaration>,
}

/// Parsed stylesheet ready to be applied to a tree.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
    skipped_selectors: usize,
}

impl Stylesheet {
    /// Parse CSS text. At-rules are dropped; unbalanced braces are an error.
    pub fn parse(css: &str) -> Result<Self, RenderError> {
        let tokens = tokenize(css);
        if !tokens.balanced {
            let excerpt: String = tokens.remainder.trim().chars().take(40).collect();
            return Err(RenderError::stylesheet(format!(
                "unbalanced braces near `{excerpt}`"
            )));
        }

        let mut sheet = Stylesheet::default();
        for block in tokens.blocks {
            let Some(body) = block.body else { continue };
            if block.is_at_rule() {
                continue;
            }
            let mut selectors = Vec::new();
            for source in split_top_level(&strip_comments(block.prelude), ',') {
                match Selector::parse(source) {
                    Some(selector) => selectors.push(selector),
                    None => sheet.skipped_selectors += 1,
                }
            }
            let declarations = parse_declarations(body);
            if !selectors.is_empty() && !declarations.is_empty() {
                sheet.rules.push(Rule {
                    selectors,
                    declarations,
                });
            }
        }
        Ok(sheet)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Resolve the cascade for one element. `chain` ends with the element.
    fn computed(&self, chain: &[Subject], existing: &StyleMap) -> Option<StyleMap> {
        let mut matched: Vec<(Specificity, usize, &Declaration)> = Vec::new();
        let mut order = 0usize;
        for rule in &self.rules {
            let best = rule
                .selectors
                .iter()
                .filter(|selector| selector.matches(chain))
                .map(|selector| selector.specificity)
                .max();
            for declaration in &rule.declarations {
                order += 1;
                if let Some(specificity) = best {
                    matched.push((specificity, order, declaration));
                }
            }
        }
        if matched.is_empty() {
            return None;
        }

        matched.sort_by(|a, b| match a.0.cmp(&b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });

        let mut style = StyleMap::new();
        for (_, _, declaration) in matched.iter().filter(|(_, _, d)| !d.important) {
            override_property(&mut style, &declaration.property, &declaration.value);
        }
        for (property, value) in existing.iter() {
            override_property(&mut style, property, value);
        }
        for (_, _, declaration) in matched.iter().filter(|(_, _, d)| d.important) {
            override_property(&mut style, &declaration.property, &declaration.value);
        }
        Some(style)
    }
}

/// Later declarations move to the end so they also beat earlier shorthands.
fn override_property(style: &mut StyleMap, property: &str, value: &str) {
    style.remove(property);
    style.set(property, value);
}

#[derive(Debug, Clone)]
struct Subject {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
}

impl Subject {
    fn of(element: &Element) -> Self {
        Self {
            tag: element.name.to_ascii_lowercase(),
            id: element.attr("id").map(str::to_string),
            classes: element.classes().map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineReport {
    pub rules: usize,
    pub skipped_selectors: usize,
    pub styled_elements: usize,
}

/// Inline `css` plus any embedded `<style>` blocks into `style` attributes and
/// drop `<style>`/`<link>` elements.
///
/// On error the tree is left exactly as it was.
pub fn inline_styles(nodes: &mut Vec<Node>, css: &str) -> Result<InlineReport, RenderError> {
    let mut source = css.to_string();
    collect_embedded_css(nodes, &mut source);
    let sheet = Stylesheet::parse(&source)?;

    remove_style_elements(nodes);

    let mut report = InlineReport {
        rules: sheet.rules.len(),
        skipped_selectors: sheet.skipped_selectors,
        styled_elements: 0,
    };
    if !sheet.is_empty() {
        let mut chain = Vec::new();
        apply(nodes, &sheet, &mut chain, &mut report);
    }

    debug!(
        target = "application::render::inline",
        rules = report.rules,
        skipped_selectors = report.skipped_selectors,
        styled_elements = report.styled_elements,
        "stylesheet inlined"
    );
    Ok(report)
}

fn collect_embedded_css(nodes: &[Node], out: &mut String) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.is("style") {
                out.push('\n');
                out.push_str(&element.text_content());
            } else {
                collect_embedded_css(&element.children, out);
            }
        }
    }
}

fn remove_style_elements(nodes: &mut Vec<Node>) {
    nodes.retain(|node| {
        !matches!(node, Node::Element(element) if element.is("style") || element.is("link"))
    });
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            remove_style_elements(&mut element.children);
        }
    }
}

fn apply(
    nodes: &mut [Node],
    sheet: &Stylesheet,
    chain: &mut Vec<Subject>,
    report: &mut InlineReport,
) {
    for node in nodes {
        let Node::Element(element) = node else { continue };
        chain.push(Subject::of(element));
        if let Some(style) = sheet.computed(chain, &StyleMap::of(element)) {
            style.apply_to(element);
            report.styled_elements += 1;
        }
        apply(&mut element.children, sheet, chain, report);
        chain.pop();
    }
}

/// String convenience wrapper: parse, inline, serialize.
pub fn inline_html(html: &str, css: &str) -> Result<String, RenderError> {
    let mut nodes = super::dom::parse_fragment(html);
    inline_styles(&mut nodes, css)?;
    Ok(super::dom::serialize(&nodes))
}
