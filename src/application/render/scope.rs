//! Scoping template CSS under the live-preview container and back.
//!
//! Templates are authored (or auto-scoped) as
//! `.preview-container .markdown-body <selector>`. The preview needs that
//! prefix; the inliner needs selectors that match the article tree directly.

use super::annotate::{ARTICLE_CLASS, CONTENT_ROOT_CLASS};
use super::css::{
    Combinator, SelectorPart, has_class_token, is_ident_char, join_compounds, split_compounds,
    split_top_level, strip_comments, tokenize,
};

pub const DEFAULT_CONTAINER_CLASS: &str = "preview-container";

/// The two-level class prefix preview CSS is scoped under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePrefix {
    container: String,
    content_root: String,
}

impl ScopePrefix {
    pub fn new(container: impl Into<String>, content_root: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            content_root: content_root.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn content_root(&self) -> &str {
        &self.content_root
    }

    fn container_selector(&self) -> String {
        format!(".{}", self.container)
    }

    fn content_root_selector(&self) -> String {
        format!(".{}", self.content_root)
    }

    fn is_anchored(&self, selector: &str) -> bool {
        has_class_token(selector, &self.container) || has_class_token(selector, &self.content_root)
    }
}

impl Default for ScopePrefix {
    fn default() -> Self {
        Self::new(DEFAULT_CONTAINER_CLASS, CONTENT_ROOT_CLASS)
    }
}

impl std::fmt::Display for ScopePrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ".{} .{}", self.container, self.content_root)
    }
}

/// Prefix every top-level, non-at-rule selector that is not already anchored.
///
/// Malformed input is handled best-effort: the unparsed tail is copied through.
pub fn scope(css: &str, prefix: &ScopePrefix) -> String {
    let tokens = tokenize(css);
    let mut out = String::with_capacity(css.len() + tokens.blocks.len() * 32);

    for block in &tokens.blocks {
        out.push_str(block.leading);
        match block.body {
            Some(body) if !block.is_at_rule() => {
                let selectors: Vec<String> = split_top_level(&strip_comments(block.prelude), ',')
                    .into_iter()
                    .map(|selector| scope_selector(selector, prefix))
                    .collect();
                out.push_str(&selectors.join(", "));
                out.push_str(" {");
                out.push_str(body);
                out.push('}');
            }
            _ => out.push_str(block.raw),
        }
    }

    out.push_str(tokens.remainder);
    out
}

fn scope_selector(selector: &str, prefix: &ScopePrefix) -> String {
    if prefix.is_anchored(selector) {
        return selector.to_string();
    }

    let parts = split_compounds(selector);
    let Some(first) = parts.first() else {
        return selector.to_string();
    };

    // The article root is the content root itself, so glue instead of nesting.
    if has_class_token(first.compound, ARTICLE_CLASS) {
        let glued = glue_class(first.compound, &prefix.content_root);
        let mut rebuilt = vec![SelectorPart {
            combinator: None,
            compound: glued.as_str(),
        }];
        rebuilt.extend(parts.iter().skip(1).cloned());
        return format!("{} {}", prefix.container_selector(), join_compounds(&rebuilt));
    }

    format!("{prefix} {selector}")
}

/// `div.x` + `root` → `div.root.x`; `.x` + `root` → `.root.x`.
fn glue_class(compound: &str, class: &str) -> String {
    let split = compound
        .find(['.', '#', ':', '['])
        .unwrap_or(compound.len());
    format!("{}.{class}{}", &compound[..split], &compound[split..])
}

/// Strip the scope prefix back out of every selector, recursing into
/// conditional group rules (`@media`, `@supports`).
pub fn unscope(css: &str, prefix: &ScopePrefix) -> String {
    let tokens = tokenize(css);
    let mut out = String::with_capacity(css.len());

    for block in &tokens.blocks {
        out.push_str(block.leading);
        match block.body {
            Some(body) if block.is_at_rule() => {
                let recurse = matches!(
                    block.at_keyword().as_deref(),
                    Some("media" | "supports" | "layer" | "container" | "document")
                );
                if recurse {
                    out.push_str(block.prelude);
                    out.push_str(" {");
                    out.push_str(&unscope(body, prefix));
                    out.push('}');
                } else {
                    out.push_str(block.raw);
                }
            }
            Some(body) => {
                let selectors: Vec<String> = split_top_level(&strip_comments(block.prelude), ',')
                    .into_iter()
                    .map(|selector| unscope_selector(selector, prefix))
                    .collect();
                out.push_str(&selectors.join(", "));
                out.push_str(" {");
                out.push_str(body);
                out.push('}');
            }
            None => out.push_str(block.raw),
        }
    }

    out.push_str(tokens.remainder);
    out
}

fn unscope_selector(selector: &str, prefix: &ScopePrefix) -> String {
    let mut parts = split_compounds(selector);
    let container = prefix.container_selector();

    if parts.first().is_some_and(|part| part.compound == container) {
        parts.remove(0);
    }

    let remainder = parts
        .first()
        .and_then(|first| without_class_token(first.compound, &prefix.content_root));
    let glued_rest = match remainder {
        Some(rest) if rest.is_empty() => {
            parts.remove(0);
            None
        }
        // `div.markdown-body` still means the article root, not any `div`.
        Some(rest) if rest.chars().all(|c| is_ident_char(c) || c == '*') => {
            Some(format!("{rest}.{ARTICLE_CLASS}"))
        }
        other => other,
    };

    let rebuilt = match glued_rest.as_deref() {
        Some(rest) => {
            let mut rebuilt = vec![SelectorPart {
                combinator: None,
                compound: rest,
            }];
            rebuilt.extend(parts.iter().skip(1).cloned());
            join_compounds(&rebuilt)
        }
        None => {
            if let Some(first) = parts.first_mut() {
                first.combinator = None;
            }
            // A combinator left dangling at the front (`> p`) keeps its meaning
            // relative to the article root.
            let joined = join_compounds(&parts);
            match selector_leading_combinator(selector, prefix) {
                Some(Combinator::Child) if !joined.is_empty() => {
                    format!(".{ARTICLE_CLASS} > {joined}")
                }
                _ => joined,
            }
        }
    };

    if rebuilt.is_empty() {
        format!(".{ARTICLE_CLASS}")
    } else {
        rebuilt
    }
}

/// `compound` with one whole `.class` token removed, or `None` when absent.
fn without_class_token(compound: &str, class: &str) -> Option<String> {
    let needle = format!(".{class}");
    let (index, _) = compound.match_indices(&needle).find(|(index, _)| {
        compound[index + needle.len()..]
            .chars()
            .next()
            .is_none_or(|next| !is_ident_char(next))
    })?;
    Some(format!(
        "{}{}",
        &compound[..index],
        &compound[index + needle.len()..]
    ))
}

/// Combinator between the stripped prefix and the remaining selector, if any.
fn selector_leading_combinator(selector: &str, prefix: &ScopePrefix) -> Option<Combinator> {
    let parts = split_compounds(selector);
    let content_root = prefix.content_root_selector();
    let position = parts
        .iter()
        .position(|part| part.compound == content_root)?;
    parts.get(position + 1).and_then(|part| part.combinator)
}
