//! Minimal CSS tokenizer shared by the scope rewriter and the inliner.
//!
//! The selector side only understands what template CSS needs: top-level
//! blocks split by balanced braces, selector lists split on top-level commas
//! and compound selectors split on combinators. Comments and quoted strings
//! are skipped wherever braces or commas are searched for. Declaration
//! bodies go through `cssparser`.

use cssparser::{Delimiter, ParseError, Parser, ParserInput, Token};

/// A top-level block: a rule, an at-rule with a body, or an at-rule statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Whitespace and comments preceding the block.
    pub leading: &'a str,
    /// Selector list or at-rule prelude, trimmed.
    pub prelude: &'a str,
    /// Text between the braces; `None` for statements such as `@import ...;`.
    pub body: Option<&'a str>,
    /// The block exactly as written, from prelude to closing brace or semicolon.
    pub raw: &'a str,
}

impl Block<'_> {
    pub fn is_at_rule(&self) -> bool {
        self.prelude.starts_with('@')
    }

    /// Lower-cased at-rule keyword without the `@`, e.g. `media`.
    pub fn at_keyword(&self) -> Option<String> {
        let rest = self.prelude.strip_prefix('@')?;
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(rest.len());
        Some(rest[..end].to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens<'a> {
    pub blocks: Vec<Block<'a>>,
    /// Text after the last complete block. Non-blank only when the input is malformed.
    pub remainder: &'a str,
    pub balanced: bool,
}

/// Split `css` into top-level blocks. Never fails: malformed input stops the
/// scan and leaves the unparsed tail in [`Tokens::remainder`].
pub fn tokenize(css: &str) -> Tokens<'_> {
    let bytes = css.as_bytes();
    let mut blocks = Vec::new();
    let mut pos = 0;

    loop {
        let leading_start = pos;
        pos = skip_trivia(bytes, pos);
        if pos >= bytes.len() {
            return Tokens {
                blocks,
                remainder: &css[leading_start..],
                balanced: true,
            };
        }

        let start = pos;
        let is_at_rule = bytes[start] == b'@';
        let Some((stop, found)) = scan_prelude(bytes, start, is_at_rule) else {
            return unbalanced(blocks, css, leading_start);
        };

        match found {
            b';' => {
                blocks.push(Block {
                    leading: &css[leading_start..start],
                    prelude: css[start..stop].trim(),
                    body: None,
                    raw: &css[start..=stop],
                });
                pos = stop + 1;
            }
            _ => {
                let Some(close) = find_block_end(bytes, stop) else {
                    return unbalanced(blocks, css, leading_start);
                };
                blocks.push(Block {
                    leading: &css[leading_start..start],
                    prelude: css[start..stop].trim(),
                    body: Some(&css[stop + 1..close]),
                    raw: &css[start..=close],
                });
                pos = close + 1;
            }
        }
    }
}

fn unbalanced<'a>(blocks: Vec<Block<'a>>, css: &'a str, from: usize) -> Tokens<'a> {
    Tokens {
        blocks,
        remainder: &css[from..],
        balanced: false,
    }
}

fn skip_trivia(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        if bytes[pos].is_ascii_whitespace() {
            pos += 1;
        } else if starts_comment(bytes, pos) {
            pos = skip_comment(bytes, pos);
        } else {
            break;
        }
    }
    pos
}

fn starts_comment(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos) == Some(&b'/') && bytes.get(pos + 1) == Some(&b'*')
}

/// Returns the index just past the comment, or the input length when unterminated.
fn skip_comment(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// Returns the index just past the closing quote.
fn skip_string(bytes: &[u8], pos: usize) -> usize {
    let quote = bytes[pos];
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Find the `{` (or `;` for at-rule statements) ending a prelude.
fn scan_prelude(bytes: &[u8], start: usize, is_at_rule: bool) -> Option<(usize, u8)> {
    let mut i = start;
    let mut parens = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if starts_comment(bytes, i) => {
                i = skip_comment(bytes, i);
                continue;
            }
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'{' if parens == 0 => return Some((i, b'{')),
            b';' if parens == 0 && is_at_rule => return Some((i, b';')),
            b'}' if parens == 0 => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Given the index of an opening brace, return the index of its matching close.
fn find_block_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if starts_comment(bytes, i) => {
                i = skip_comment(bytes, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on `separator` outside parentheses, brackets, strings and comments.
/// Pieces are trimmed; empty pieces are dropped.
pub fn split_top_level(input: &str, separator: char) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' if starts_comment(bytes, i) => {
                i = skip_comment(bytes, i);
                continue;
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            c if depth == 0 && c == separator as u8 => {
                push_piece(&mut pieces, &input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    push_piece(&mut pieces, &input[start.min(input.len())..]);
    pieces
}

fn push_piece<'a>(pieces: &mut Vec<&'a str>, piece: &'a str) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed);
    }
}

/// Remove `/* ... */` comments, e.g. from a selector prelude.
pub fn strip_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'/' if starts_comment(bytes, i) => {
                out.push_str(&input[copied..i]);
                i = skip_comment(bytes, i);
                copied = i;
                out.push(' ');
            }
            _ => i += 1,
        }
    }
    out.push_str(&input[copied.min(input.len())..]);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    Adjacent,
    Sibling,
}

impl Combinator {
    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::Adjacent => " + ",
            Combinator::Sibling => " ~ ",
        }
    }
}

/// One compound selector plus its relation to the compound before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorPart<'a> {
    /// `None` for the leftmost compound.
    pub combinator: Option<Combinator>,
    pub compound: &'a str,
}

/// Split a single complex selector into compounds, left to right.
pub fn split_compounds(selector: &str) -> Vec<SelectorPart<'_>> {
    let bytes = selector.as_bytes();
    let mut parts = Vec::new();
    let mut pending: Option<Combinator> = None;
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if depth > 0 {
            match byte {
                b'(' | b'[' => depth += 1,
                b')' | b']' => depth -= 1,
                b'"' | b'\'' => {
                    i = skip_string(bytes, i);
                    continue;
                }
                _ => {}
            }
            i += 1;
            continue;
        }
        match byte {
            b'(' | b'[' => {
                depth += 1;
                start.get_or_insert(i);
            }
            b if b.is_ascii_whitespace() => {
                push_part(&mut parts, selector, start.take(), i, &mut pending);
                if !parts.is_empty() && pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
            }
            b'>' | b'+' | b'~' => {
                push_part(&mut parts, selector, start.take(), i, &mut pending);
                pending = Some(match byte {
                    b'>' => Combinator::Child,
                    b'+' => Combinator::Adjacent,
                    _ => Combinator::Sibling,
                });
            }
            _ => {
                start.get_or_insert(i);
            }
        }
        i += 1;
    }
    push_part(&mut parts, selector, start.take(), bytes.len(), &mut pending);
    parts
}

fn push_part<'a>(
    parts: &mut Vec<SelectorPart<'a>>,
    selector: &'a str,
    from: Option<usize>,
    to: usize,
    pending: &mut Option<Combinator>,
) {
    let Some(from) = from else {
        return;
    };
    let combinator = if parts.is_empty() {
        None
    } else {
        Some(pending.take().unwrap_or(Combinator::Descendant))
    };
    parts.push(SelectorPart {
        combinator,
        compound: &selector[from..to],
    });
    *pending = None;
}

/// Re-join compounds produced by [`split_compounds`].
pub fn join_compounds(parts: &[SelectorPart<'_>]) -> String {
    let mut out = String::new();
    for part in parts {
        if let Some(combinator) = part.combinator.filter(|_| !out.is_empty()) {
            out.push_str(combinator.as_str());
        }
        out.push_str(part.compound);
    }
    out
}

/// True when `selector` names `.class` as a whole class token.
pub fn has_class_token(selector: &str, class: &str) -> bool {
    let needle = format!(".{class}");
    selector.match_indices(&needle).any(|(index, _)| {
        selector[index + needle.len()..]
            .chars()
            .next()
            .is_none_or(|next| !is_ident_char(next))
    })
}

pub fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Parse a declaration block body (or an inline `style` value) with
/// `cssparser`. Malformed declarations are skipped.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(body);
    let mut parser = Parser::new(&mut input);
    let mut declarations = Vec::new();

    while !parser.is_exhausted() {
        if let Ok(declaration) = parser.parse_until_after(Delimiter::Semicolon, parse_declaration) {
            declarations.push(declaration);
        }
    }
    declarations
}

fn parse_declaration<'i>(parser: &mut Parser<'i, '_>) -> Result<Declaration, ParseError<'i, ()>> {
    let property = parser.expect_ident()?.to_ascii_lowercase();
    parser.expect_colon()?;

    let start = parser.position();
    let mut end = start;
    let mut important = false;
    loop {
        let (bang, opens_block) = match parser.next() {
            Ok(token) => (
                matches!(token, Token::Delim('!')),
                matches!(
                    token,
                    Token::Function(_)
                        | Token::ParenthesisBlock
                        | Token::SquareBracketBlock
                        | Token::CurlyBracketBlock
                ),
            ),
            Err(_) => break,
        };
        if opens_block {
            parser.parse_nested_block(skip_block)?;
        }
        if bang
            && parser
                .try_parse(|parser| parser.expect_ident_matching("important"))
                .is_ok()
            && parser.is_exhausted()
        {
            important = true;
            break;
        }
        end = parser.position();
    }

    let value = parser.slice(start..end).trim();
    if value.is_empty() {
        return Err(parser.new_custom_error(()));
    }
    Ok(Declaration {
        property,
        value: value.to_string(),
        important,
    })
}

fn skip_block<'i>(parser: &mut Parser<'i, '_>) -> Result<(), ParseError<'i, ()>> {
    while parser.next().is_ok() {}
    Ok(())
}
