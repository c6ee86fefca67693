//! # ShellTk CSS Parser
//!
//! Tokenizer/parser for the shell stylesheet dialect.
//!
//! ## Design Goals
//!
//! 1. **Selector parsing**: element type, `#id`, `.class`, `:pseudo-class`,
//!    descendant and child combinators, comma-separated selector lists
//! 2. **Declaration parsing**: `property: value;` pairs with `!important`
//! 3. **Error recovery**: a malformed rule or declaration is skipped without
//!    poisoning the rest of the sheet
//! 4. **Specificity**: computed per selector at parse time

use thiserror::Error;

/// Errors that can occur while parsing a stylesheet.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unbalanced braces at offset {0}")]
    UnbalancedBraces(usize),

    #[error("Unterminated comment at offset {0}")]
    UnterminatedComment(usize),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
}

/// Combinator relating a selector part to the part on its left.
///
/// The leftmost part of a selector carries `Combinator::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    None,
    /// Whitespace combinator: any ancestor.
    Descendant,
    /// `>` combinator: direct parent.
    Child,
}

/// One compound selector: an element type (or wildcard), optional id,
/// class names, and an optional pseudo-class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorPart {
    pub combinator: Combinator,
    /// `None` means the wildcard `*` (or an omitted type).
    pub element: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub pseudo_class: Option<String>,
}

/// A full selector: one or more compound parts joined by combinators,
/// ordered left to right (the last part matches the subject element).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
}

impl Selector {
    /// CSS specificity: id = 100, class = 10, pseudo-class = 10, type = 1,
    /// wildcard = 0, summed over every part.
    pub fn specificity(&self) -> u32 {
        let mut total = 0;
        for part in &self.parts {
            if part.id.is_some() {
                total += 100;
            }
            total += 10 * part.classes.len() as u32;
            if part.pseudo_class.is_some() {
                total += 10;
            }
            if part.element.is_some() {
                total += 1;
            }
        }
        total
    }

    /// The rightmost compound, which matches the subject element itself.
    ///
    /// `None` only for a hand-built selector with no parts; the parser
    /// never produces one.
    pub fn subject(&self) -> Option<&SelectorPart> {
        self.parts.last()
    }
}

/// A single `property: value` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// A rule: a selector list and the declarations applied by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// A parsed stylesheet: rules in source order.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Parse a stylesheet source string.
///
/// Comments are stripped, at-rules are skipped, and individual malformed
/// rules or declarations are dropped. Only structural damage (an unclosed
/// block or comment) fails the whole sheet.
pub fn parse_stylesheet(source: &str) -> Result<Stylesheet, ParseError> {
    let source = strip_comments(source)?;
    let mut rules = Vec::new();
    let bytes = source.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        // Skip leading whitespace.
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        if bytes[pos] == b'@' {
            pos = skip_at_rule(&source, pos)?;
            continue;
        }

        let brace = match source[pos..].find('{') {
            Some(off) => pos + off,
            None => {
                // Trailing junk with no block; tolerate it.
                break;
            }
        };
        let close = find_block_end(&source, brace)?;

        let selector_text = &source[pos..brace];
        let body = &source[brace + 1..close];
        pos = close + 1;

        let selectors = match parse_selector_list(selector_text) {
            Ok(sels) if !sels.is_empty() => sels,
            // Bad selector: drop this rule, keep parsing.
            _ => continue,
        };
        let declarations = parse_declarations(body);
        rules.push(Rule {
            selectors,
            declarations,
        });
    }

    Ok(Stylesheet { rules })
}

/// Parse a declaration block body (without the surrounding braces).
///
/// Malformed declarations are skipped.
pub fn parse_declarations(body: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for chunk in split_outside_parens(body, ';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let Some(colon) = chunk.find(':') else {
            continue;
        };
        let property = chunk[..colon].trim();
        let mut value = chunk[colon + 1..].trim();
        if property.is_empty() || value.is_empty() {
            continue;
        }
        if !is_valid_identifier(property) {
            continue;
        }

        // The keyword is case-insensitive, like the rest of CSS.
        const IMPORTANT: &str = "!important";
        let mut important = false;
        if value.len() >= IMPORTANT.len() {
            let split = value.len() - IMPORTANT.len();
            if value.is_char_boundary(split) && value[split..].eq_ignore_ascii_case(IMPORTANT) {
                important = true;
                value = value[..split].trim_end();
            }
        }
        if value.is_empty() {
            continue;
        }

        declarations.push(Declaration {
            property: property.to_ascii_lowercase(),
            value: value.to_string(),
            important,
        });
    }
    declarations
}

/// Parse a comma-separated selector list.
pub fn parse_selector_list(text: &str) -> Result<Vec<Selector>, ParseError> {
    let mut selectors = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return Err(ParseError::InvalidSelector(text.trim().to_string()));
        }
        selectors.push(parse_selector(part)?);
    }
    Ok(selectors)
}

/// Parse a single selector (no commas).
pub fn parse_selector(text: &str) -> Result<Selector, ParseError> {
    let mut parts = Vec::new();
    let mut next_combinator = Combinator::None;

    for token in tokenize_selector(text) {
        match token {
            ">" => {
                if parts.is_empty() || next_combinator != Combinator::Descendant {
                    // `>` at the start or doubled up.
                    return Err(ParseError::InvalidSelector(text.to_string()));
                }
                next_combinator = Combinator::Child;
            }
            compound => {
                let mut part = parse_compound(compound)
                    .ok_or_else(|| ParseError::InvalidSelector(text.to_string()))?;
                part.combinator = if parts.is_empty() {
                    Combinator::None
                } else {
                    next_combinator
                };
                parts.push(part);
                next_combinator = Combinator::Descendant;
            }
        }
    }

    // Empty selector, or a trailing `>` with no right-hand side.
    if parts.is_empty() || next_combinator == Combinator::Child {
        return Err(ParseError::InvalidSelector(text.to_string()));
    }
    Ok(Selector { parts })
}

/// Split a selector into compound tokens and `>` combinators.
fn tokenize_selector(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().flat_map(|word| {
        // `a>b` written without spaces.
        let mut tokens = Vec::new();
        let mut rest = word;
        while let Some(idx) = rest.find('>') {
            if idx > 0 {
                tokens.push(&rest[..idx]);
            }
            tokens.push(">");
            rest = &rest[idx + 1..];
        }
        if !rest.is_empty() {
            tokens.push(rest);
        }
        tokens
    })
}

/// Parse one compound selector token like `Button#ok.primary:hover`.
fn parse_compound(token: &str) -> Option<SelectorPart> {
    let mut part = SelectorPart::default();
    let mut rest = token;

    // Leading element type or wildcard.
    let type_end = rest
        .find(|c| c == '#' || c == '.' || c == ':')
        .unwrap_or(rest.len());
    let type_name = &rest[..type_end];
    rest = &rest[type_end..];
    match type_name {
        "" | "*" => {}
        name if is_valid_identifier(name) => part.element = Some(name.to_string()),
        _ => return None,
    }

    while !rest.is_empty() {
        let marker = rest.as_bytes()[0];
        let tail = &rest[1..];
        let end = tail
            .find(|c| c == '#' || c == '.' || c == ':')
            .unwrap_or(tail.len());
        let name = &tail[..end];
        if !is_valid_identifier(name) {
            return None;
        }
        match marker {
            b'#' => {
                if part.id.is_some() {
                    return None;
                }
                part.id = Some(name.to_string());
            }
            b'.' => part.classes.push(name.to_string()),
            b':' => {
                if part.pseudo_class.is_some() {
                    return None;
                }
                part.pseudo_class = Some(name.to_string());
            }
            _ => return None,
        }
        rest = &tail[end..];
    }

    Some(part)
}

fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !s.starts_with(|c: char| c.is_ascii_digit())
}

/// Remove `/* ... */` comments, preserving everything else verbatim.
/// `/*` inside a quoted string is literal text, not a comment opener.
fn strip_comments(source: &str) -> Result<String, ParseError> {
    let mut out = String::with_capacity(source.len());
    let mut quote: Option<char> = None;
    let mut chars = source.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
                out.push(c);
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    out.push(c);
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    chars.next();
                    let mut prev_star = false;
                    let mut closed = false;
                    for (_, cc) in chars.by_ref() {
                        if prev_star && cc == '/' {
                            closed = true;
                            break;
                        }
                        prev_star = cc == '*';
                    }
                    if !closed {
                        return Err(ParseError::UnterminatedComment(i));
                    }
                }
                _ => out.push(c),
            },
        }
    }
    Ok(out)
}

/// Find the `}` closing the block opened at `open` (a `{` offset),
/// tracking nesting depth.
fn find_block_end(source: &str, open: usize) -> Result<usize, ParseError> {
    let mut depth = 0;
    for (i, c) in source[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + i);
                }
            }
            _ => {}
        }
    }
    Err(ParseError::UnbalancedBraces(open))
}

/// Skip an at-rule starting at `pos`: either to the terminating `;` or past
/// its block.
fn skip_at_rule(source: &str, pos: usize) -> Result<usize, ParseError> {
    for (i, c) in source[pos..].char_indices() {
        match c {
            ';' => return Ok(pos + i + 1),
            '{' => return Ok(find_block_end(source, pos + i)? + 1),
            _ => {}
        }
    }
    Ok(source.len())
}

/// Split on `sep` outside of parentheses and quotes, so values like
/// `url("a;b")` stay intact.
fn split_outside_parens(text: &str, sep: char) -> Vec<&str> {
    let mut result = Vec::new();
    let mut depth = 0;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => depth -= 1,
                c if c == sep && depth == 0 => {
                    result.push(&text[start..i]);
                    start = i + sep.len_utf8();
                }
                _ => {}
            },
        }
    }
    result.push(&text[start..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rule() {
        let sheet = parse_stylesheet("Button { color: red; padding: 4px; }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        let rule = &sheet.rules[0];
        assert_eq!(rule.selectors.len(), 1);
        assert_eq!(
            rule.selectors[0].subject().unwrap().element.as_deref(),
            Some("Button")
        );
        assert_eq!(rule.declarations.len(), 2);
        assert_eq!(rule.declarations[0].property, "color");
        assert_eq!(rule.declarations[0].value, "red");
    }

    #[test]
    fn test_parse_compound_selector() {
        let sel = parse_selector("Button#ok.primary.large:hover").unwrap();
        assert_eq!(sel.parts.len(), 1);
        let part = &sel.parts[0];
        assert_eq!(part.element.as_deref(), Some("Button"));
        assert_eq!(part.id.as_deref(), Some("ok"));
        assert_eq!(part.classes, vec!["primary", "large"]);
        assert_eq!(part.pseudo_class.as_deref(), Some("hover"));
    }

    #[test]
    fn test_parse_combinators() {
        let sel = parse_selector("Panel > Box .label").unwrap();
        assert_eq!(sel.parts.len(), 3);
        assert_eq!(sel.parts[0].combinator, Combinator::None);
        assert_eq!(sel.parts[1].combinator, Combinator::Child);
        assert_eq!(sel.parts[2].combinator, Combinator::Descendant);

        // Without spaces around `>`.
        let sel = parse_selector("Panel>Box").unwrap();
        assert_eq!(sel.parts.len(), 2);
        assert_eq!(sel.parts[1].combinator, Combinator::Child);

        assert!(parse_selector("> Box").is_err());
        assert!(parse_selector("Panel >").is_err());
    }

    #[test]
    fn test_specificity() {
        assert_eq!(parse_selector("*").unwrap().specificity(), 0);
        assert_eq!(parse_selector("Button").unwrap().specificity(), 1);
        assert_eq!(parse_selector(".warn").unwrap().specificity(), 10);
        assert_eq!(parse_selector(":hover").unwrap().specificity(), 10);
        assert_eq!(parse_selector("#panel").unwrap().specificity(), 100);
        assert_eq!(
            parse_selector("Panel Button.flat:hover").unwrap().specificity(),
            22
        );
    }

    #[test]
    fn test_selector_list() {
        let sheet = parse_stylesheet("Button, .warn { color: red; }").unwrap();
        assert_eq!(sheet.rules[0].selectors.len(), 2);
    }

    #[test]
    fn test_important() {
        let decls = parse_declarations("color: red !important; padding: 2px;");
        assert!(decls[0].important);
        assert!(!decls[1].important);
    }

    #[test]
    fn test_important_case_insensitive() {
        let decls = parse_declarations("color: red !IMPORTANT; border: 1px !Important;");
        assert_eq!(decls.len(), 2);
        assert!(decls[0].important);
        assert_eq!(decls[0].value, "red");
        assert!(decls[1].important);
        assert_eq!(decls[1].value, "1px");
    }

    #[test]
    fn test_empty_selector_has_no_subject() {
        let selector = Selector { parts: Vec::new() };
        assert!(selector.subject().is_none());
        assert_eq!(selector.specificity(), 0);
    }

    #[test]
    fn test_malformed_declaration_skipped() {
        let decls = parse_declarations("color red; padding: 2px; : 4px;");
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].property, "padding");
    }

    #[test]
    fn test_malformed_rule_skipped() {
        let sheet = parse_stylesheet("?? !! { color: red; } Button { color: blue; }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(
            sheet.rules[0].selectors[0].subject().unwrap().element.as_deref(),
            Some("Button")
        );
    }

    #[test]
    fn test_comments_stripped() {
        let sheet =
            parse_stylesheet("/* header */ Button { /* inline */ color: red; }").unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].declarations.len(), 1);
    }

    #[test]
    fn test_comment_marker_inside_string_is_literal() {
        let sheet =
            parse_stylesheet("Button { background-image: url(\"a/*b*/c.png\"); }").unwrap();
        let decls = &sheet.rules[0].declarations;
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].value, "url(\"a/*b*/c.png\")");
    }

    #[test]
    fn test_at_rule_skipped() {
        let css = "@import \"other.css\"; @media screen { Button { color: red; } } Label { color: blue; }";
        let sheet = parse_stylesheet(css).unwrap();
        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(
            sheet.rules[0].selectors[0].subject().unwrap().element.as_deref(),
            Some("Label")
        );
    }

    #[test]
    fn test_unbalanced_braces_fail() {
        assert!(parse_stylesheet("Button { color: red;").is_err());
    }

    #[test]
    fn test_url_value_with_semicolon() {
        let decls = parse_declarations("background-image: url(\"a;b.png\"); color: red;");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].value, "url(\"a;b.png\")");
    }
}
