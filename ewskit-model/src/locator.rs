//! Locator expressions: a small path language over [`Node`] trees.
//!
//! Grammar:
//!
//! ```text
//! locator   := ["//"] step ("/" step)* ["/@" name]  |  "@" name
//! step      := nametest [ "[@" name "=" quoted "]" ]
//! nametest  := prefix ":" local | prefix ":*" | local | "*"
//! ```
//!
//! Locators are evaluated relative to a scope node. A leading `//` selects
//! the scope and all of its descendants for the first step; otherwise the
//! first step matches children of the scope. Unprefixed names match the
//! local name in any namespace.

use crate::document::Node;
use crate::error::{ModelError, ModelResult};
use crate::namespace::Namespaces;

/// A parsed locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    source: String,
    descendant: bool,
    steps: Vec<Step>,
    attribute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    prefix: Option<String>,
    /// `None` is the `*` wildcard.
    local: Option<String>,
    predicate: Option<(String, String)>,
}

/// One node (or attribute value) selected by a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match<'a> {
    Element(&'a Node),
    Attribute(&'a str),
}

impl<'a> Match<'a> {
    /// Text carried by the match: element text or attribute value.
    pub fn text(&self) -> &'a str {
        match self {
            Match::Element(node) => node.text(),
            Match::Attribute(value) => value,
        }
    }
}

impl Locator {
    /// Parses a locator expression.
    pub fn parse(source: &str) -> ModelResult<Self> {
        let invalid = |reason: &str| ModelError::InvalidLocator {
            locator: source.to_string(),
            reason: reason.to_string(),
        };

        let (descendant, rest) = match source.strip_prefix("//") {
            Some(rest) => (true, rest),
            None => (false, source),
        };
        if rest.is_empty() {
            return Err(invalid("empty path"));
        }

        let segments = split_segments(rest).map_err(|r| invalid(&r))?;
        let mut steps = Vec::with_capacity(segments.len());
        let mut attribute = None;

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return Err(invalid("empty step"));
            }
            if let Some(name) = segment.strip_prefix('@') {
                if i + 1 != segments.len() {
                    return Err(invalid("attribute must be the last step"));
                }
                if name.is_empty() {
                    return Err(invalid("empty attribute name"));
                }
                attribute = Some(name.to_string());
                continue;
            }
            steps.push(parse_step(segment).map_err(|r| invalid(&r))?);
        }

        if descendant && steps.is_empty() {
            return Err(invalid("descendant search needs an element step"));
        }

        Ok(Self {
            source: source.to_string(),
            descendant,
            steps,
            attribute,
        })
    }

    /// The expression this locator was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the locator selects an attribute value.
    pub fn selects_attribute(&self) -> bool {
        self.attribute.is_some()
    }

    /// Resolves the locator against `scope`, returning matches in document order.
    pub fn resolve<'a>(
        &self,
        scope: &'a Node,
        namespaces: &Namespaces,
    ) -> ModelResult<Vec<Match<'a>>> {
        let tests = self
            .steps
            .iter()
            .map(|step| step.compile(namespaces))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut current: Vec<&'a Node> = vec![scope];
        for (i, test) in tests.iter().enumerate() {
            let candidates: Vec<&'a Node> = if i == 0 && self.descendant {
                scope.descendants_or_self()
            } else {
                current.iter().copied().flat_map(Node::children).collect()
            };
            current = candidates.into_iter().filter(|n| test.matches(n)).collect();
            if current.is_empty() {
                break;
            }
        }

        Ok(match &self.attribute {
            Some(name) => current
                .into_iter()
                .filter_map(|n| n.attribute(name))
                .map(Match::Attribute)
                .collect(),
            None => current.into_iter().map(Match::Element).collect(),
        })
    }

    /// Resolves the locator and keeps element matches only.
    pub fn resolve_nodes<'a>(
        &self,
        scope: &'a Node,
        namespaces: &Namespaces,
    ) -> ModelResult<Vec<&'a Node>> {
        Ok(self
            .resolve(scope, namespaces)?
            .into_iter()
            .filter_map(|m| match m {
                Match::Element(node) => Some(node),
                Match::Attribute(_) => None,
            })
            .collect())
    }
}

struct NameTest<'s> {
    namespace: Option<String>,
    local: Option<&'s str>,
    predicate: Option<&'s (String, String)>,
}

impl NameTest<'_> {
    fn matches(&self, node: &Node) -> bool {
        if let Some(ns) = &self.namespace {
            if node.namespace() != Some(ns.as_str()) {
                return false;
            }
        }
        if let Some(local) = self.local {
            if node.local_name() != local {
                return false;
            }
        }
        match self.predicate {
            Some((attr, value)) => node.attribute(attr) == Some(value.as_str()),
            None => true,
        }
    }
}

impl Step {
    fn compile(&self, namespaces: &Namespaces) -> ModelResult<NameTest<'_>> {
        let namespace = match &self.prefix {
            Some(prefix) => Some(
                namespaces
                    .resolve(prefix)
                    .ok_or_else(|| ModelError::UnknownPrefix(prefix.clone()))?
                    .to_string(),
            ),
            None => None,
        };
        Ok(NameTest {
            namespace,
            local: self.local.as_deref(),
            predicate: self.predicate.as_ref(),
        })
    }
}

fn parse_step(segment: &str) -> Result<Step, String> {
    let (name, predicate) = match segment.find('[') {
        Some(open) => {
            let body = segment[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| "unterminated predicate".to_string())?;
            (&segment[..open], Some(parse_predicate(body)?))
        }
        None => (segment, None),
    };

    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() => (Some(prefix.to_string()), local),
        Some(_) => return Err("empty prefix".to_string()),
        None => (None, name),
    };
    if local.is_empty() {
        return Err("empty element name".to_string());
    }
    let local = (local != "*").then(|| local.to_string());

    Ok(Step {
        prefix,
        local,
        predicate,
    })
}

fn parse_predicate(body: &str) -> Result<(String, String), String> {
    let body = body
        .strip_prefix('@')
        .ok_or_else(|| "predicate must test an attribute".to_string())?;
    let (name, quoted) = body
        .split_once('=')
        .ok_or_else(|| "predicate must compare with '='".to_string())?;
    let quoted = quoted.trim();
    let value = quoted
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| quoted.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .ok_or_else(|| "predicate value must be quoted".to_string())?;
    Ok((name.trim().to_string(), value.to_string()))
}

/// Splits on `/` outside of predicates and quotes.
fn split_segments(path: &str) -> Result<Vec<&str>, String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in path.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.checked_sub(1).ok_or("unbalanced ']'")?,
            (None, '/') if depth == 0 => {
                segments.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err("unbalanced predicate".to_string());
    }
    segments.push(&path[start..]);
    Ok(segments)
}
