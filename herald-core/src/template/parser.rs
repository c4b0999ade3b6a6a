//! Template parser
//!
//! Turns template source into a tree of [`Node`]s. The syntax is the subset
//! of Handlebars used by CI notification templates:
//!
//! - `{{ Repo.FullName }}` and `{{{ Repo.FullName }}}` for substitution
//! - `{{ helper arg 'literal' 42 }}` for inline helpers
//! - `{{#helper arg}} ... {{else}} ... {{/helper}}` for block helpers
//! - `{{! comment }}` and `{{!-- comment --}}`
//!
//! Parsing only checks syntax. Whether a helper or variable exists is decided
//! at render time.

use serde_json::Value;

use crate::error::RenderError;

/// A helper or path argument
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Dotted path into the metadata, e.g. `Build.Status`
    Path(String),
    /// String, integer or boolean literal
    Literal(Value),
}

/// Contents of a tag: a name followed by zero or more parameters
///
/// Without parameters the name is either a variable path or a helper that
/// takes no arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub name: String,
    pub params: Vec<Param>,
}

/// A parsed template element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Expression(Expression),
    Block {
        expression: Expression,
        body: Vec<Node>,
        inverse: Vec<Node>,
    },
}

/// A parsed template, ready to render any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source
    ///
    /// # Errors
    /// Returns a syntax [`RenderError`] on unclosed tags, empty tags,
    /// unterminated strings, invalid expressions or unbalanced blocks.
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        let mut stack = vec![Frame::root()];
        let mut cursor = 0;

        while let Some(found) = source[cursor..].find("{{") {
            let start = cursor + found;
            if start > cursor {
                current(&mut stack).push(Node::Text(source[cursor..start].to_string()));
            }

            let tag = Tag::read(source, start)?;
            cursor = tag.end;

            match tag.kind {
                TagKind::Comment => {}
                TagKind::Raw => {
                    let expression = parse_expression(tag.inner, tag.inner, start)?;
                    current(&mut stack).push(Node::Expression(expression));
                }
                TagKind::Mustache => handle_mustache(&mut stack, tag.inner, start)?,
            }
        }

        if cursor < source.len() {
            current(&mut stack).push(Node::Text(source[cursor..].to_string()));
        }

        if stack.len() > 1 {
            let name = stack
                .pop()
                .and_then(|frame| frame.expression)
                .map(|expression| expression.name)
                .unwrap_or_default();
            return Err(RenderError::UnclosedBlock { name });
        }

        let root = stack.pop().map(|frame| frame.body).unwrap_or_default();
        Ok(Self { nodes: root })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// A block under construction
struct Frame {
    expression: Option<Expression>,
    body: Vec<Node>,
    inverse: Vec<Node>,
    in_inverse: bool,
}

impl Frame {
    fn root() -> Self {
        Self::open(None)
    }

    fn open(expression: Option<Expression>) -> Self {
        Self {
            expression,
            body: Vec::new(),
            inverse: Vec::new(),
            in_inverse: false,
        }
    }

    fn push(&mut self, node: Node) {
        if self.in_inverse {
            self.inverse.push(node);
        } else {
            self.body.push(node);
        }
    }
}

fn current(stack: &mut [Frame]) -> &mut Frame {
    // The root frame is never popped while parsing.
    let last = stack.len() - 1;
    &mut stack[last]
}

enum TagKind {
    Mustache,
    Raw,
    Comment,
}

struct Tag<'a> {
    kind: TagKind,
    inner: &'a str,
    end: usize,
}

impl<'a> Tag<'a> {
    fn read(source: &'a str, start: usize) -> Result<Self, RenderError> {
        let rest = &source[start..];
        let (kind, open, close) = if rest.starts_with("{{!--") {
            (TagKind::Comment, "{{!--", "--}}")
        } else if rest.starts_with("{{!") {
            (TagKind::Comment, "{{!", "}}")
        } else if rest.starts_with("{{{") {
            (TagKind::Raw, "{{{", "}}}")
        } else {
            (TagKind::Mustache, "{{", "}}")
        };

        let inner_start = start + open.len();
        let inner_len = source[inner_start..]
            .find(close)
            .ok_or(RenderError::UnclosedTag { offset: start })?;
        let inner = &source[inner_start..inner_start + inner_len];

        if !matches!(kind, TagKind::Comment) && inner.trim().is_empty() {
            return Err(RenderError::EmptyTag { offset: start });
        }

        Ok(Self {
            kind,
            inner,
            end: inner_start + inner_len + close.len(),
        })
    }
}

fn handle_mustache(stack: &mut Vec<Frame>, inner: &str, offset: usize) -> Result<(), RenderError> {
    let trimmed = inner.trim();

    if let Some(open) = trimmed.strip_prefix('#') {
        let expression = parse_expression(open, trimmed, offset)?;
        stack.push(Frame::open(Some(expression)));
        return Ok(());
    }

    if let Some(close) = trimmed.strip_prefix('/') {
        let name = close.trim();
        if stack.len() == 1 {
            return Err(RenderError::UnexpectedTag {
                tag: format!("{{{{{}}}}}", trimmed),
            });
        }
        let Some(frame) = stack.pop() else {
            return Err(RenderError::UnexpectedTag {
                tag: trimmed.to_string(),
            });
        };
        let Some(expression) = frame.expression else {
            return Err(RenderError::UnexpectedTag {
                tag: trimmed.to_string(),
            });
        };
        if expression.name != name {
            return Err(RenderError::MismatchedBlock {
                expected: expression.name,
                found: name.to_string(),
            });
        }
        current(stack).push(Node::Block {
            expression,
            body: frame.body,
            inverse: frame.inverse,
        });
        return Ok(());
    }

    if trimmed == "else" {
        let frame = current(stack);
        if frame.expression.is_none() || frame.in_inverse {
            return Err(RenderError::UnexpectedTag {
                tag: "{{else}}".to_string(),
            });
        }
        frame.in_inverse = true;
        return Ok(());
    }

    let expression = parse_expression(trimmed, trimmed, offset)?;
    current(stack).push(Node::Expression(expression));
    Ok(())
}

enum Token {
    Word(String),
    Quoted(String),
}

fn tokenize(input: &str, tag: &str) -> Result<Vec<Token>, RenderError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == c {
                    closed = true;
                    break;
                }
                value.push(next);
            }
            if !closed {
                return Err(RenderError::UnterminatedString {
                    tag: tag.to_string(),
                });
            }
            tokens.push(Token::Quoted(value));
            continue;
        }

        let mut word = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_whitespace() || next == '\'' || next == '"' {
                break;
            }
            word.push(next);
            chars.next();
        }
        tokens.push(Token::Word(word));
    }

    Ok(tokens)
}

fn parse_expression(input: &str, tag: &str, offset: usize) -> Result<Expression, RenderError> {
    let mut tokens = tokenize(input, tag)?.into_iter();

    let name = match tokens.next() {
        Some(Token::Word(word)) => word,
        Some(Token::Quoted(_)) => {
            return Err(RenderError::InvalidExpression {
                tag: tag.to_string(),
                reason: "expected a name, found a string literal".to_string(),
            });
        }
        None => return Err(RenderError::EmptyTag { offset }),
    };
    if !is_valid_path(&name) {
        return Err(RenderError::InvalidExpression {
            tag: tag.to_string(),
            reason: format!("'{}' is not a valid name", name),
        });
    }

    let params = tokens
        .map(|token| match token {
            Token::Quoted(value) => Ok(Param::Literal(Value::String(value))),
            Token::Word(word) => parse_word(word, tag),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Expression { name, params })
}

fn parse_word(word: String, tag: &str) -> Result<Param, RenderError> {
    match word.as_str() {
        "true" => return Ok(Param::Literal(Value::Bool(true))),
        "false" => return Ok(Param::Literal(Value::Bool(false))),
        _ => {}
    }
    if let Ok(number) = word.parse::<i64>() {
        return Ok(Param::Literal(Value::from(number)));
    }
    if is_valid_path(&word) {
        return Ok(Param::Path(word));
    }
    Err(RenderError::InvalidExpression {
        tag: tag.to_string(),
        reason: format!("'{}' is not a valid argument", word),
    })
}

fn is_valid_path(word: &str) -> bool {
    !word.is_empty()
        && word.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '@')
        })
}
