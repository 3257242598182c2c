//! Regular expressions are compiled with the Glushkov construction: every occurrence of a symbol
//! (or a set of symbols) in the expression becomes one state of a non-deterministic automaton
//! without epsilon transitions, which is then minimized.
//!
//! The syntax is the usual one. Concatenation is written by juxtaposition, `|` is union, `*`, `+`
//! and `?` are postfix repetitions and parentheses group, with `()` denoting the empty word. For a
//! single coordinate, a decimal digit stands for itself, `[012]` or `[0,-1]` is a class of values
//! and `[^0]` its complement. For several coordinates, `[v1,v2,...]` denotes one input tuple. A `.`
//! matches every input. Whitespace is ignored.
use std::time::Instant;

use tracing::debug;

use crate::{automaton::TransitionMap, math::OrderedSet, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Epsilon,
    Position(usize),
    Concat(Box<Node>, Box<Node>),
    Union(Box<Node>, Box<Node>),
    Star(Box<Node>),
    Plus(Box<Node>),
    Optional(Box<Node>),
}

struct Parser<'a> {
    input: Vec<(usize, char)>,
    length: usize,
    pos: usize,
    coordinates: &'a Coordinates,
    positions: Vec<OrderedSet<Symbol>>,
}

impl<'a> Parser<'a> {
    fn new(regex: &str, coordinates: &'a Coordinates) -> Self {
        Self {
            input: regex
                .char_indices()
                .filter(|(_, c)| !c.is_whitespace())
                .collect(),
            length: regex.len(),
            pos: 0,
            coordinates,
            positions: vec![],
        }
    }

    fn error<S: Into<String>>(&self, message: S) -> AutomatonError {
        self.error_at(self.pos, message)
    }

    fn error_at<S: Into<String>>(&self, index: usize, message: S) -> AutomatonError {
        AutomatonError::Regex {
            position: self.input.get(index).map_or(self.length, |(i, _)| *i),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).map(|(_, c)| *c)
    }

    fn position<I: IntoIterator<Item = Symbol>>(&mut self, symbols: I) -> Node {
        self.positions.push(symbols.into_iter().collect());
        Node::Position(self.positions.len() - 1)
    }

    fn parse(mut self) -> Result<(Node, Vec<OrderedSet<Symbol>>)> {
        let node = self.parse_union()?;
        if self.pos < self.input.len() {
            return Err(self.error("unmatched closing parenthesis"));
        }
        Ok((node, self.positions))
    }

    fn parse_union(&mut self) -> Result<Node> {
        let mut node = self.parse_concat()?;
        while self.peek() == Some('|') {
            self.pos += 1;
            let rhs = self.parse_concat()?;
            node = Node::Union(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_concat(&mut self) -> Result<Node> {
        let mut node: Option<Node> = None;
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let next = self.parse_repeat()?;
            node = Some(match node {
                None => next,
                Some(prev) => Node::Concat(Box::new(prev), Box::new(next)),
            });
        }
        Ok(node.unwrap_or(Node::Epsilon))
    }

    fn parse_repeat(&mut self) -> Result<Node> {
        let mut node = self.parse_atom()?;
        loop {
            node = match self.peek() {
                Some('*') => Node::Star(Box::new(node)),
                Some('+') => Node::Plus(Box::new(node)),
                Some('?') => Node::Optional(Box::new(node)),
                _ => break,
            };
            self.pos += 1;
        }
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<Node> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of expression"));
        };
        match c {
            '(' => {
                self.pos += 1;
                let inner = self.parse_union()?;
                if self.peek() != Some(')') {
                    return Err(self.error("missing closing parenthesis"));
                }
                self.pos += 1;
                Ok(inner)
            }
            '.' => {
                self.pos += 1;
                Ok(self.position(self.coordinates.symbols()))
            }
            '[' => self.parse_bracket(),
            '0'..='9' if self.coordinates.len() == 1 => {
                self.pos += 1;
                let symbol = self.coordinates.encode(&[Value::from(c as u8 - b'0')]).ok();
                Ok(self.position(symbol))
            }
            '0'..='9' => Err(self.error(format!(
                "a digit denotes a single value, but inputs have {} coordinates",
                self.coordinates.len()
            ))),
            '*' | '+' | '?' => Err(self.error("nothing to repeat")),
            other => Err(self.error(format!("unexpected character `{other}`"))),
        }
    }

    fn parse_bracket(&mut self) -> Result<Node> {
        let open = self.pos;
        self.pos += 1;
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }
        let mut content = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error_at(open, "unterminated bracket")),
                Some(']') => break,
                Some(c) => content.push(c),
            }
            self.pos += 1;
        }
        self.pos += 1;

        let arity = self.coordinates.len();
        let values: Vec<Value> = if arity != 1 || content.contains(',') || content.contains('-') {
            content
                .split(',')
                .map(|v| v.parse::<Value>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| self.error_at(open, format!("invalid values `{content}`")))?
        } else {
            content
                .chars()
                .map(|c| c.to_digit(10).map(Value::from))
                .collect::<Option<_>>()
                .ok_or_else(|| self.error_at(open, format!("invalid digits `{content}`")))?
        };

        if arity == 1 {
            let listed: OrderedSet<Symbol> = values
                .iter()
                .filter_map(|&v| self.coordinates.encode(&[v]).ok())
                .collect();
            return Ok(if negated {
                self.position(self.coordinates.symbols().filter(|a| !listed.contains(a)))
            } else {
                self.position(listed)
            });
        }
        if negated {
            return Err(self.error_at(open, "negated classes need a single coordinate"));
        }
        if values.len() != arity {
            return Err(self.error_at(
                open,
                format!("expected a {arity}-tuple but got {} values", values.len()),
            ));
        }
        let symbol = self.coordinates.encode(&values).ok();
        Ok(self.position(symbol))
    }
}

/// Nullability together with the first and last positions of a subexpression.
struct Summary {
    nullable: bool,
    first: OrderedSet<usize>,
    last: OrderedSet<usize>,
}

/// Computes the summary of `node` and records which positions may follow each other in `follow`.
fn summarize(node: &Node, follow: &mut [OrderedSet<usize>]) -> Summary {
    match node {
        Node::Epsilon => Summary {
            nullable: true,
            first: OrderedSet::new(),
            last: OrderedSet::new(),
        },
        Node::Position(p) => Summary {
            nullable: false,
            first: OrderedSet::from([*p]),
            last: OrderedSet::from([*p]),
        },
        Node::Concat(lhs, rhs) => {
            let left = summarize(lhs, follow);
            let right = summarize(rhs, follow);
            for &q in &left.last {
                follow[q].extend(right.first.iter().copied());
            }
            let mut first = left.first;
            if left.nullable {
                first.extend(right.first.iter().copied());
            }
            let mut last = right.last;
            if right.nullable {
                last.extend(left.last);
            }
            Summary {
                nullable: left.nullable && right.nullable,
                first,
                last,
            }
        }
        Node::Union(lhs, rhs) => {
            let mut left = summarize(lhs, follow);
            let right = summarize(rhs, follow);
            left.first.extend(right.first);
            left.last.extend(right.last);
            Summary {
                nullable: left.nullable || right.nullable,
                ..left
            }
        }
        Node::Star(inner) | Node::Plus(inner) => {
            let summary = summarize(inner, follow);
            for &q in &summary.last {
                follow[q].extend(summary.first.iter().copied());
            }
            Summary {
                nullable: summary.nullable || matches!(node, Node::Star(_)),
                ..summary
            }
        }
        Node::Optional(inner) => Summary {
            nullable: true,
            ..summarize(inner, follow)
        },
    }
}

impl Automaton {
    /// Compiles a regular expression over a single coordinate with the given alphabet. Digits that
    /// are not in the alphabet match nothing.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let aut = Automaton::from_regex("(0|12)*", Alphabet::new([0, 1, 2]).unwrap()).unwrap();
    /// assert!(aut.accepts(&[vec![1], vec![2], vec![0]]).unwrap());
    /// assert!(!aut.accepts(&[vec![2], vec![1]]).unwrap());
    /// ```
    pub fn from_regex(regex: &str, alphabet: Alphabet) -> Result<Automaton> {
        Self::from_regex_with_coordinates(regex, Coordinates::plain(vec![alphabet]))
    }

    /// Compiles a regular expression whose symbols are inputs of the given coordinates. The
    /// result is minimal.
    ///
    /// Fails with [`AutomatonError::Regex`] on malformed expressions, carrying the byte offset of the
    /// offending character.
    pub fn from_regex_with_coordinates(regex: &str, coordinates: Coordinates) -> Result<Automaton> {
        let start = Instant::now();
        let (node, positions) = Parser::new(regex, &coordinates).parse()?;
        let mut follow = vec![OrderedSet::new(); positions.len()];
        let summary = summarize(&node, &mut follow);

        let edges = |targets: &OrderedSet<usize>| {
            let mut map = TransitionMap::new();
            for &p in targets {
                for &a in &positions[p] {
                    map.entry(a).or_insert_with(Vec::new).push(p + 1);
                }
            }
            map
        };
        let transitions: Vec<TransitionMap> = std::iter::once(edges(&summary.first))
            .chain(follow.iter().map(edges))
            .collect();
        let outputs = std::iter::once(Output::from(summary.nullable))
            .chain((0..positions.len()).map(|p| Output::from(summary.last.contains(&p))))
            .collect();

        let out = Automaton::new(coordinates, 0, outputs, transitions)?.minimize();
        debug!(
            "compiled `{regex}` with {} positions into {} states - {}ms",
            positions.len(),
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }
}
