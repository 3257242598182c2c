use std::{path::Path, str::FromStr};

use tracing::debug;

use crate::{automaton::TransitionMap, prelude::*};

/// Parses the inside of an integer set like `{-1, 0, 1}`, `body` is the text after the opening brace.
/// Returns the alphabet and the rest of the line after the closing brace.
fn parse_set(body: &str, line_number: usize) -> Result<(Alphabet, &str)> {
    let Some(end) = body.find('}') else {
        return Err(AutomatonError::parse(line_number, "unclosed `{` in alphabet"));
    };
    let values = body[..end]
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<Value>()
                .map_err(|_| AutomatonError::parse(line_number, format!("`{v}` is not an integer")))
        })
        .collect::<Result<Vec<_>>>()?;
    let alphabet = Alphabet::deduplicated(values)
        .map_err(|e| AutomatonError::parse(line_number, e.to_string()))?;
    Ok((alphabet, &body[end + 1..]))
}

/// Parses the alphabet line. Every coordinate is either an integer set, a number system with its
/// default digits (`msd_2`) or a number system directly followed by its digits (`msd_3{-1, 0, 1}`).
/// Returns `None` if the line is not an alphabet declaration at all.
fn parse_alphabet_line(line: &str, line_number: usize) -> Result<Option<Coordinates>> {
    let mut alphabets = vec![];
    let mut number_systems = vec![];
    let mut rest = line.trim();
    while !rest.is_empty() {
        if let Some(after_brace) = rest.strip_prefix('{') {
            let (alphabet, after) = parse_set(after_brace, line_number)?;
            alphabets.push(alphabet);
            number_systems.push(None);
            rest = after.trim_start();
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '{')
                .unwrap_or(rest.len());
            let word = &rest[..end];
            if !(word.starts_with("msd_") || word.starts_with("lsd_")) {
                return Ok(None);
            }
            let ns = NumberSystem::new(word);
            match rest[end..].strip_prefix('{') {
                Some(after_brace) => {
                    let (alphabet, after) = parse_set(after_brace, line_number)?;
                    alphabets.push(alphabet);
                    rest = after.trim_start();
                }
                None => {
                    alphabets.push(ns.default_alphabet());
                    rest = rest[end..].trim_start();
                }
            }
            number_systems.push(Some(ns));
        }
    }
    Coordinates::new(alphabets, number_systems)
        .map(Some)
        .map_err(|e| AutomatonError::parse(line_number, e.to_string()))
}

/// Parses `id output`.
fn parse_state_line(line: &str) -> Option<(StateIndex, Output)> {
    let mut parts = line.split_whitespace();
    let id = parts.next()?.parse().ok()?;
    let output = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some((id, output))
}

/// Parses `v_1 ... v_n -> d_1 ... d_m` where each `v_i` is an integer or the wildcard `*`.
fn parse_transition_line(line: &str) -> Option<(Vec<Option<Value>>, Vec<StateIndex>)> {
    let (input, destinations) = line.split_once("->")?;
    let input = input
        .split_whitespace()
        .map(|v| match v {
            "*" => Some(None),
            v => v.parse().ok().map(Some),
        })
        .collect::<Option<Vec<_>>>()?;
    let destinations = destinations
        .split_whitespace()
        .map(|d| d.parse().ok())
        .collect::<Option<Vec<_>>>()?;
    (!destinations.is_empty()).then_some((input, destinations))
}

impl FromStr for Automaton {
    type Err = AutomatonError;

    /// Parses the textual format. The first non-blank line is either `true`, `false` or the
    /// alphabet declaration, which lists for each coordinate either an integer set like `{-1, 0, 1}`
    /// or a number system like `msd_2` (whose alphabet is then `{0, 1}`). What follows are state
    /// blocks: a line `id output` followed by transition lines `v_1 ... v_n -> d_1 ... d_m` where
    /// `*` matches every value of the corresponding coordinate. The first declared state is
    /// the initial one and states have to be numbered `0` to `n-1`.
    fn from_str(s: &str) -> Result<Self> {
        let mut lines = s
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let coordinates = match lines.next() {
            None => return Err(AutomatonError::parse(0, "input is empty")),
            Some((_, "true")) => return Ok(Automaton::trivial(true)),
            Some((_, "false")) => return Ok(Automaton::trivial(false)),
            Some((number, line)) => parse_alphabet_line(line, number)?
                .ok_or_else(|| AutomatonError::parse(number, "undefined statement"))?,
        };

        let mut declared: Map<StateIndex, (Output, TransitionMap)> = Map::default();
        let mut order = vec![];
        let mut referenced = vec![];
        let mut current = None;
        for (number, line) in lines {
            if let Some((id, output)) = parse_state_line(line) {
                if declared.insert(id, (output, TransitionMap::new())).is_some() {
                    return Err(AutomatonError::parse(
                        number,
                        format!("state {id} is declared twice"),
                    ));
                }
                order.push(id);
                current = Some(id);
            } else if let Some((input, destinations)) = parse_transition_line(line) {
                let Some(state) = current else {
                    return Err(AutomatonError::parse(
                        number,
                        "transitions must follow a state declaration",
                    ));
                };
                let symbols = coordinates
                    .expand_wildcard(&input)?
                    .iter()
                    .map(|tuple| coordinates.encode(tuple))
                    .collect::<Result<Vec<_>>>()?;
                referenced.extend(destinations.iter().copied());
                if let Some((_, map)) = declared.get_mut(&state) {
                    for symbol in symbols {
                        map.insert(symbol, destinations.clone());
                    }
                }
            } else {
                return Err(AutomatonError::parse(number, "undefined statement"));
            }
        }

        if let Some(&q) = referenced.iter().find(|&&q| !declared.contains_key(&q)) {
            return Err(AutomatonError::UndeclaredState(q));
        }
        let states = order.len();
        if let Some(&q) = order.iter().find(|&&q| q >= states) {
            return Err(AutomatonError::parse(
                0,
                format!("state {q} is out of range, states must be numbered 0 to {}", states.saturating_sub(1)),
            ));
        }
        let Some(&initial) = order.first() else {
            return Err(AutomatonError::parse(0, "no state is declared"));
        };
        let (outputs, transitions) = (0..states)
            .filter_map(|q| declared.remove(&q))
            .unzip();
        debug!("parsed automaton with {states} states");
        Automaton::new(coordinates, initial, outputs, transitions)
    }
}

impl Automaton {
    /// Reads an automaton in the textual format from the file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::read_to_string(path)?.parse()
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn parse_with_wildcards_and_number_systems() {
        let aut: Automaton = "msd_2 {-1, 0, 1}\n\n0 1\n0 * -> 0\n1 -1 -> 1\n\n1 0\n* * -> 1\n"
            .parse()
            .unwrap();
        assert_eq!(aut.arity(), 2);
        assert_eq!(aut.state_count(), 2);
        assert_eq!(aut.alphabet_size(), 6);
        assert_eq!(aut.coordinates().number_system(0), Some(&NumberSystem::msd(2)));
        assert!(aut.coordinates().number_system(1).is_none());
        assert!(aut.accepts(&[vec![0, 1], vec![0, -1]]).unwrap());
        assert!(!aut.accepts(&[vec![1, -1]]).unwrap());
        assert_eq!(aut.transitions()[0].len(), 4);
    }

    #[test_log::test]
    fn number_systems_with_own_digits() {
        let aut: Automaton = "msd_bal3{-1, 0, 1} {0, 1}\n0 1\n-1 * -> 0\n".parse().unwrap();
        assert_eq!(aut.arity(), 2);
        assert_eq!(aut.coordinates().number_system(0), Some(&NumberSystem::new("msd_bal3")));
        assert_eq!(aut.coordinates().alphabet(0), &Alphabet::new([-1, 0, 1]).unwrap());
        assert!(aut.coordinates().number_system(1).is_none());
        assert!(aut.accepts(&[vec![-1, 1]]).unwrap());
        assert!(matches!(
            "msd_2{2, 3}\n0 1\n".parse::<Automaton>(),
            Err(AutomatonError::Parse { line: 1, .. })
        ));
    }

    #[test_log::test]
    fn trivial_files() {
        let t: Automaton = "\n  true\n".parse().unwrap();
        assert_eq!(t.is_trivial(), Some(true));
        let f: Automaton = "false".parse().unwrap();
        assert_eq!(f.is_trivial(), Some(false));
    }

    #[test_log::test]
    fn parse_errors() {
        assert!(matches!(
            "{0,1}\n0 0\n0 -> 3\n".parse::<Automaton>(),
            Err(AutomatonError::UndeclaredState(3))
        ));
        assert!(matches!(
            "{0,1}\n0 0\n0 1 -> 0\n".parse::<Automaton>(),
            Err(AutomatonError::ArityMismatch {
                expected: 1,
                found: 2
            })
        ));
        assert!(matches!(
            "{0,1}\n0 0\nwhat is this\n".parse::<Automaton>(),
            Err(AutomatonError::Parse { line: 3, .. })
        ));
        assert!(matches!(
            "{0,1}\n0 -> 0\n".parse::<Automaton>(),
            Err(AutomatonError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            "hello world\n".parse::<Automaton>(),
            Err(AutomatonError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            "{0,1}\n0 0\n2 -> 0\n".parse::<Automaton>(),
            Err(AutomatonError::InvalidSymbol {
                coordinate: 0,
                value: 2
            })
        ));
    }
}
