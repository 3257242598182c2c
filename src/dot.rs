use std::fmt::Display;

use itertools::Itertools;

use crate::{math::OrderedMap, prelude::*};

/// Attributes of a node in the graphviz representation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotStateAttribute {
    /// The label of a node
    Label(String),
    /// The shape of a node
    Shape(String),
}

impl Display for DotStateAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotStateAttribute::Label(s) => write!(f, "label=\"{s}\""),
            DotStateAttribute::Shape(s) => write!(f, "shape=\"{s}\""),
        }
    }
}

/// Attributes of an edge in the graphviz representation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DotTransitionAttribute {
    /// The label of an edge
    Label(String),
}

impl Display for DotTransitionAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DotTransitionAttribute::Label(lbl) => write!(f, "label=\"{lbl}\""),
        }
    }
}

fn show_tuple(tuple: &[Value]) -> String {
    match tuple {
        [value] => value.to_string(),
        values => format!("[{}]", values.iter().join(",")),
    }
}

impl Automaton {
    fn dot_state_attributes(&self, q: StateIndex) -> Vec<DotStateAttribute> {
        let shape = if !self.has_output() && self.is_accepting(q) {
            "doublecircle"
        } else {
            "circle"
        };
        let label = if self.has_output() {
            format!("{q}/{}", self.output(q))
        } else {
            q.to_string()
        };
        vec![
            DotStateAttribute::Shape(shape.into()),
            DotStateAttribute::Label(label),
        ]
    }

    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    ///
    /// States are numbered as in the canonical form. Accepting states of plain automata are drawn
    /// with a double circle, automata with output show the output next to the state. Parallel edges
    /// are merged into one edge carrying all input tuples.
    pub fn dot_representation(&self) -> String {
        if let Some(value) = self.is_trivial() {
            return format!("digraph A {{\nq0 [label=\"{value}\", shape=\"plaintext\"]\n}}");
        }
        let aut = self.canonize();
        let header = [
            "digraph A {".to_string(),
            "rankdir = LR;".to_string(),
            "init [label=\"\", shape=\"none\"]".to_string(),
        ];
        let states = (0..aut.state_count()).map(|q| {
            format!(
                "q{q} [{}]",
                aut.dot_state_attributes(q)
                    .into_iter()
                    .map(|attr| attr.to_string())
                    .join(", ")
            )
        });
        let transitions = (0..aut.state_count()).flat_map(|q| {
            let mut edges: OrderedMap<StateIndex, Vec<String>> = OrderedMap::new();
            for (&a, successors) in &aut.transitions()[q] {
                let tuple = show_tuple(&aut.coordinates().decode(a));
                for &p in successors {
                    edges.entry(p).or_default().push(tuple.clone());
                }
            }
            edges.into_iter().map(move |(p, tuples)| {
                format!(
                    "q{q} -> q{p} [{}]",
                    DotTransitionAttribute::Label(tuples.join(", "))
                )
            })
        });
        header
            .into_iter()
            .chain(states)
            .chain(std::iter::once(format!("init -> q{}", aut.initial_state())))
            .chain(transitions)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }

    /// Runs `dot -Tpng` on the graphviz representation and returns the PNG bytes. Only available
    /// with the `graphviz` feature, the `dot` executable has to be on the path.
    #[cfg(feature = "graphviz")]
    pub fn render(&self) -> Result<Vec<u8>> {
        use std::{
            io::Write,
            process::{Command, Stdio},
        };

        let dot = self.dot_representation();
        tracing::trace!("rendering {} states to png", self.state_count());
        let mut child = Command::new("dot")
            .arg("-Tpng")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        // stdin is closed when it goes out of scope, which lets dot finish
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(dot.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        dot_succeeded(output.status, "rendering to png")?;
        Ok(output.stdout)
    }

    /// Writes the graphviz representation to a temporary file and lets `dot` turn it into the
    /// PNG file `filename`. Only available with the `graphviz` feature.
    #[cfg(feature = "graphviz")]
    pub fn render_to_file_name(&self, filename: &str) -> Result<()> {
        use std::io::Write;

        tracing::trace!("rendering {} states to {filename}", self.state_count());
        let mut source = tempfile::NamedTempFile::new()?;
        source.write_all(self.dot_representation().as_bytes())?;
        let status = std::process::Command::new("dot")
            .args(["-Tpng", "-o", filename])
            .arg(source.path())
            .status()?;
        dot_succeeded(status, &format!("rendering to {filename}"))
    }
}

#[cfg(feature = "graphviz")]
fn dot_succeeded(status: std::process::ExitStatus, task: &str) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("{task} failed, dot exited with {status}"),
    )
    .into())
}
