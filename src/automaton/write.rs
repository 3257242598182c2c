use std::{fmt::Display, path::Path};

use itertools::Itertools;

use crate::prelude::*;

fn alphabet_declaration(coordinates: &Coordinates) -> String {
    coordinates
        .alphabets()
        .iter()
        .zip(coordinates.number_systems())
        .map(|(alphabet, ns)| match ns {
            Some(ns) if ns.default_alphabet() == *alphabet => ns.to_string(),
            Some(ns) => format!("{ns}{{{}}}", alphabet.values().join(", ")),
            None => format!("{{{}}}", alphabet.values().join(", ")),
        })
        .join(" ")
}

impl Display for Automaton {
    /// Writes the automaton in the textual format that is understood by [`std::str::FromStr`],
    /// the states are numbered canonically first.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(value) = self.is_trivial() {
            return write!(f, "{value}");
        }
        let aut = self.canonize();
        let coordinates = aut.coordinates();
        writeln!(f, "{}", alphabet_declaration(coordinates))?;
        for q in 0..aut.state_count() {
            writeln!(f)?;
            writeln!(f, "{q} {}", aut.output(q))?;
            for (&a, successors) in &aut.transitions()[q] {
                let input = coordinates.decode(a).iter().map(|v| format!("{v} ")).join("");
                writeln!(f, "{input}-> {}", successors.iter().join(" "))?;
            }
        }
        Ok(())
    }
}

impl Automaton {
    /// Writes the textual format to the file at `path`.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn written_form() {
        let aut: Automaton = "lsd_3 {-1, 1}\n1 0\n0 -1 -> 0\n0 5\n* 1 -> 0 1\n"
            .parse()
            .unwrap();
        let written = aut.to_string();
        assert_eq!(
            written,
            "lsd_3 {-1, 1}\n\n0 0\n0 -1 -> 1\n\n1 5\n0 1 -> 0 1\n1 1 -> 0 1\n2 1 -> 0 1\n"
        );
        let reparsed: Automaton = written.parse().unwrap();
        assert_eq!(reparsed, aut.canonize());
        assert_eq!(Automaton::trivial(false).to_string(), "false");
    }

    #[test_log::test]
    fn number_systems_keep_their_digits() {
        let coordinates = Coordinates::new(
            vec![Alphabet::new([-1, 0, 1]).unwrap(), Alphabet::range(2)],
            vec![Some(NumberSystem::new("msd_bal3")), Some(NumberSystem::msd(2))],
        )
        .unwrap();
        let aut = Automaton::universal(coordinates);
        let written = aut.to_string();
        assert!(written.starts_with("msd_bal3{-1, 0, 1} msd_2\n"));
        let reparsed: Automaton = written.parse().unwrap();
        assert_eq!(reparsed.coordinates(), aut.coordinates());
        assert_eq!(reparsed, aut.canonize());
    }
}
