use crate::{automaton::TransitionMap, prelude::*};

fn random_coordinates(alphabet_size: usize, arity: usize) -> Coordinates {
    Coordinates::plain(vec![Alphabet::range(alphabet_size as u64); arity])
}

/// Generate a random deterministic automaton with `states` states over `arity` plain coordinates,
/// each of which has the alphabet `{0, ..., alphabet_size - 1}`. The algorithm is as follows:
/// 1. Start with `states` states and no transitions.
/// 2. For each state and each symbol, draw a target state and add the corresponding edge.
/// 3. Mark every state as accepting with probability one half.
///
/// Depending on the drawn transitions, there may be unreachable states.
pub fn generate_random_automaton(
    rng: &mut fastrand::Rng,
    alphabet_size: usize,
    arity: usize,
    states: usize,
) -> Automaton {
    generate_random_dfao(rng, alphabet_size, arity, states, 2)
}

/// Works as [`generate_random_automaton`], but the output of every state is drawn uniformly from
/// `0..outputs`.
pub fn generate_random_dfao(
    rng: &mut fastrand::Rng,
    alphabet_size: usize,
    arity: usize,
    states: usize,
    outputs: Output,
) -> Automaton {
    let coordinates = random_coordinates(alphabet_size, arity);
    let states = states.max(1);
    let transitions: Vec<TransitionMap> = (0..states)
        .map(|_| {
            coordinates
                .symbols()
                .map(|a| (a, vec![rng.usize(..states)]))
                .collect()
        })
        .collect();
    let outputs = (0..states).map(|_| rng.i64(0..outputs.max(1))).collect();
    Automaton::from_parts(coordinates, 0, outputs, transitions)
}

/// Generate a random word of input tuples for the given coordinates. The length of the word is
/// drawn uniformly from the range `min_len..=max_len`.
pub fn generate_random_word(
    rng: &mut fastrand::Rng,
    coordinates: &Coordinates,
    min_len: usize,
    max_len: usize,
) -> Vec<Vec<Value>> {
    let length = rng.usize(min_len..=max_len);
    (0..length)
        .map(|_| coordinates.decode(rng.usize(coordinates.symbols())))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test_log::test]
    fn random_automata() {
        let mut rng = fastrand::Rng::with_seed(5);
        let aut = random::generate_random_automaton(&mut rng, 3, 2, 10);
        assert_eq!(aut.state_count(), 10);
        assert_eq!(aut.alphabet_size(), 9);
        assert!(aut.is_deterministic());
        assert!(aut.is_total());
        assert!(!aut.has_output());

        let dfao = random::generate_random_dfao(&mut rng, 2, 1, 6, 4);
        assert!(dfao.outputs().iter().all(|o| (0..4).contains(o)));
    }

    #[test_log::test]
    fn reversal_on_random_words() {
        let mut rng = fastrand::Rng::with_seed(11);
        for _ in 0..5 {
            let aut = random::generate_random_automaton(&mut rng, 2, 1, 6);
            let reversed = aut.reverse(false);
            for _ in 0..20 {
                let mut word = random::generate_random_word(&mut rng, aut.coordinates(), 0, 8);
                let accepted = aut.accepts(&word).unwrap();
                word.reverse();
                assert_eq!(reversed.accepts(&word).unwrap(), accepted);
            }
        }
    }
}
