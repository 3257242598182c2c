use std::time::Instant;

use tracing::debug;

use crate::prelude::*;

impl Automaton {
    /// Builds the product under a logical connective or comparison and minimizes it. A trivial
    /// operand is resolved without building any product.
    fn connective(&self, other: &Automaton, op: Operator) -> Result<Automaton> {
        match (self.is_trivial(), other.is_trivial()) {
            (Some(a), Some(b)) => {
                return Ok(Automaton::trivial(
                    op.apply(Output::from(a), Output::from(b))? != 0,
                ))
            }
            (Some(a), None) => return other.resolve_constant(|x| op.apply(Output::from(a), x)),
            (None, Some(b)) => return self.resolve_constant(|x| op.apply(x, Output::from(b))),
            (None, None) => {}
        }
        let start = Instant::now();
        debug!(
            "computing {op}: {} states - {} states",
            self.state_count(),
            other.state_count()
        );
        let out = if op.requires_total() {
            self.totalize().product(&other.totalize(), op)?
        } else {
            self.product(other, op)?
        }
        .minimize();
        debug!(
            "computed {op}: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }

    /// If the other operand is trivial, the connective only depends on whether `self` accepts,
    /// so evaluating it on both possibilities tells what the result is.
    fn resolve_constant<F: Fn(Output) -> Result<Output>>(&self, op: F) -> Result<Automaton> {
        Ok(match (op(0)? != 0, op(1)? != 0) {
            (false, false) => Automaton::trivial(false),
            (true, true) => Automaton::trivial(true),
            (false, true) => self.clone(),
            (true, false) => self.not(),
        })
    }

    /// Returns the intersection of the languages, coordinates are aligned by their labels.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let ones: Automaton = "{0,1}\n0 1\n1 -> 0\n".parse().unwrap();
    /// let x = ones.bind(&["x"]).unwrap();
    /// let y = ones.bind(&["y"]).unwrap();
    /// let both = x.and(&y).unwrap();
    /// assert!(both.accepts(&[vec![1, 1]]).unwrap());
    /// assert!(!both.accepts(&[vec![1, 0]]).unwrap());
    /// ```
    pub fn and(&self, other: &Automaton) -> Result<Automaton> {
        self.connective(other, Operator::And)
    }

    /// Returns the union of the languages.
    pub fn or(&self, other: &Automaton) -> Result<Automaton> {
        self.connective(other, Operator::Or)
    }

    /// Returns the symmetric difference of the languages.
    pub fn xor(&self, other: &Automaton) -> Result<Automaton> {
        self.connective(other, Operator::Xor)
    }

    /// Accepts every word that is rejected by `self` or accepted by `other`.
    pub fn implies(&self, other: &Automaton) -> Result<Automaton> {
        self.connective(other, Operator::Implies)
    }

    /// Accepts every word on which `self` and `other` agree.
    pub fn iff(&self, other: &Automaton) -> Result<Automaton> {
        self.connective(other, Operator::Iff)
    }

    /// Returns the complement. The automaton is totalized, acceptance is flipped and the result
    /// is minimized.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Automaton {
        if let Some(value) = self.is_trivial() {
            return Automaton::trivial(!value);
        }
        let start = Instant::now();
        let total = self.totalize();
        let outputs = total
            .outputs()
            .iter()
            .map(|&o| Output::from(o == 0))
            .collect();
        let out = total.with_outputs(outputs).minimize();
        debug!(
            "computed ~: {} states to {} states - {}ms",
            self.state_count(),
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }

    /// Compares the outputs of two automata with output. The result accepts a word iff
    /// `op` holds between the outputs that `self` and `other` assign to it.
    pub fn compare(&self, other: &Automaton, op: Operator) -> Result<Automaton> {
        debug_assert!(op.is_comparison(), "{op} is not a comparison");
        self.connective(other, op)
    }

    /// Combines two automata with output by applying an arithmetic operator to their outputs.
    /// The result is minimized as an automaton with output.
    ///
    /// Fails with [`AutomatonError::DivisionByZero`] if `op` is a division and some reachable
    /// combination has a zero divisor.
    pub fn apply_operator(&self, other: &Automaton, op: Operator) -> Result<Automaton> {
        let start = Instant::now();
        debug!(
            "applying operator ({op}): {} states - {} states",
            self.state_count(),
            other.state_count()
        );
        let out = self
            .totalize()
            .product(&other.totalize(), op)?
            .minimize_with_output();
        debug!(
            "applied operator ({op}): {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }

    /// Rewrites every output `o` to `1` if `o op value` holds and to `0` otherwise, then
    /// minimizes.
    pub fn compare_constant(&self, op: Operator, value: Output) -> Result<Automaton> {
        if let Some(trivial) = self.is_trivial() {
            return Ok(Automaton::trivial(
                op.apply(Output::from(trivial), value)? != 0,
            ));
        }
        let outputs = self
            .outputs()
            .iter()
            .map(|&o| Ok(Output::from(op.apply(o, value)? != 0)))
            .collect::<Result<Vec<_>>>()?;
        debug!("comparing ({op}) against {value}: {} states", self.state_count());
        Ok(self.with_outputs(outputs).minimize())
    }

    /// Rewrites every output `o` to `o op value` and minimizes the result as an automaton with
    /// output. Division rounds towards negative infinity.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let aut: Automaton = "{0,1}\n0 3\n1 -> 1\n1 -7\n* -> 1\n".parse().unwrap();
    /// let halved = aut.apply_constant(Operator::Divide, 2).unwrap();
    /// assert_eq!(halved.output_on(&[]).unwrap(), 1);
    /// assert_eq!(halved.output_on(&[vec![1]]).unwrap(), -4);
    /// ```
    pub fn apply_constant(&self, op: Operator, value: Output) -> Result<Automaton> {
        self.map_outputs(op, |o| op.apply(o, value))
    }

    /// Rewrites every output `o` to `value op o`, see [`Self::apply_constant`].
    pub fn apply_constant_left(&self, value: Output, op: Operator) -> Result<Automaton> {
        self.map_outputs(op, |o| op.apply(value, o))
    }

    /// Negates every output.
    pub fn negate_output(&self) -> Automaton {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let outputs = self.outputs().iter().map(|&o| o.wrapping_neg()).collect();
        self.with_outputs(outputs).minimize_with_output()
    }

    fn map_outputs<F: Fn(Output) -> Result<Output>>(&self, op: Operator, f: F) -> Result<Automaton> {
        if self.is_trivial().is_some() {
            return Ok(self.clone());
        }
        let start = Instant::now();
        let outputs = self
            .outputs()
            .iter()
            .map(|&o| f(o))
            .collect::<Result<Vec<_>>>()?;
        let out = self.with_outputs(outputs).minimize_with_output();
        debug!(
            "applied operator ({op}): {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }
}
