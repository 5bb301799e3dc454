//! Discrete factors over named variables.
//!
//! Values are stored row-major: the last variable varies fastest.

use crate::common::error::{RiskError, RiskResult};

#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    vars: Vec<String>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

fn strides(cards: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; cards.len()];
    for i in (0..cards.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * cards[i + 1];
    }
    strides
}

impl Factor {
    pub fn new(vars: Vec<String>, cards: Vec<usize>, values: Vec<f64>) -> RiskResult<Self> {
        if vars.len() != cards.len() {
            return Err(RiskError::internal("factor scope and cardinalities differ in length"));
        }
        if cards.iter().any(|c| *c == 0) {
            return Err(RiskError::invalid("factor variable with zero states"));
        }
        let size: usize = cards.iter().product();
        if values.len() != size {
            return Err(RiskError::internal(format!(
                "factor expects {size} values, got {}",
                values.len()
            )));
        }
        Ok(Self { vars, cards, values })
    }

    /// Factor with an empty scope holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            vars: Vec::new(),
            cards: Vec::new(),
            values: vec![value],
        }
    }

    pub fn variables(&self) -> &[String] {
        &self.vars
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cards
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn contains(&self, var: &str) -> bool {
        self.position(var).is_some()
    }

    fn position(&self, var: &str) -> Option<usize> {
        self.vars.iter().position(|v| v == var)
    }

    /// Flat index of a full assignment given in scope order.
    pub fn index_of(&self, assignment: &[usize]) -> usize {
        assignment
            .iter()
            .zip(strides(&self.cards))
            .map(|(state, stride)| state * stride)
            .sum()
    }

    /// Full assignment (scope order) for a flat index.
    pub fn assignment_of(&self, mut index: usize) -> Vec<usize> {
        let mut out = vec![0; self.cards.len()];
        for (slot, card) in out.iter_mut().zip(&self.cards).rev() {
            *slot = index % card;
            index /= card;
        }
        out
    }

    /// Value for an assignment given in scope order.
    pub fn value(&self, assignment: &[usize]) -> f64 {
        self.values[self.index_of(assignment)]
    }

    /// Fix `var` to `state` and drop it from the scope.
    pub fn reduce(&self, var: &str, state: usize) -> RiskResult<Factor> {
        let pos = self
            .position(var)
            .ok_or_else(|| RiskError::internal(format!("{var} not in factor scope")))?;
        if state >= self.cards[pos] {
            return Err(RiskError::invalid(format!("state {state} out of range for {var}")));
        }
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);
        let size: usize = cards.iter().product();
        let mut reduced = Factor {
            vars,
            cards,
            values: Vec::with_capacity(size),
        };
        let values: Vec<f64> = (0..size)
            .map(|idx| {
                let mut assignment = reduced.assignment_of(idx);
                assignment.insert(pos, state);
                self.value(&assignment)
            })
            .collect();
        reduced.values = values;
        Ok(reduced)
    }

    /// Sum `var` out of the factor.
    pub fn marginalize(&self, var: &str) -> RiskResult<Factor> {
        let pos = self
            .position(var)
            .ok_or_else(|| RiskError::internal(format!("{var} not in factor scope")))?;
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);
        let size: usize = cards.iter().product();
        let mut out = Factor {
            vars,
            cards,
            values: vec![0.0; size],
        };
        for (idx, value) in self.values.iter().enumerate() {
            let mut assignment = self.assignment_of(idx);
            assignment.remove(pos);
            let target = out.index_of(&assignment);
            out.values[target] += value;
        }
        Ok(out)
    }

    /// Pointwise product. The scope is `self`'s variables followed by the new ones from `other`.
    pub fn product(&self, other: &Factor) -> RiskResult<Factor> {
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        for (var, card) in other.vars.iter().zip(&other.cards) {
            match self.position(var) {
                Some(pos) if self.cards[pos] != *card => {
                    return Err(RiskError::internal(format!("cardinality mismatch on {var}")));
                }
                Some(_) => {}
                None => {
                    vars.push(var.clone());
                    cards.push(*card);
                }
            }
        }
        let other_map: Vec<usize> = other
            .vars
            .iter()
            .filter_map(|v| vars.iter().position(|o| o == v))
            .collect();
        let size: usize = cards.iter().product();
        let mut out = Factor {
            vars,
            cards,
            values: vec![0.0; size],
        };
        let self_len = self.vars.len();
        for idx in 0..size {
            let assignment = out.assignment_of(idx);
            let left = self.value(&assignment[..self_len]);
            let right_assignment: Vec<usize> = other_map.iter().map(|p| assignment[*p]).collect();
            out.values[idx] = left * other.value(&right_assignment);
        }
        Ok(out)
    }

    /// Permute the scope into `order`, which must name exactly the scope's variables.
    pub fn reorder(&self, order: &[&str]) -> RiskResult<Factor> {
        if order.len() != self.vars.len() {
            return Err(RiskError::internal("reorder scope size mismatch"));
        }
        let mapping = order
            .iter()
            .map(|v| {
                self.position(v)
                    .ok_or_else(|| RiskError::internal(format!("{v} not in factor scope")))
            })
            .collect::<RiskResult<Vec<_>>>()?;
        let vars = order.iter().map(|v| v.to_string()).collect();
        let cards = mapping.iter().map(|p| self.cards[*p]).collect();
        let mut out = Factor::new(vars, cards, vec![0.0; self.values.len()])?;
        for idx in 0..out.values.len() {
            let assignment = out.assignment_of(idx);
            let mut original = vec![0; assignment.len()];
            for (new_pos, old_pos) in mapping.iter().enumerate() {
                original[*old_pos] = assignment[new_pos];
            }
            out.values[idx] = self.value(&original);
        }
        Ok(out)
    }

    /// Scale values to sum to one. Fails when the total mass is zero.
    pub fn normalize(&mut self) -> RiskResult<()> {
        let total: f64 = self.values.iter().sum();
        if !(total > 0.0) || !total.is_finite() {
            return Err(RiskError::invalid("evidence has zero probability under the model"));
        }
        for v in &mut self.values {
            *v /= total;
        }
        Ok(())
    }

    /// Assignment with the highest value. Ties go to the lowest flat index.
    pub fn argmax(&self) -> Vec<usize> {
        let mut best = 0;
        for (idx, value) in self.values.iter().enumerate() {
            if *value > self.values[best] {
                best = idx;
            }
        }
        self.assignment_of(best)
    }
}
