//! Discrete Bayesian network: fitting and exact inference by variable elimination.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::cpd::{Estimator, TabularCpd, Variable};
use super::dag::Dag;
use super::factor::Factor;
use crate::common::error::{RiskError, RiskResult};

/// Observed states keyed by variable name.
pub type Assignment = BTreeMap<String, usize>;

/// Fitted network. `variables` and `cpds` are aligned with the DAG's node order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr", into = "NetworkRepr")]
pub struct BayesianNetwork {
    dag: Dag,
    variables: Vec<Variable>,
    cpds: Vec<TabularCpd>,
}

#[derive(Serialize, Deserialize)]
struct NetworkRepr {
    dag: Dag,
    variables: Vec<Variable>,
    cpds: Vec<TabularCpd>,
}

impl TryFrom<NetworkRepr> for BayesianNetwork {
    type Error = RiskError;

    fn try_from(repr: NetworkRepr) -> RiskResult<Self> {
        BayesianNetwork::from_parts(repr.dag, repr.variables, repr.cpds)
    }
}

impl From<BayesianNetwork> for NetworkRepr {
    fn from(net: BayesianNetwork) -> Self {
        Self {
            dag: net.dag,
            variables: net.variables,
            cpds: net.cpds,
        }
    }
}

impl BayesianNetwork {
    /// Assemble a network from already-estimated parts, checking consistency.
    pub fn from_parts(dag: Dag, variables: Vec<Variable>, cpds: Vec<TabularCpd>) -> RiskResult<Self> {
        if variables.len() != dag.nodes().len() || cpds.len() != dag.nodes().len() {
            return Err(RiskError::invalid("network parts do not cover the same nodes"));
        }
        for ((node, variable), cpd) in dag.nodes().iter().zip(&variables).zip(&cpds) {
            if variable.name != *node || cpd.variable() != node {
                return Err(RiskError::invalid(format!("network part out of order at {node}")));
            }
            if variable.cardinality() == 0 || cpd.cardinality() != variable.cardinality() {
                return Err(RiskError::invalid(format!("cardinality mismatch for {node}")));
            }
            if cpd.parents() != dag.parents(node).as_slice() {
                return Err(RiskError::invalid(format!("cpd parents differ from graph for {node}")));
            }
            cpd.validate()?;
        }
        Ok(Self { dag, variables, cpds })
    }

    /// Fit one CPD per DAG node from encoded rows.
    ///
    /// `columns` describes the row layout: `rows[i][j]` is the state of
    /// `columns[j]`. Columns that are not DAG nodes are ignored.
    pub fn fit<R: AsRef<[usize]>>(
        dag: Dag,
        columns: &[Variable],
        rows: &[R],
        estimator: Estimator,
    ) -> RiskResult<Self> {
        if rows.is_empty() {
            return Err(RiskError::invalid("cannot fit parameters on an empty dataset"));
        }
        let column_of = |name: &str| -> RiskResult<usize> {
            columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| RiskError::invalid(format!("no data column for node {name}")))
        };

        let mut variables = Vec::with_capacity(dag.nodes().len());
        let mut cpds = Vec::with_capacity(dag.nodes().len());
        for node in dag.nodes() {
            let column = column_of(node)?;
            let parents = dag
                .parents(node)
                .into_iter()
                .map(|p| column_of(p).map(|idx| (&columns[idx], idx)))
                .collect::<RiskResult<Vec<_>>>()?;
            let variable = &columns[column];
            cpds.push(TabularCpd::estimate(variable, column, &parents, rows, estimator)?);
            variables.push(variable.clone());
        }
        Self::from_parts(dag, variables, cpds)
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn cpd(&self, name: &str) -> Option<&TabularCpd> {
        self.cpds.iter().find(|c| c.variable() == name)
    }

    /// Posterior joint distribution over `targets` given `evidence`, in `targets` order.
    pub fn query(&self, targets: &[&str], evidence: &Assignment) -> RiskResult<Factor> {
        self.check_query(targets, evidence)?;

        let mut factors = Vec::with_capacity(self.cpds.len());
        for cpd in &self.cpds {
            let mut factor = cpd.to_factor()?;
            for (var, state) in evidence {
                if factor.contains(var) {
                    factor = factor.reduce(var, *state)?;
                }
            }
            factors.push(factor);
        }

        let mut hidden: Vec<&str> = self
            .dag
            .nodes()
            .iter()
            .map(String::as_str)
            .filter(|n| !targets.contains(n) && !evidence.contains_key(*n))
            .collect();

        while !hidden.is_empty() {
            let (pick, var) = hidden
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| neighbour_count(&factors, v))
                .map(|(i, v)| (i, *v))
                .ok_or_else(|| RiskError::internal("elimination order exhausted"))?;
            hidden.remove(pick);
            factors = eliminate(factors, var)?;
        }

        let mut joint = factors
            .iter()
            .try_fold(Factor::scalar(1.0), |acc, f| acc.product(f))?;
        joint = joint.reorder(targets)?;
        joint.normalize()?;
        Ok(joint)
    }

    /// Most probable state code of `target` given `evidence`.
    pub fn map_state(&self, target: &str, evidence: &Assignment) -> RiskResult<usize> {
        let posterior = self.query(&[target], evidence)?;
        posterior
            .argmax()
            .first()
            .copied()
            .ok_or_else(|| RiskError::internal("empty posterior"))
    }

    fn check_query(&self, targets: &[&str], evidence: &Assignment) -> RiskResult<()> {
        if targets.is_empty() {
            return Err(RiskError::invalid("query needs at least one target variable"));
        }
        let mut seen = BTreeSet::new();
        for target in targets {
            if self.variable(target).is_none() {
                return Err(RiskError::invalid(format!("unknown variable {target}")));
            }
            if !seen.insert(*target) {
                return Err(RiskError::invalid(format!("duplicate target {target}")));
            }
            if evidence.contains_key(*target) {
                return Err(RiskError::invalid(format!("{target} is both target and evidence")));
            }
        }
        for (name, state) in evidence {
            let variable = self
                .variable(name)
                .ok_or_else(|| RiskError::invalid(format!("unknown evidence variable {name}")))?;
            if *state >= variable.cardinality() {
                return Err(RiskError::invalid(format!(
                    "evidence state {state} out of range for {name}"
                )));
            }
        }
        Ok(())
    }
}

fn neighbour_count(factors: &[Factor], var: &str) -> usize {
    factors
        .iter()
        .filter(|f| f.contains(var))
        .flat_map(|f| f.variables().iter())
        .filter(|v| *v != var)
        .collect::<BTreeSet<_>>()
        .len()
}

fn eliminate(factors: Vec<Factor>, var: &str) -> RiskResult<Vec<Factor>> {
    let (touching, mut rest): (Vec<Factor>, Vec<Factor>) =
        factors.into_iter().partition(|f| f.contains(var));
    if touching.is_empty() {
        return Ok(rest);
    }
    let product = touching
        .iter()
        .try_fold(Factor::scalar(1.0), |acc, f| acc.product(f))?;
    rest.push(product.marginalize(var)?);
    Ok(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yes_no(name: &str) -> Variable {
        Variable::new(name, ["Non", "Oui"])
    }

    /// A -> C <- B, with hand-set CPDs.
    fn collider() -> BayesianNetwork {
        let dag = Dag::from_edges([("A", "C"), ("B", "C")]).unwrap();
        let variables = vec![yes_no("A"), yes_no("C"), yes_no("B")];
        let cpds = vec![
            TabularCpd::new("A", 2, vec![], vec![], vec![vec![0.7, 0.3]]).unwrap(),
            TabularCpd::new(
                "C",
                2,
                vec!["A".into(), "B".into()],
                vec![2, 2],
                vec![vec![0.95, 0.05], vec![0.6, 0.4], vec![0.5, 0.5], vec![0.1, 0.9]],
            )
            .unwrap(),
            TabularCpd::new("B", 2, vec![], vec![], vec![vec![0.4, 0.6]]).unwrap(),
        ];
        BayesianNetwork::from_parts(dag, variables, cpds).unwrap()
    }

    fn brute_force(net: &BayesianNetwork, target: &str, evidence: &Assignment) -> Vec<f64> {
        let names: Vec<&str> = net.dag().nodes().iter().map(String::as_str).collect();
        let card = net.variable(target).unwrap().cardinality();
        let mut out = vec![0.0; card];
        for mask in 0..(1usize << names.len()) {
            let states: Assignment = names
                .iter()
                .enumerate()
                .map(|(i, n)| (n.to_string(), (mask >> i) & 1))
                .collect();
            if evidence.iter().any(|(k, v)| states[k] != *v) {
                continue;
            }
            let mut p = 1.0;
            for name in &names {
                let cpd = net.cpd(name).unwrap();
                let parents: Vec<usize> = cpd.parents().iter().map(|p| states[p]).collect();
                p *= cpd.row(&parents)[states[*name]];
            }
            out[states[target]] += p;
        }
        let total: f64 = out.iter().sum();
        out.iter().map(|v| v / total).collect()
    }

    #[test]
    fn full_evidence_returns_cpd_row() {
        let net = collider();
        let evidence: Assignment = [("A".to_string(), 1), ("B".to_string(), 0)].into();
        let posterior = net.query(&["C"], &evidence).unwrap();
        assert!((posterior.values()[0] - 0.5).abs() < 1e-12);
        assert!((posterior.values()[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn partial_evidence_matches_enumeration() {
        let net = collider();
        let evidence: Assignment = [("A".to_string(), 1)].into();
        let posterior = net.query(&["C"], &evidence).unwrap();
        let expected = brute_force(&net, "C", &evidence);
        for (got, want) in posterior.values().iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12);
        }

        // Explaining away: observing the child makes the parents dependent.
        let evidence: Assignment = [("C".to_string(), 1)].into();
        let posterior = net.query(&["A"], &evidence).unwrap();
        let expected = brute_force(&net, "A", &evidence);
        for (got, want) in posterior.values().iter().zip(&expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn joint_query_is_in_target_order() {
        let net = collider();
        let joint = net.query(&["B", "A"], &Assignment::new()).unwrap();
        assert_eq!(joint.variables(), ["B", "A"]);
        assert!((joint.value(&[1, 0]) - 0.6 * 0.7).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_queries() {
        let net = collider();
        let evidence: Assignment = [("A".to_string(), 1)].into();
        assert!(net.query(&["A"], &evidence).is_err());
        assert!(net.query(&["Z"], &Assignment::new()).is_err());
        let bad_state: Assignment = [("B".to_string(), 5)].into();
        assert!(net.query(&["C"], &bad_state).is_err());
        assert!(net.query(&[], &Assignment::new()).is_err());
    }

    #[test]
    fn fit_then_map_state() {
        let dag = Dag::from_edges([("X", "Y")]).unwrap();
        let columns = vec![yes_no("X"), yes_no("Y")];
        let rows = vec![vec![1, 1], vec![1, 1], vec![1, 0], vec![0, 0], vec![0, 0]];
        let net = BayesianNetwork::fit(dag, &columns, &rows, Estimator::MaximumLikelihood).unwrap();
        let yes: Assignment = [("X".to_string(), 1)].into();
        let no: Assignment = [("X".to_string(), 0)].into();
        assert_eq!(net.map_state("Y", &yes).unwrap(), 1);
        assert_eq!(net.map_state("Y", &no).unwrap(), 0);
        let prior = net.cpd("X").unwrap().row(&[]);
        assert!((prior[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let net = collider();
        let raw = serde_json::to_string(&net).unwrap();
        let back: BayesianNetwork = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, net);

        let tampered = raw.replace("0.95", "0.55");
        assert!(serde_json::from_str::<BayesianNetwork>(&tampered).is_err());
    }
}
