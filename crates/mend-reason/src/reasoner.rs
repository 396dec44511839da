//! # Reasoner Capability and Structural Reasoner
//!
//! Defines the [`Reasoner`] trait, the narrow seam through which an
//! external reasoning engine answers "is this axiom set consistent, and if
//! not, which axioms conflict", and ships [`StructuralReasoner`], a
//! deterministic implementation covering the structural contradiction
//! patterns the repair engine is exercised against.
//!
//! `StructuralReasoner` is not a full Description Logic reasoner (that is
//! an explicit non-goal); it detects:
//!
//! - a class sitting below both sides of a disjointness through the
//!   subclass closure;
//! - an existential and a universal restriction on the same property of
//!   one class whose fillers are separated by disjointness;
//! - `≤n` versus `≥m` cardinality bound clashes (`m > n`);
//! - more pairwise-disjoint existential fillers on a property than its
//!   `≤n` bound admits.
//!
//! Conflict sets are minimal per detection rule, and detection order is
//! deterministic for a given input order.

use crate::error::Result;
use mend_store::{Axiom, AxiomForm};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Answer from a reasoning capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerVerdict {
    /// Whether the axiom set is free of logical contradiction.
    pub consistent: bool,
    /// Axioms jointly responsible for a contradiction, when the reasoner
    /// can name them. `None` means "inconsistent, but no explanation";
    /// the checker then falls back to a conservative justification.
    pub conflict: Option<Vec<Axiom>>,
}

impl ReasonerVerdict {
    /// A consistent verdict.
    pub fn consistent() -> Self {
        ReasonerVerdict {
            consistent: true,
            conflict: None,
        }
    }

    /// An inconsistent verdict with a named conflict set.
    pub fn inconsistent(conflict: Vec<Axiom>) -> Self {
        ReasonerVerdict {
            consistent: false,
            conflict: Some(conflict),
        }
    }
}

/// The external reasoning capability consumed by the consistency checker.
///
/// Implementations must be side-effect free with respect to the axiom set:
/// the checker hands them a materialized working-copy view and discards it
/// afterwards regardless of the outcome.
pub trait Reasoner: Send + Sync {
    /// Returns the name of this reasoner, for logs and audit records.
    fn name(&self) -> &str;

    /// Checks an axiom set for logical consistency.
    ///
    /// # Errors
    ///
    /// [`crate::ReasonError::Timeout`] when the time budget is exhausted;
    /// [`crate::ReasonError::Unavailable`] when the engine cannot answer.
    fn check(&self, axioms: &[Axiom]) -> Result<ReasonerVerdict>;
}

/// Subclass closure over a set of axioms, with conflict bookkeeping.
struct ClassGraph<'a> {
    /// `sub -> [(sup, asserting axiom)]`, adjacency sorted for determinism.
    parents: HashMap<&'a str, Vec<(&'a str, &'a Axiom)>>,
    /// All disjointness assertions in input order.
    disjoints: Vec<(&'a str, &'a str, &'a Axiom)>,
    /// Every class mentioned anywhere, sorted.
    classes: BTreeSet<&'a str>,
}

impl<'a> ClassGraph<'a> {
    fn build(axioms: &'a [Axiom]) -> Self {
        let mut parents: HashMap<&str, Vec<(&str, &Axiom)>> = HashMap::new();
        let mut disjoints = Vec::new();
        let mut classes = BTreeSet::new();

        for axiom in axioms {
            for class in axiom.form.classes() {
                classes.insert(class);
            }
            match &axiom.form {
                AxiomForm::SubClassOf { sub, sup } => {
                    parents.entry(sub).or_default().push((sup, axiom));
                }
                AxiomForm::DisjointWith { left, right } => {
                    disjoints.push((left.as_str(), right.as_str(), axiom));
                }
                _ => {}
            }
        }
        for adjacency in parents.values_mut() {
            adjacency.sort_by_key(|(sup, _)| *sup);
        }

        ClassGraph {
            parents,
            disjoints,
            classes,
        }
    }

    /// Ancestors of `class` (including itself), each with the chain of
    /// subclass axioms that proves the subsumption.
    fn ancestors(&self, class: &'a str) -> HashMap<&'a str, Vec<&'a Axiom>> {
        let mut chains: HashMap<&str, Vec<&Axiom>> = HashMap::new();
        chains.insert(class, Vec::new());
        let mut queue = VecDeque::from([class]);

        while let Some(current) = queue.pop_front() {
            let chain = chains[current].clone();
            if let Some(sups) = self.parents.get(current) {
                for (sup, axiom) in sups {
                    if !chains.contains_key(sup) {
                        let mut extended = chain.clone();
                        extended.push(axiom);
                        chains.insert(sup, extended);
                        queue.push_back(sup);
                    }
                }
            }
        }
        chains
    }

    /// Is `class` subsumed by `sup` through the closure?
    fn subsumed_by(&self, class: &'a str, sup: &str) -> bool {
        self.ancestors(class).contains_key(sup)
    }

    /// Finds a disjointness axiom separating `a` from `b` through their
    /// ancestors, if one exists.
    fn separation(&self, a: &'a str, b: &'a str) -> Option<&'a Axiom> {
        let anc_a = self.ancestors(a);
        let anc_b = self.ancestors(b);
        self.disjoints
            .iter()
            .find(|(left, right, _)| {
                (anc_a.contains_key(left) && anc_b.contains_key(right))
                    || (anc_a.contains_key(right) && anc_b.contains_key(left))
            })
            .map(|(_, _, axiom)| *axiom)
    }
}

/// Deterministic structural reasoner shipped with OntoMend.
///
/// # Example
///
/// ```rust
/// use mend_reason::{Reasoner, StructuralReasoner};
/// use mend_store::{parse_axiom, Axiom};
///
/// let reasoner = StructuralReasoner::new();
/// let axioms: Vec<Axiom> = [
///     "Virus ⊓ Bacterium ⊑ ⊥",
///     "NovelVirusX ⊑ Virus",
///     "NovelVirusX ⊑ Bacterium",
/// ]
/// .iter()
/// .map(|s| Axiom::existing(parse_axiom(s).unwrap()))
/// .collect();
///
/// let verdict = reasoner.check(&axioms).unwrap();
/// assert!(!verdict.consistent);
/// assert_eq!(verdict.conflict.unwrap().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct StructuralReasoner;

impl StructuralReasoner {
    /// Creates a structural reasoner.
    pub fn new() -> Self {
        StructuralReasoner
    }

    /// A class below both sides of a disjointness is unsatisfiable; the
    /// knowledge base asserts it as a concept, so we flag the set.
    fn check_disjoint_subsumption(&self, graph: &ClassGraph<'_>) -> Option<Vec<Axiom>> {
        for &class in &graph.classes {
            let ancestors = graph.ancestors(class);
            for (left, right, disjoint_axiom) in &graph.disjoints {
                let (Some(chain_left), Some(chain_right)) =
                    (ancestors.get(left), ancestors.get(right))
                else {
                    continue;
                };
                let mut conflict: Vec<Axiom> = chain_left
                    .iter()
                    .chain(chain_right.iter())
                    .map(|a| (*a).clone())
                    .collect();
                conflict.push((*disjoint_axiom).clone());
                conflict.sort();
                conflict.dedup();
                return Some(conflict);
            }
        }
        None
    }

    /// `A ⊑ ∃p.F` clashes with an inherited `∀p.G` when `F` is not below
    /// `G` and the two fillers are separated by disjointness.
    fn check_restriction_clash<'a>(
        &self,
        axioms: &'a [Axiom],
        graph: &ClassGraph<'a>,
    ) -> Option<Vec<Axiom>> {
        for existential in axioms {
            let AxiomForm::SomeValuesFrom {
                sub,
                property,
                filler,
            } = &existential.form
            else {
                continue;
            };
            for universal in axioms {
                let AxiomForm::AllValuesFrom {
                    sub: u_sub,
                    property: u_property,
                    filler: u_filler,
                } = &universal.form
                else {
                    continue;
                };
                if property != u_property || !graph.subsumed_by(sub, u_sub) {
                    continue;
                }
                if graph.subsumed_by(filler, u_filler) {
                    continue; // the existential filler satisfies the universal
                }
                if graph.separation(filler, u_filler).is_some() {
                    return Some(vec![existential.clone(), universal.clone()]);
                }
            }
        }
        None
    }

    /// `≤n p` against an inherited `≥m p` with `m > n`.
    fn check_cardinality_bounds<'a>(
        &self,
        axioms: &'a [Axiom],
        graph: &ClassGraph<'a>,
    ) -> Option<Vec<Axiom>> {
        for max in axioms {
            let AxiomForm::MaxCardinality { sub, property, n } = &max.form else {
                continue;
            };
            for min in axioms {
                let AxiomForm::MinCardinality {
                    sub: m_sub,
                    property: m_property,
                    n: m,
                } = &min.form
                else {
                    continue;
                };
                let related =
                    graph.subsumed_by(sub, m_sub) || graph.subsumed_by(m_sub, sub);
                if property == m_property && related && m > n {
                    return Some(vec![max.clone(), min.clone()]);
                }
            }
        }
        None
    }

    /// `≤n p` against more than `n` pairwise-disjoint existential fillers.
    fn check_cardinality_fanout<'a>(
        &self,
        axioms: &'a [Axiom],
        graph: &ClassGraph<'a>,
    ) -> Option<Vec<Axiom>> {
        for max in axioms {
            let AxiomForm::MaxCardinality { sub, property, n } = &max.form else {
                continue;
            };
            // Existentials that apply to `sub` through the closure.
            let applicable: Vec<(&str, &Axiom)> = axioms
                .iter()
                .filter_map(|a| match &a.form {
                    AxiomForm::SomeValuesFrom {
                        sub: e_sub,
                        property: e_property,
                        filler,
                    } if e_property == property && graph.subsumed_by(sub, e_sub) => {
                        Some((filler.as_str(), a))
                    }
                    _ => None,
                })
                .collect();

            // Greedy pairwise-disjoint subset, in input order.
            let mut kept: Vec<(&str, &Axiom)> = Vec::new();
            for (filler, axiom) in applicable {
                if kept
                    .iter()
                    .all(|&(other, _)| graph.separation(filler, other).is_some())
                {
                    kept.push((filler, axiom));
                }
            }

            if kept.len() as u32 > *n {
                let mut conflict = vec![max.clone()];
                conflict.extend(kept.into_iter().map(|(_, a)| a.clone()));
                return Some(conflict);
            }
        }
        None
    }
}

impl Reasoner for StructuralReasoner {
    fn name(&self) -> &str {
        "structural"
    }

    fn check(&self, axioms: &[Axiom]) -> Result<ReasonerVerdict> {
        let graph = ClassGraph::build(axioms);

        let conflict = self
            .check_disjoint_subsumption(&graph)
            .or_else(|| self.check_restriction_clash(axioms, &graph))
            .or_else(|| self.check_cardinality_bounds(axioms, &graph))
            .or_else(|| self.check_cardinality_fanout(axioms, &graph));

        Ok(match conflict {
            Some(conflict) => ReasonerVerdict::inconsistent(conflict),
            None => ReasonerVerdict::consistent(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_store::parse_axiom;

    fn axioms(sentences: &[&str]) -> Vec<Axiom> {
        sentences
            .iter()
            .map(|s| Axiom::existing(parse_axiom(s).unwrap()))
            .collect()
    }

    #[test]
    fn test_empty_set_is_consistent() {
        let verdict = StructuralReasoner::new().check(&[]).unwrap();
        assert!(verdict.consistent);
    }

    #[test]
    fn test_plain_hierarchy_is_consistent() {
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Virus ⊑ Pathogen",
                "Bacterium ⊑ Pathogen",
                "Pneumonia ⊑ ∃causedBy.Bacterium",
            ]))
            .unwrap();
        assert!(verdict.consistent);
    }

    #[test]
    fn test_class_below_disjoint_pair() {
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Virus ⊓ Bacterium ⊑ ⊥",
                "NovelVirusX ⊑ Virus",
                "NovelVirusX ⊑ Bacterium",
            ]))
            .unwrap();
        assert!(!verdict.consistent);
        let conflict = verdict.conflict.unwrap();
        assert_eq!(conflict.len(), 3);
    }

    #[test]
    fn test_transitive_disjoint_violation() {
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "A ⊓ B ⊑ ⊥",
                "C ⊑ A",
                "D ⊑ C",
                "D ⊑ B",
            ]))
            .unwrap();
        assert!(!verdict.consistent);
    }

    #[test]
    fn test_existential_universal_clash() {
        // Scenario A shape: the ∃ filler is a virus, the ∀ filler a
        // bacterium, and the two kingdoms are disjoint.
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Virus ⊓ Bacterium ⊑ ⊥",
                "Virus ⊑ Pathogen",
                "NovelVirusX ⊑ Virus",
                "Pneumonia ⊑ ∀causedBy.Bacterium",
                "Pneumonia ⊑ ∃causedBy.NovelVirusX",
            ]))
            .unwrap();
        assert!(!verdict.consistent);

        let conflict = verdict.conflict.unwrap();
        assert_eq!(conflict.len(), 2);
        assert!(conflict
            .iter()
            .any(|a| a.form == AxiomForm::all_values("Pneumonia", "causedBy", "Bacterium")));
        assert!(conflict
            .iter()
            .any(|a| a.form == AxiomForm::some_values("Pneumonia", "causedBy", "NovelVirusX")));
    }

    #[test]
    fn test_satisfied_universal_is_consistent() {
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Bacterium ⊑ Pathogen",
                "Pneumonia ⊑ ∀causedBy.Pathogen",
                "Pneumonia ⊑ ∃causedBy.Bacterium",
            ]))
            .unwrap();
        assert!(verdict.consistent);
    }

    #[test]
    fn test_unrelated_fillers_without_disjointness_pass() {
        // F ⋢ G but no disjointness separates them; structurally open.
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Pneumonia ⊑ ∀causedBy.Bacterium",
                "Pneumonia ⊑ ∃causedBy.Agent",
            ]))
            .unwrap();
        assert!(verdict.consistent);
    }

    #[test]
    fn test_cardinality_bound_clash() {
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Pneumonia ⊑ ≤1 causedBy",
                "Pneumonia ⊑ ≥2 causedBy",
            ]))
            .unwrap();
        assert!(!verdict.consistent);
        assert_eq!(verdict.conflict.unwrap().len(), 2);
    }

    #[test]
    fn test_cardinality_fanout_clash() {
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Virus ⊓ Bacterium ⊑ ⊥",
                "Pneumonia ⊑ ≤1 causedBy",
                "Pneumonia ⊑ ∃causedBy.Virus",
                "Pneumonia ⊑ ∃causedBy.Bacterium",
            ]))
            .unwrap();
        assert!(!verdict.consistent);
        let conflict = verdict.conflict.unwrap();
        assert_eq!(conflict.len(), 3);
    }

    #[test]
    fn test_fanout_without_disjointness_passes() {
        // Two existentials can point at the same individual.
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Pneumonia ⊑ ≤1 causedBy",
                "Pneumonia ⊑ ∃causedBy.Virus",
                "Pneumonia ⊑ ∃causedBy.Pathogen",
            ]))
            .unwrap();
        assert!(verdict.consistent);
    }

    #[test]
    fn test_inherited_universal_clash() {
        // The universal is asserted on the superclass.
        let verdict = StructuralReasoner::new()
            .check(&axioms(&[
                "Virus ⊓ Bacterium ⊑ ⊥",
                "BacterialPneumonia ⊑ Pneumonia",
                "Pneumonia ⊑ ∀causedBy.Bacterium",
                "BacterialPneumonia ⊑ ∃causedBy.Virus",
            ]))
            .unwrap();
        assert!(!verdict.consistent);
    }

    #[test]
    fn test_determinism() {
        let set = axioms(&[
            "Virus ⊓ Bacterium ⊑ ⊥",
            "NovelVirusX ⊑ Virus",
            "Pneumonia ⊑ ∀causedBy.Bacterium",
            "Pneumonia ⊑ ∃causedBy.NovelVirusX",
        ]);
        let reasoner = StructuralReasoner::new();
        let first = reasoner.check(&set).unwrap();
        let second = reasoner.check(&set).unwrap();
        assert_eq!(first.conflict, second.conflict);
    }
}
