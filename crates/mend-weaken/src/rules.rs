//! # Weakening Transformation Rules
//!
//! A closed set of axiom transformations, one group per axiom shape. Each
//! rule turns an axiom into a logically less restrictive replacement (or,
//! for [`WeakeningRule::Retract`], into nothing) together with an
//! information-loss weight the search uses for ordering.
//!
//! Generalization rules step to STRICT ancestors of the original filler
//! or superclass. Re-asserting the exact class the conflicting evidence
//! just refuted is not a weakening, so the ladder starts one level up.
//! Universal restrictions have no filler-generalization rule at all: a
//! generalized universal still asserts the exclusive claim that caused
//! the clash, so universals weaken only by conversion to an existential
//! or by retraction.

use mend_store::{Axiom, AxiomForm};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Loss per generalization step up the class hierarchy.
const STEP_LOSS: f64 = 0.2;
/// Base loss for converting a universal into an existential.
const UNIVERSAL_TO_EXISTENTIAL_LOSS: f64 = 0.45;
/// Loss for narrowing one side of a disjointness to a proper subclass.
const DISJOINT_NARROW_LOSS: f64 = 0.5;
/// Loss for relaxing a cardinality bound by one.
const CARDINALITY_RELAX_LOSS: f64 = 0.15;
/// Loss for dropping a `≥1` bound entirely.
const DROP_MIN_ONE_LOSS: f64 = 0.6;
/// Loss for retracting an axiom outright.
const RETRACT_LOSS: f64 = 1.0;

/// The rule that produced a substitution. Declaration order is the
/// tie-break order of the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeakeningRule {
    /// `A ⊑ ∃p.F` to `A ⊑ ∃p.anc(F)`.
    ExistentialGeneralize,
    /// `A ⊑ ∀p.F` to `A ⊑ ∃p.anc(F)`.
    UniversalToExistential,
    /// `A ⊑ B` to `A ⊑ anc(B)`.
    SubClassGeneralize,
    /// `Disjoint(A, B)` to `Disjoint(A', B)` for a proper subclass `A'`.
    DisjointNarrow,
    /// `≤n` to `≤n+1`, `≥n` to `≥n−1`, or dropping a `≥1`.
    CardinalityRelax,
    /// Remove the axiom with no replacement. Always enumerated last.
    Retract,
}

impl WeakeningRule {
    /// Short name for rationales and logs.
    pub fn name(&self) -> &'static str {
        match self {
            WeakeningRule::ExistentialGeneralize => "existential-generalize",
            WeakeningRule::UniversalToExistential => "universal-to-existential",
            WeakeningRule::SubClassGeneralize => "subclass-generalize",
            WeakeningRule::DisjointNarrow => "disjoint-narrow",
            WeakeningRule::CardinalityRelax => "cardinality-relax",
            WeakeningRule::Retract => "retract",
        }
    }
}

/// One way of weakening one axiom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    /// The rule applied.
    pub rule: WeakeningRule,
    /// The replacement axiom, or `None` when the axiom is dropped.
    pub replacement: Option<AxiomForm>,
    /// Information lost by this substitution.
    pub loss: f64,
}

/// Class hierarchy extracted from an axiom view, used by the
/// generalization and narrowing rules.
#[derive(Debug)]
pub struct Hierarchy {
    parents: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<String>>,
}

impl Hierarchy {
    /// Builds the hierarchy from the subclass assertions in `axioms`.
    pub fn from_axioms(axioms: &[Axiom]) -> Self {
        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for axiom in axioms {
            if let AxiomForm::SubClassOf { sub, sup } = &axiom.form {
                parents.entry(sub.clone()).or_default().push(sup.clone());
                children.entry(sup.clone()).or_default().push(sub.clone());
            }
        }
        for list in parents.values_mut() {
            list.sort();
            list.dedup();
        }
        for list in children.values_mut() {
            list.sort();
            list.dedup();
        }
        Hierarchy { parents, children }
    }

    /// Strict ancestors of `class`, as `(ancestor, steps)` ordered by
    /// distance then name. Deterministic.
    pub fn strict_ancestors(&self, class: &str) -> Vec<(String, usize)> {
        self.walk(class, &self.parents)
    }

    /// Proper descendants of `class`, ordered by distance then name.
    pub fn proper_descendants(&self, class: &str) -> Vec<(String, usize)> {
        self.walk(class, &self.children)
    }

    fn walk(&self, class: &str, edges: &HashMap<String, Vec<String>>) -> Vec<(String, usize)> {
        let mut depth: BTreeMap<String, usize> = BTreeMap::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::from([(class.to_string(), 0)]);
        while let Some((current, steps)) = queue.pop_front() {
            if let Some(next) = edges.get(&current) {
                for node in next {
                    if node != class && !depth.contains_key(node) {
                        depth.insert(node.clone(), steps + 1);
                        queue.push_back((node.clone(), steps + 1));
                    }
                }
            }
        }
        let mut out: Vec<(String, usize)> = depth.into_iter().collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

/// Enumerates every weakening of `form` under `hierarchy`, in rule
/// declaration order with [`WeakeningRule::Retract`] last.
pub fn weakenings(form: &AxiomForm, hierarchy: &Hierarchy) -> Vec<Substitution> {
    let mut out = Vec::new();

    match form {
        AxiomForm::SomeValuesFrom {
            sub,
            property,
            filler,
        } => {
            for (ancestor, steps) in hierarchy.strict_ancestors(filler) {
                out.push(Substitution {
                    rule: WeakeningRule::ExistentialGeneralize,
                    replacement: Some(AxiomForm::some_values(sub, property, ancestor)),
                    loss: STEP_LOSS * steps as f64,
                });
            }
        }
        AxiomForm::AllValuesFrom {
            sub,
            property,
            filler,
        } => {
            for (ancestor, steps) in hierarchy.strict_ancestors(filler) {
                out.push(Substitution {
                    rule: WeakeningRule::UniversalToExistential,
                    replacement: Some(AxiomForm::some_values(sub, property, ancestor)),
                    loss: UNIVERSAL_TO_EXISTENTIAL_LOSS + STEP_LOSS * steps as f64,
                });
            }
        }
        AxiomForm::SubClassOf { sub, sup } => {
            for (ancestor, steps) in hierarchy.strict_ancestors(sup) {
                out.push(Substitution {
                    rule: WeakeningRule::SubClassGeneralize,
                    replacement: Some(AxiomForm::sub_class_of(sub, ancestor)),
                    loss: STEP_LOSS * steps as f64,
                });
            }
        }
        AxiomForm::DisjointWith { left, right } => {
            for (narrowed, _) in hierarchy.proper_descendants(left) {
                out.push(Substitution {
                    rule: WeakeningRule::DisjointNarrow,
                    replacement: Some(AxiomForm::disjoint(narrowed, right)),
                    loss: DISJOINT_NARROW_LOSS,
                });
            }
            for (narrowed, _) in hierarchy.proper_descendants(right) {
                out.push(Substitution {
                    rule: WeakeningRule::DisjointNarrow,
                    replacement: Some(AxiomForm::disjoint(left, narrowed)),
                    loss: DISJOINT_NARROW_LOSS,
                });
            }
        }
        AxiomForm::MaxCardinality { sub, property, n } => {
            out.push(Substitution {
                rule: WeakeningRule::CardinalityRelax,
                replacement: Some(AxiomForm::max_cardinality(sub, property, n + 1)),
                loss: CARDINALITY_RELAX_LOSS,
            });
        }
        AxiomForm::MinCardinality { sub, property, n } => {
            if *n > 1 {
                out.push(Substitution {
                    rule: WeakeningRule::CardinalityRelax,
                    replacement: Some(AxiomForm::min_cardinality(sub, property, n - 1)),
                    loss: CARDINALITY_RELAX_LOSS,
                });
            } else {
                out.push(Substitution {
                    rule: WeakeningRule::CardinalityRelax,
                    replacement: None,
                    loss: DROP_MIN_ONE_LOSS,
                });
            }
        }
    }

    out.push(Substitution {
        rule: WeakeningRule::Retract,
        replacement: None,
        loss: RETRACT_LOSS,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_store::parse_axiom;

    fn hierarchy() -> Hierarchy {
        let axioms: Vec<Axiom> = [
            "NovelVirusX ⊑ Virus",
            "Virus ⊑ Pathogen",
            "Bacterium ⊑ Pathogen",
            "Pathogen ⊑ Agent",
        ]
        .iter()
        .map(|s| Axiom::existing(parse_axiom(s).unwrap()))
        .collect();
        Hierarchy::from_axioms(&axioms)
    }

    #[test]
    fn test_strict_ancestors_are_ordered_by_distance() {
        let h = hierarchy();
        let ancestors = h.strict_ancestors("NovelVirusX");
        assert_eq!(
            ancestors,
            vec![
                ("Virus".to_string(), 1),
                ("Pathogen".to_string(), 2),
                ("Agent".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_existential_generalize_excludes_original_filler() {
        let form = parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap();
        let subs = weakenings(&form, &hierarchy());
        assert!(subs.iter().all(|s| s.replacement.as_ref() != Some(&form)));
        assert_eq!(
            subs[0].replacement,
            Some(parse_axiom("Pneumonia ⊑ ∃causedBy.Virus").unwrap())
        );
        assert!((subs[0].loss - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_universal_weakens_only_to_existential_or_retract() {
        let form = parse_axiom("Pneumonia ⊑ ∀causedBy.Bacterium").unwrap();
        let subs = weakenings(&form, &hierarchy());
        for sub in &subs {
            assert!(matches!(
                sub.rule,
                WeakeningRule::UniversalToExistential | WeakeningRule::Retract
            ));
        }
        // Bacterium's strict ancestors are Pathogen then Agent.
        assert_eq!(
            subs[0].replacement,
            Some(parse_axiom("Pneumonia ⊑ ∃causedBy.Pathogen").unwrap())
        );
        assert!((subs[0].loss - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_narrow_uses_proper_subclasses() {
        let form = parse_axiom("Virus ⊓ Bacterium ⊑ ⊥").unwrap();
        let subs = weakenings(&form, &hierarchy());
        let narrowed: Vec<_> = subs
            .iter()
            .filter(|s| s.rule == WeakeningRule::DisjointNarrow)
            .collect();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(
            narrowed[0].replacement,
            Some(AxiomForm::disjoint("NovelVirusX", "Bacterium"))
        );
    }

    #[test]
    fn test_min_one_drops_instead_of_reaching_zero() {
        let form = parse_axiom("Pneumonia ⊑ ≥1 causedBy").unwrap();
        let subs = weakenings(&form, &hierarchy());
        assert_eq!(subs[0].rule, WeakeningRule::CardinalityRelax);
        assert!(subs[0].replacement.is_none());
        assert!((subs[0].loss - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_retract_is_always_last_and_costs_full_loss() {
        let form = parse_axiom("NovelVirusX ⊑ Virus").unwrap();
        let subs = weakenings(&form, &hierarchy());
        let last = subs.last().unwrap();
        assert_eq!(last.rule, WeakeningRule::Retract);
        assert!(last.replacement.is_none());
        assert!((last.loss - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_root_class_has_only_retract() {
        let form = parse_axiom("Pneumonia ⊑ ∃causedBy.Agent").unwrap();
        let subs = weakenings(&form, &hierarchy());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].rule, WeakeningRule::Retract);
    }
}
