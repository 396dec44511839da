//! Built-in deterministic assessors.
//!
//! Two perspectives ship with the engine: domain grounding and
//! linguistic well-formedness. Both are rule-based and reproducible, so
//! unattended runs and tests behave identically from run to run.

use super::{Assessment, Assessor, Score};
use crate::error::Result;
use mend_store::{Axiom, OntologyVersion};
use std::collections::BTreeSet;
use tracing::debug;

/// Scores how well a candidate is grounded in the ontology's existing
/// vocabulary.
///
/// A candidate that only mentions known classes and properties is well
/// grounded; one introducing a single new name is still plausible (new
/// knowledge has to enter somewhere); one mentioning nothing the
/// ontology knows scores near the floor.
#[derive(Debug, Default)]
pub struct DomainAssessor;

impl DomainAssessor {
    /// Creates a domain assessor.
    pub fn new() -> Self {
        DomainAssessor
    }
}

impl Assessor for DomainAssessor {
    fn name(&self) -> &str {
        "domain-expert"
    }

    fn role(&self) -> &str {
        "domain plausibility"
    }

    fn assess(&self, axiom: &Axiom, version: &OntologyVersion) -> Result<Assessment> {
        let mut known_classes: BTreeSet<&str> = BTreeSet::new();
        let mut known_properties: BTreeSet<&str> = BTreeSet::new();
        for existing in version.axioms() {
            known_classes.extend(existing.form.classes());
            if let Some(property) = existing.form.property() {
                known_properties.insert(property);
            }
        }

        let mentioned = axiom.form.classes();
        let known = mentioned
            .iter()
            .filter(|c| known_classes.contains(*c))
            .count();
        let fraction = known as f64 / mentioned.len() as f64;

        let property_grounded = match axiom.form.property() {
            Some(property) => known_properties.contains(property),
            None => true,
        };

        let mut score = 0.3 + 0.5 * fraction;
        if property_grounded {
            score += 0.2;
        }

        let unknown: Vec<&str> = mentioned
            .iter()
            .filter(|c| !known_classes.contains(*c))
            .copied()
            .collect();
        let commentary = if unknown.is_empty() {
            "every class and property already in the ontology".to_string()
        } else {
            format!("introduces new names: {}", unknown.join(", "))
        };

        debug!(axiom = %axiom.form, score, "domain assessment");
        Ok(Assessment::new(
            self.name(),
            self.role(),
            Score::clamped(score),
            commentary,
        ))
    }
}

/// Scores the structural well-formedness of a candidate sentence.
///
/// Rubric-style: a subsumption operator, a quantified restriction, a
/// qualified filler, and a reasonable sentence length each earn a bonus.
#[derive(Debug, Default)]
pub struct LinguisticAssessor;

impl LinguisticAssessor {
    /// Creates a linguistic assessor.
    pub fn new() -> Self {
        LinguisticAssessor
    }
}

impl Assessor for LinguisticAssessor {
    fn name(&self) -> &str {
        "linguistic-insight"
    }

    fn role(&self) -> &str {
        "structural well-formedness"
    }

    fn assess(&self, axiom: &Axiom, _version: &OntologyVersion) -> Result<Assessment> {
        let sentence = axiom.form.to_string();
        let mut score = 0.0;
        let mut notes = Vec::new();

        if sentence.contains('⊑') {
            score += 0.3;
            notes.push("has subsumption");
        }
        if sentence.contains('∃') || sentence.contains('∀') {
            score += 0.3;
            notes.push("has quantified restriction");
        }
        if sentence.contains('.') {
            score += 0.2;
            notes.push("has qualified filler");
        }
        if (8..=80).contains(&sentence.chars().count()) {
            score += 0.2;
            notes.push("reasonable length");
        }

        debug!(axiom = %sentence, score, "linguistic assessment");
        Ok(Assessment::new(
            self.name(),
            self.role(),
            Score::clamped(score),
            notes.join(", "),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_store::parse_axiom;

    fn version() -> OntologyVersion {
        let axioms = [
            "Virus ⊑ Pathogen",
            "Bacterium ⊑ Pathogen",
            "Virus ⊓ Bacterium ⊑ ⊥",
            "Pneumonia ⊑ ∀causedBy.Bacterium",
        ]
        .iter()
        .map(|s| Axiom::existing(parse_axiom(s).unwrap()))
        .collect();
        OntologyVersion::new(1, axioms)
    }

    #[test]
    fn test_domain_scores_fully_grounded_candidate_highest() {
        let grounded = Axiom::proposed(parse_axiom("Pneumonia ⊑ ∃causedBy.Virus").unwrap());
        let novel = Axiom::proposed(parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap());
        let alien = Axiom::proposed(parse_axiom("Quasar ⊑ ∃emits.Radiation").unwrap());

        let assessor = DomainAssessor::new();
        let v = version();
        let grounded_score = assessor.assess(&grounded, &v).unwrap().score.value();
        let novel_score = assessor.assess(&novel, &v).unwrap().score.value();
        let alien_score = assessor.assess(&alien, &v).unwrap().score.value();

        assert!(grounded_score > novel_score);
        assert!(novel_score > alien_score);
    }

    #[test]
    fn test_domain_commentary_names_new_classes() {
        let novel = Axiom::proposed(parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap());
        let assessment = DomainAssessor::new().assess(&novel, &version()).unwrap();
        assert!(assessment.commentary.contains("NovelVirusX"));
    }

    #[test]
    fn test_linguistic_rewards_restriction_structure() {
        let assessor = LinguisticAssessor::new();
        let v = version();
        let restriction =
            Axiom::proposed(parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap());
        let bare = Axiom::proposed(parse_axiom("NovelVirusX ⊑ Virus").unwrap());

        let restriction_score = assessor.assess(&restriction, &v).unwrap().score.value();
        let bare_score = assessor.assess(&bare, &v).unwrap().score.value();
        assert!((restriction_score - 1.0).abs() < f64::EPSILON);
        assert!(restriction_score > bare_score);
    }

    #[test]
    fn test_assessments_are_deterministic() {
        let axiom = Axiom::proposed(parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap());
        let v = version();
        let assessor = DomainAssessor::new();
        let first = assessor.assess(&axiom, &v).unwrap();
        let second = assessor.assess(&axiom, &v).unwrap();
        assert!((first.score.value() - second.score.value()).abs() < f64::EPSILON);
        assert_eq!(first.commentary, second.commentary);
    }
}
