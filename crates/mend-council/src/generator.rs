//! Candidate axiom sources.
//!
//! The engine pulls candidate sentences from a [`Generator`]; what sits
//! behind the trait is deliberately unspecified. The shipped
//! [`ScriptedGenerator`] replays a fixed queue, which is what batch runs
//! and tests use.

use crate::error::{CouncilError, Result};
use mend_store::OntologyVersion;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// A source of candidate axiom sentences.
///
/// Returns raw DL sentences; parsing and validation happen downstream,
/// so a generator is free to emit garbage and the cycle will fail it
/// cleanly rather than crash.
pub trait Generator: Send + Sync {
    /// Returns the name of this generator.
    fn name(&self) -> &str;

    /// Proposes the next candidate sentence given the current ontology.
    ///
    /// # Errors
    ///
    /// [`CouncilError::Exhausted`] when the source has nothing further;
    /// [`CouncilError::Generation`] for any other production failure.
    fn propose(&self, version: &OntologyVersion) -> Result<String>;
}

/// Replays a fixed queue of sentences, then reports exhaustion.
#[derive(Debug)]
pub struct ScriptedGenerator {
    sentences: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    /// Creates a generator over a fixed script.
    pub fn new(sentences: impl IntoIterator<Item = impl Into<String>>) -> Self {
        ScriptedGenerator {
            sentences: Mutex::new(sentences.into_iter().map(Into::into).collect()),
        }
    }

    /// Number of sentences still queued.
    pub fn remaining(&self) -> usize {
        self.sentences.lock().expect("generator lock poisoned").len()
    }
}

impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn propose(&self, version: &OntologyVersion) -> Result<String> {
        let mut queue = self.sentences.lock().expect("generator lock poisoned");
        match queue.pop_front() {
            Some(sentence) => {
                debug!(
                    version = version.number(),
                    remaining = queue.len(),
                    %sentence,
                    "scripted candidate"
                );
                Ok(sentence)
            }
            None => Err(CouncilError::Exhausted),
        }
    }
}
