use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use crate::scoring::ScoredCandidate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityConfig {
    pub enabled: bool,
    pub max_consecutive: usize,
    pub penalty: f64,
    pub type_enabled: bool,
    pub type_max_consecutive: usize,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_consecutive: 2,
            penalty: 0.5,
            type_enabled: true,
            type_max_consecutive: 3,
        }
    }
}

#[derive(Debug, Default)]
struct Run {
    key: Option<String>,
    len: usize,
}

impl Run {
    fn push(&mut self, key: &str) {
        if self.key.as_deref() == Some(key) {
            self.len += 1;
        } else {
            self.key = Some(key.to_string());
            self.len = 1;
        }
    }

    fn would_exceed(&self, key: &str, max: usize) -> bool {
        self.key.as_deref() == Some(key) && self.len >= max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Clear,
    Author,
    Type,
}

/// Sequential pass that breaks up same-author and same-type runs.
///
/// Works on an already score-sorted list. Already placed items are never
/// revisited; a deferred item moves behind the next candidate that can be
/// placed, or further back if its reduced score says so.
#[derive(Debug, Clone)]
pub struct DiversityReranker {
    config: DiversityConfig,
}

impl DiversityReranker {
    pub fn new(config: DiversityConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled || self.config.type_enabled
    }

    pub fn rerank(&self, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        if !self.is_enabled() || candidates.len() < 2 {
            return candidates;
        }

        let mut remaining: VecDeque<ScoredCandidate> = candidates.into();
        let mut placed = Vec::with_capacity(remaining.len());
        let mut author_run = Run::default();
        let mut type_run = Run::default();
        let mut deferrals = 0usize;

        while let Some(head) = remaining.front() {
            let block = self.block(head, &author_run, &type_run);
            let alternative = match block {
                Block::Clear => None,
                _ => remaining
                    .iter()
                    .position(|c| self.block(c, &author_run, &type_run) == Block::Clear)
                    .or_else(|| {
                        // Nothing satisfies both rules; only an author run
                        // is still worth breaking.
                        if block == Block::Author {
                            remaining
                                .iter()
                                .position(|c| !self.author_blocked(c, &author_run))
                        } else {
                            None
                        }
                    }),
            };

            let Some(alternative) = alternative else {
                if let Some(candidate) = remaining.pop_front() {
                    author_run.push(&candidate.author_id);
                    type_run.push(candidate.item_type.label());
                    placed.push(candidate);
                }
                continue;
            };

            if let Some(mut deferred) = remaining.pop_front() {
                if block == Block::Author {
                    deferred.score *= self.config.penalty;
                    deferred.diversity_multiplier *= self.config.penalty;
                }
                deferred.deferrals += 1;
                deferrals += 1;

                // After the pop, index `alternative` is the slot just behind
                // the candidate that will be placed instead.
                let position = remaining
                    .iter()
                    .skip(alternative)
                    .position(|c| c.score < deferred.score)
                    .map(|offset| offset + alternative)
                    .unwrap_or(remaining.len());
                remaining.insert(position, deferred);
            }
        }

        if deferrals > 0 {
            debug!(deferrals, candidates = placed.len(), "diversity pass reordered candidates");
        }

        placed
    }

    fn block(&self, candidate: &ScoredCandidate, author_run: &Run, type_run: &Run) -> Block {
        if self.author_blocked(candidate, author_run) {
            return Block::Author;
        }
        if self.config.type_enabled
            && type_run.would_exceed(candidate.item_type.label(), self.config.type_max_consecutive)
        {
            return Block::Type;
        }
        Block::Clear
    }

    fn author_blocked(&self, candidate: &ScoredCandidate, author_run: &Run) -> bool {
        self.config.enabled
            && author_run.would_exceed(&candidate.author_id, self.config.max_consecutive)
    }
}
