//! Persona and domain-tag sampling

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Mutex;

const DEFAULT_PERSONAS: &[&str] = &[
    "A retired schoolteacher who cares about fairness between generations.",
    "A small-business owner worried about regulation and running costs.",
    "An environmental scientist focused on long-term ecological risks.",
    "A public health nurse who sees the effects of policy on vulnerable patients.",
    "A software engineer interested in how technology changes work.",
    "A farmer whose income depends on weather and commodity prices.",
    "A civil liberties lawyer wary of state overreach.",
    "A university economist who thinks in incentives and trade-offs.",
    "A parent of three juggling household budgets and childcare.",
    "A city council member balancing competing local interests.",
    "A union organizer advocating for workers' rights.",
    "A philosopher concerned with consistency and moral principles.",
];

/// Indexable collection of persona descriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personas {
    entries: Vec<String>,
}

impl Personas {
    /// Create from a list, dropping blank entries
    pub fn new(entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// One persona per non-empty line
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines().map(str::to_string))
    }

    /// Read a persona file, one persona per line
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::from_lines(&std::fs::read_to_string(path)?))
    }

    /// Number of personas
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no personas
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persona at `index`
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// Sample up to `k` distinct personas
    pub fn sample<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Vec<String> {
        self.entries
            .choose_multiple(rng, k.min(self.entries.len()))
            .cloned()
            .collect()
    }
}

impl Default for Personas {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONAS.iter().map(|p| p.to_string()))
    }
}

/// Mixes a debate's tags with sampled universal tags
#[derive(Debug, Clone, Default)]
pub struct TagMixer {
    universal: Vec<String>,
    per_request: usize,
}

impl TagMixer {
    /// Create a mixer producing up to `per_request` tags
    pub fn new(universal: Vec<String>, per_request: usize) -> Self {
        Self {
            universal,
            per_request,
        }
    }

    /// Debate tags first, topped up with universal tags not already present
    pub fn mix<R: Rng + ?Sized>(&self, debate_tags: &[String], rng: &mut R) -> Vec<String> {
        let mut tags: Vec<String> = debate_tags.iter().take(self.per_request).cloned().collect();
        let missing = self.per_request.saturating_sub(tags.len());
        if missing == 0 {
            return tags;
        }
        let pool: Vec<&String> = self
            .universal
            .iter()
            .filter(|t| !tags.contains(t))
            .collect();
        tags.extend(pool.choose_multiple(rng, missing).map(|t| (*t).clone()));
        tags
    }
}

/// Random source shared by concurrent workers
#[derive(Debug)]
pub struct SharedRng(Mutex<StdRng>);

impl SharedRng {
    /// Seeded when `seed` is given, from OS entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self(Mutex::new(rng))
    }

    /// Run `f` with exclusive access to the generator
    pub fn with<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.0.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}
