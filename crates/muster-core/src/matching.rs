//! Roster types and probe-to-roster matching.
//!
//! A probe embedding is matched by selecting the roster entry at minimum
//! Euclidean distance, then checking the acceptance flag computed for that
//! entry. Acceptance flags are cosine-similarity checks computed for the
//! whole roster, so the argmin entry can be rejected even when another
//! entry would have been accepted. This argmin-then-accept order is the
//! observed behavior of the system this replaces and is kept as-is.

use crate::types::Embedding;

/// A named reference embedding in the roster.
///
/// Built once at startup from a reference image; immutable afterwards.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Uppercased filename stem of the reference image.
    pub name: String,
    pub embedding: Embedding,
}

/// The ordered set of known identities, read-only after startup.
///
/// Names need not be unique; duplicate names resolve to whichever entry
/// wins the distance argmin.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    identities: Vec<Identity>,
}

/// Outcome of matching one probe against the roster.
#[derive(Debug, Clone)]
pub struct RosterMatch {
    pub name: String,
    /// Euclidean distance to the winning entry.
    pub distance: f32,
    /// Cosine similarity to the winning entry.
    pub similarity: f32,
}

impl Roster {
    pub fn new(identities: Vec<Identity>) -> Self {
        Self { identities }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.identities.iter()
    }

    /// Match a probe embedding against every identity in the roster.
    ///
    /// Returns `None` when the roster is empty or when the minimum-distance
    /// entry fails the acceptance check. Ties on distance resolve to the
    /// first-occurring entry in roster order.
    pub fn best_match(&self, probe: &Embedding, accept_threshold: f32) -> Option<RosterMatch> {
        if self.identities.is_empty() {
            return None;
        }

        // Acceptance flags for the full roster, then distances, then argmin.
        // The flag consulted is the one at the argmin index only.
        let accepts: Vec<bool> = self
            .identities
            .iter()
            .map(|id| probe.similarity(&id.embedding) >= accept_threshold)
            .collect();

        let distances: Vec<f32> = self
            .identities
            .iter()
            .map(|id| probe.euclidean_distance(&id.embedding))
            .collect();

        let mut best_idx = 0usize;
        for (i, &d) in distances.iter().enumerate() {
            if d < distances[best_idx] {
                best_idx = i;
            }
        }

        if !accepts[best_idx] {
            return None;
        }

        let winner = &self.identities[best_idx];
        Some(RosterMatch {
            name: winner.name.clone(),
            distance: distances[best_idx],
            similarity: probe.similarity(&winner.embedding),
        })
    }
}
