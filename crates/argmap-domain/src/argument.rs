//! Generated argument candidates

use crate::Valence;

/// A generated argument, validated at the generation boundary
///
/// Candidates live only between generation and placement: they are either
/// merged into an existing node or turned into a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentCandidate {
    /// Short title, echoed back by salience selection
    pub label: String,

    /// The argument's claim
    pub claim: String,

    /// Index of the target premise of the parent node
    pub target_index: usize,

    /// Support or attack
    pub valence: Valence,
}

impl ArgumentCandidate {
    /// Create a candidate, trimming label and claim
    ///
    /// Returns `None` when either the label or the claim is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use argmap_domain::{ArgumentCandidate, Valence};
    ///
    /// let arg = ArgumentCandidate::new(" Revenue ", "It funds green infrastructure.", 0, Valence::Pro);
    /// assert_eq!(arg.unwrap().label, "Revenue");
    /// assert!(ArgumentCandidate::new("", "claim", 0, Valence::Con).is_none());
    /// ```
    pub fn new(
        label: impl AsRef<str>,
        claim: impl AsRef<str>,
        target_index: usize,
        valence: Valence,
    ) -> Option<Self> {
        let label = label.as_ref().trim();
        let claim = claim.as_ref().trim();
        if label.is_empty() || claim.is_empty() {
            return None;
        }
        Some(Self {
            label: label.to_string(),
            claim: claim.to_string(),
            target_index,
            valence,
        })
    }
}
