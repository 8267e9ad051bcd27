//! Cross-check of verified signature authors against the approval roster.
//!
//! The cryptographic verifier and the approval service are independent and
//! can disagree, for example when the roster changed after someone signed.
//! Disagreement is reported, never treated as an error.

use crate::signer::SignerDto;
use crate::verification::VerificationEntry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    /// Expected signers without a verified signature.
    pub missing: Vec<SignerDto>,
    /// Verified author ids nobody expected, in first seen order.
    pub unexpected: Vec<String>,
}

impl ReconciliationReport {
    pub fn is_fully_verified(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Compare `expected` signers with the authors found by verification.
///
/// A signature made by a signer's deputy counts for that signer.
pub fn reconcile(expected: &[SignerDto], verified: &[VerificationEntry]) -> ReconciliationReport {
    let missing = expected
        .iter()
        .filter(|signer| {
            !verified
                .iter()
                .any(|entry| signer.is_represented_by(&entry.author_id))
        })
        .cloned()
        .collect();

    let mut unexpected: Vec<String> = Vec::new();
    for entry in verified {
        let known = expected
            .iter()
            .any(|signer| signer.is_represented_by(&entry.author_id));
        if !known && !unexpected.contains(&entry.author_id) {
            unexpected.push(entry.author_id.clone());
        }
    }

    ReconciliationReport { missing, unexpected }
}
