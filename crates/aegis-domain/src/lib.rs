//! Aegis Domain Layer
//!
//! This crate contains the claim-lifecycle model shared by every other Aegis
//! crate. It performs no I/O: it defines the value types, the closed status
//! enumeration, the error taxonomy, and the trait interfaces that the store,
//! provider, and workflow layers implement or consume.
//!
//! ## Key Concepts
//!
//! - **Claim**: a unit of text plus source metadata waiting to be verified
//! - **Status**: the single field that decides which stage processes a claim next
//! - **Evidence bundle**: an opaque research document, inspected through [`EvidenceBundle`]
//! - **Verified record**: the terminal, write-once verdict for a resolved claim
//!
//! ## Lifecycle
//!
//! ```text
//! new → scored → fused-pending → resolved
//!          │            │
//!          ▼            ▼
//!      archived     escalated ⇄ failed   (bounded by the retry counter)
//!                       │
//!                       ▼
//!                   resolved
//! ```
//!
//! Every transition goes through a method on [`Claim`] that checks the
//! precondition and returns a [`TransitionError`] instead of producing an
//! inconsistent record.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claim;
pub mod error;
pub mod event;
pub mod evidence;
pub mod status;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use claim::{Claim, ClaimId};
pub use error::{EvidenceError, ProviderError, TransitionError};
pub use event::VerificationEvent;
pub use evidence::{EvidenceBundle, EvidenceSnippet, FactCheckMatch};
pub use status::ClaimStatus;
pub use traits::{
    ClaimQuery, ClaimStore, CommitOutcome, CredibilityScorer, EvidenceProvider, ExpertProvider,
    Lease, Notifier, SuspicionScorer,
};
pub use verdict::{Adjudication, CaseFile, ResolutionPath, Verdict, VerifiedRecord};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in seconds since the Unix epoch
///
/// Returns 0 if the system clock is set before the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
