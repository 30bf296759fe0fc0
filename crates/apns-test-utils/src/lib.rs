//! # APNs Test Utilities
//!
//! Shared test utilities for the token-issuance and push-dispatch crates.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (a fixed P-256 keypair, fixed IDs)
//! - Structural JWT assertions (`TokenAssertions` trait)
//! - Stub signers that count and optionally fail invocations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use apns_test_utils::*;
//!
//! let key = test_signing_key();
//! let signer = CountingSigner::new();
//!
//! token
//!     .assert_valid_jwt()
//!     .assert_signed_by(TEST_KEY_ID);
//! ```

pub mod assertions;
pub mod fixtures;
pub mod stub_signer;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use stub_signer::*;
