//! # DIMP Testkit
//!
//! Testing utilities for the DIMP crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Wire records as peers send them, with the variant each must decode to
//! - **Generators**: Proptest strategies for identifiers, roles and contents
//! - **Fixtures**: A populated group with deterministic keys and a ready kernel
//!
//! ## Golden Vectors
//!
//! ```rust
//! use dimp_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().expect("golden vectors");
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use dimp_testkit::generators::content;
//!
//! proptest! {
//!     #[test]
//!     fn json_roundtrip(content in content()) {
//!         let decoded = dimp_core::Content::from_json(&content.to_json()).unwrap();
//!         prop_assert_eq!(decoded, content);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use dimp_testkit::fixtures::GroupFixture;
//! use dimp_kernel::KernelConfig;
//!
//! let fixture = GroupFixture::new();
//! let kernel = fixture.kernel(KernelConfig::default());
//! let profile = fixture.signed_profile(&fixture.member, r#"{"name":"mem"}"#);
//! assert!(kernel.verify_profile(&profile).is_ok());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{id, seeded_key, GroupFixture};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, GoldenVector};
