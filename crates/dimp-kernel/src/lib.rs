//! # DIMP Kernel
//!
//! The receiving side of the DIMP content layer: decode, verify, authorize.
//!
//! ## Overview
//!
//! The kernel sits between the transport and the application:
//!
//! - **Decoding**: wire records become typed [`Content`](core::Content) via the registry
//! - **Profiles**: signed profile responses are checked against the owner's key
//! - **Groups**: group commands are checked against the sender's current role
//! - **Rejections**: a refused command yields a receipt correlated by `sn`
//!
//! Membership and keys come from the caller through [`RoleDirectory`] and
//! [`KeyDirectory`]; the kernel only reads them.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dimp_kernel::core::{GroupCommand, Id, WireContent};
//! use dimp_kernel::perms::MemberType;
//! use dimp_kernel::{IngestResult, Kernel, KernelConfig, MemoryDirectory};
//!
//! let group = Id::parse("group@anywhere").unwrap();
//! let owner = Id::parse("owner@anywhere").unwrap();
//! let member = Id::parse("member@anywhere").unwrap();
//!
//! let directory = Arc::new(MemoryDirectory::new());
//! directory.set_role(&group, &owner, MemberType::OWNER);
//! directory.set_role(&group, &member, MemberType::MEMBER);
//!
//! let kernel = Kernel::new(directory.clone(), directory, KernelConfig::default());
//!
//! // A plain member may not replace the member list
//! let reset = GroupCommand::reset(group.clone(), vec![member.clone()]);
//! let result = kernel.ingest(&member, &reset.to_record()).unwrap();
//! assert!(matches!(result, IngestResult::Rejected { .. }));
//!
//! // The owner may
//! let result = kernel.ingest(&owner, &reset.to_record()).unwrap();
//! assert!(result.is_accepted());
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `dimp_kernel::core` - Content model, registry, keys
//! - `dimp_kernel::perms` - Roles and the permission engine

pub mod directory;
pub mod error;
pub mod kernel;

// Re-export component crates
pub use dimp_core as core;
pub use dimp_perms as perms;

// Re-export main types for convenience
pub use directory::{KeyDirectory, MemoryDirectory, RoleDirectory, SharedVerifyKey};
pub use error::{KernelError, Result};
pub use kernel::{Authorization, BatchReport, IngestResult, Kernel, KernelConfig};

// Re-export commonly used core types
pub use dimp_core::{Content, ContentRegistry, GroupCommand, Id, ReceiptCommand, Record};
pub use dimp_perms::{GroupAction, MemberType};
