//! Definitions, parsing, loading and symbol resolution for ELF images.
//!
//! This module implements the domain layer of the crate: detecting an image's
//! class and byte order, validating its header tables against hostile input,
//! measuring the physical memory its loadable segments require, copying those
//! segments into a caller-owned destination, embedding a condensed symbol table
//! copy for post-load introspection, and resolving symbol names to addresses.
//!
//! # Key Components
//!
//! ## Entry Points
//! - [`ElfObject`] - Owns the image bytes and the parsed view; start here
//! - [`ElfBinary`] - The parsed view itself, for callers that hold the bytes
//!
//! ## Supporting Types
//! - [`Ident`], [`Class`], [`ByteOrder`] - Identification and the dual-width accessor
//! - [`FileHeader`], [`ProgramHeader`], [`SectionHeader`], [`Symbol`] - Header handles
//! - [`Footprint`] - The physical range the loadable segments span
//! - [`Region`], [`SliceRegion`], [`CopyPolicy`] - The destination-memory collaborator
//! - [`EmbeddedSymtab`] - The planned condensed symbol table copy
//! - [`Diagnostics`] - Message collector for human-readable tracing
//!
//! # Pipeline
//!
//! Validate ([`ElfBinary::parse`]) → measure ([`ElfBinary::compute_footprint`]) →
//! caller allocates → load ([`ElfBinary::load`], which also materializes a planned
//! [`EmbeddedSymtab`]) → resolve ([`ElfBinary::symbol_address`], any time after
//! validation).

pub mod binary;
pub mod diagnostics;
pub mod headers;
pub mod ident;
pub mod loader;
pub mod object;
pub mod symtab;

pub use binary::{ElfBinary, Footprint};
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
pub use headers::{
    FileHeader, ProgramHeader, SectionHeader, SectionKind, SegmentFlags, SegmentKind, Symbol,
};
pub use ident::{ByteOrder, Class, Ident};
pub use loader::{CopyPolicy, Region, SliceRegion};
pub use object::ElfObject;
pub use symtab::EmbeddedSymtab;
