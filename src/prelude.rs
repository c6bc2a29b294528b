//! # elfscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the elfscope library. Import this module to get quick access to the essential
//! types for parsing and loading ELF images.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all elfscope operations
pub use crate::Error;

/// The result type used throughout elfscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Owning entry point for ELF image analysis and loading
pub use crate::ElfObject;

/// Borrowing parse context, for callers that already hold the image bytes
pub use crate::elf::ElfBinary;

// ================================================================================================
// Identification and Header Handles
// ================================================================================================

/// Image identification: class and byte order, detected at validation time
pub use crate::elf::{ByteOrder, Class, Ident};

/// Pre-validated handles into the image's header tables
pub use crate::elf::{FileHeader, ProgramHeader, SectionHeader, Symbol};

/// Decoded header type tags and segment permission flags
pub use crate::elf::{SectionKind, SegmentFlags, SegmentKind};

// ================================================================================================
// Loading
// ================================================================================================

/// The physical address range the loadable segments span
pub use crate::elf::Footprint;

/// Destination memory collaborator and the safety regime selector
pub use crate::elf::{CopyPolicy, Region, SliceRegion};

/// The planned condensed symbol table copy placed past the loaded image
pub use crate::elf::EmbeddedSymtab;

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Message collection for human-readable tracing of validation and loading
pub use crate::elf::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

// ================================================================================================
// Image Access
// ================================================================================================

/// Data source abstraction and the provided file/memory backends
pub use crate::file::{Backend, Memory, Physical};
