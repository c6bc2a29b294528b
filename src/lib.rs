// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # elfscope
//!
//! A memory-safe, cross-platform library for parsing, loading and introspecting ELF
//! kernel and boot images. Built in pure Rust, `elfscope` validates the structural
//! integrity of an image, computes the physical memory footprint its loadable
//! segments require, copies those segments into a caller-owned destination region,
//! and can re-materialize a condensed symbol table alongside the loaded binary for
//! later debugging and crash tooling.
//!
//! The crate is written for hostile input: an image may come from an untrusted
//! guest or boot path, so every derived offset is bounds-checked before it is
//! dereferenced, all size arithmetic is overflow-checked, and a malformed image is
//! rejected before any dependent computation runs.
//!
//! ## Features
//!
//! - **📦 Efficient memory access** - Memory-mapped file access with reference-based parsing
//! - **🔍 Both widths, both byte orders** - ELF32/ELF64, little/big endian, auto-detected,
//!   handled through a single dual-width accessor rather than duplicated code paths
//! - **🛡️ Hardened validation** - Overflow-checked table bounds proven before any entry is read
//! - **⚙️ Pluggable destination memory** - Loading goes through a copy/zero collaborator
//!   with a trusted and a defensive safety regime
//! - **🔧 Embedded symbol tables** - Condensed, relocated header + symtab/strtab copy for
//!   post-load introspection without the original file
//! - **📊 Symbol resolution** - Name-to-address lookup over the located symbol table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elfscope::prelude::*;
//!
//! // Parse and validate an image
//! let mut binary = ElfObject::from_file("vmlinux".as_ref())?;
//!
//! // Measure it, allocate, load it
//! if let Some(footprint) = binary.compute_footprint()? {
//!     let mut memory = vec![0u8; footprint.len() as usize];
//!     let mut region = SliceRegion::new(footprint.start, &mut memory);
//!     binary.load_into(&mut region, CopyPolicy::Defensive)?;
//! }
//!
//! // Resolve symbols
//! if let Some(address) = binary.symbol_address("start_kernel")? {
//!     println!("start_kernel at 0x{:x}", address);
//! }
//! # Ok::<(), elfscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `elfscope` is organized into two layers:
//!
//! - [`elf`] - The domain layer: identification, header handles, the parse context,
//!   the segment loader, the embedded symbol table and diagnostics
//! - `file` (internal, re-exported at the crate root) - The access layer: the
//!   [`Backend`] trait with [`Physical`] (memory-mapped) and [`Memory`] (owned
//!   buffer) implementations, plus endian-aware bounds-checked primitive I/O
//!
//! The pipeline is validate → measure → (caller allocates) → load → resolve; see
//! the [`elf`] module documentation for details.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with specific failure modes:
//!
//! ```rust,no_run
//! use elfscope::{Error, ElfObject};
//!
//! match ElfObject::from_file(std::path::Path::new("image.elf")) {
//!     Ok(binary) => println!("Successfully parsed image"),
//!     Err(Error::NotElf) => println!("Not an ELF binary"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed image: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! A failed symbol lookup is not an error: it is the `Ok(None)` arm of
//! [`elf::ElfBinary::symbol_address`], keeping "miss" distinguishable from
//! "broken image" at the type level.
//!
//! ## Scope
//!
//! `elfscope` deliberately does not perform relocation processing, dynamic
//! linking, or section manipulation beyond locating the string and symbol
//! tables, and it never validates the semantics of the machine code it copies.
//! It parses and loads the ELF format family, nothing else.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

pub mod elf;
pub mod prelude;

/// `elfscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `elfscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for image validation, segment loading and symbol table embedding.
pub use error::Error;

/// Main entry point for working with ELF images.
///
/// See [`elf::ElfObject`] for parsing, measuring, loading and symbol resolution
/// over an owned image.
pub use elf::ElfObject;

/// Image data source abstraction and the provided backends.
///
/// - [`Backend`] - Trait for pluggable data sources
/// - [`Physical`] - Memory-mapped file backend
/// - [`Memory`] - In-memory buffer backend
pub use file::{Backend, Memory, Physical};
