//! The parse context: validation, table location, footprint calculation and
//! symbol resolution over a borrowed ELF image.
//!
//! [`ElfBinary`] is the central type of this crate. It borrows an image, validates
//! its structure up front ([`ElfBinary::parse`]), and afterwards hands out
//! pre-validated header handles, computes the physical memory footprint of the
//! loadable segments, and resolves symbol names against the located symbol/string
//! table pair. It owns no memory beyond its own bookkeeping: every table and
//! segment is referenced by offset into the image, never copied.
//!
//! Validation is strictly ordered and fail-fast. The magic signature and minimal
//! header size are confirmed before anything else is read; the program and section
//! header tables are bounds-checked (with overflow-checked arithmetic) before any
//! of their entries is touched; only then are the string and symbol tables located.
//! A structurally invalid image never produces a partially usable context.
//!
//! # Example
//!
//! ```rust,no_run
//! use elfscope::elf::{CopyPolicy, ElfBinary, SliceRegion};
//!
//! let image = std::fs::read("vmlinux")?;
//! let mut binary = ElfBinary::parse(&image)?;
//!
//! if let Some(footprint) = binary.compute_footprint()? {
//!     let mut memory = vec![0u8; footprint.len() as usize];
//!     let mut region = SliceRegion::new(footprint.start, &mut memory);
//!     binary.load(&mut region, CopyPolicy::Defensive)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::Arc;

use crate::{
    elf::{
        diagnostics::{DiagnosticCategory, Diagnostics},
        headers::{FileHeader, ProgramHeader, SectionHeader, Symbol, SHT_STRTAB, SHT_SYMTAB},
        ident::Ident,
        symtab::EmbeddedSymtab,
    },
    Error,
    Error::{Empty, OutOfBounds},
    Result,
};

/// The minimal physical address range covering every loadable segment.
///
/// Computed by [`ElfBinary::compute_footprint`]; the caller sizes the destination
/// memory region from it. An image with no loadable segments has no footprint
/// (`None`), not a sentinel range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Lowest physical address any loadable segment starts at
    pub start: u64,
    /// One past the highest physical address any loadable segment reaches
    pub end: u64,
}

impl Footprint {
    /// Number of bytes the destination region must provide.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` if the footprint covers no bytes (all loadable segments
    /// declared a zero memory size).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A located byte range inside the image.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Extent {
    pub offset: u64,
    pub size: u64,
}

/// The located symbol table and its associated string table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SymtabRef {
    /// Section header index of the symbol table
    pub section_index: u64,
    /// The symbol entries themselves
    pub entries: Extent,
    /// The linked string table's bytes
    pub strings: Extent,
}

/// A validated view over one ELF image: the live state for one parse/load session.
///
/// See the [module documentation](self) for the validation contract and an example.
/// The loading and symbol-embedding operations live in [`crate::elf::loader`] and
/// [`crate::elf::symtab`] but operate on this same context.
#[derive(Debug)]
pub struct ElfBinary<'data> {
    pub(crate) data: &'data [u8],
    pub(crate) ident: Ident,
    pub(crate) phoff: u64,
    pub(crate) phentsize: u64,
    pub(crate) phnum: u64,
    pub(crate) shoff: u64,
    pub(crate) shentsize: u64,
    pub(crate) shnum: u64,
    pub(crate) shstrtab: Option<Extent>,
    pub(crate) symtab: Option<SymtabRef>,
    pub(crate) footprint: Option<Footprint>,
    pub(crate) embedded: Option<EmbeddedSymtab>,
    pub(crate) diagnostics: Arc<Diagnostics>,
}

impl<'data> ElfBinary<'data> {
    /// Validate an image and build a parse context over it.
    ///
    /// Equivalent to [`ElfBinary::parse_with_diagnostics`] with a quiet collector.
    ///
    /// # Arguments
    /// * `data` - The raw image bytes; borrowed for the lifetime of the context
    ///
    /// # Errors
    /// Returns [`crate::Error::NotElf`] if the magic signature is missing,
    /// [`crate::Error::Empty`] for empty input, and [`crate::Error::Malformed`]
    /// if a header table extends past the image or its geometry overflows.
    pub fn parse(data: &'data [u8]) -> Result<ElfBinary<'data>> {
        Self::parse_with_diagnostics(data, Arc::new(Diagnostics::new()))
    }

    /// Validate an image and build a parse context over it, recording into the
    /// given diagnostics collector.
    ///
    /// Validation order is a hard contract: magic and minimal header size first,
    /// then class/byte-order detection, then the program header table bounds, then
    /// the section header table bounds, then the section name string table, then
    /// the symbol table scan. Each step is a precondition for the next; no field
    /// of a table is read before that table's bounds have been proven.
    ///
    /// # Arguments
    /// * `data` - The raw image bytes
    /// * `diagnostics` - Collector that receives validation messages
    ///
    /// # Errors
    /// See [`ElfBinary::parse`].
    pub fn parse_with_diagnostics(
        data: &'data [u8],
        diagnostics: Arc<Diagnostics>,
    ) -> Result<ElfBinary<'data>> {
        if data.is_empty() {
            return Err(Empty);
        }

        let ident = match Ident::parse(data) {
            Ok(ident) => ident,
            Err(error) => {
                diagnostics.error(DiagnosticCategory::Header, error.to_string());
                return Err(error);
            }
        };

        if data.len() < ident.ehdr_size() {
            let error = malformed_error!(
                "image of {} bytes cannot hold an {} file header",
                data.len(),
                ident.class
            );
            diagnostics.error(DiagnosticCategory::Header, error.to_string());
            return Err(error);
        }

        let header = FileHeader::new(data, ident);
        let phoff = header.phoff()?;
        let phentsize = u64::from(header.phentsize()?);
        let phnum = u64::from(header.phnum()?);
        let shoff = header.shoff()?;
        let shentsize = u64::from(header.shentsize()?);
        let shnum = u64::from(header.shnum()?);

        Self::check_table(
            &diagnostics,
            DiagnosticCategory::Header,
            "program header",
            data.len(),
            phoff,
            phentsize,
            phnum,
            ident.phdr_size(),
        )?;
        Self::check_table(
            &diagnostics,
            DiagnosticCategory::Header,
            "section header",
            data.len(),
            shoff,
            shentsize,
            shnum,
            ident.shdr_size(),
        )?;

        diagnostics.info(
            DiagnosticCategory::Header,
            format!(
                "{} {} image, {} program headers, {} section headers",
                ident.class, ident.order, phnum, shnum
            ),
        );

        let mut binary = ElfBinary {
            data,
            ident,
            phoff,
            phentsize,
            phnum,
            shoff,
            shentsize,
            shnum,
            shstrtab: None,
            symtab: None,
            footprint: None,
            embedded: None,
            diagnostics,
        };

        binary.locate_shstrtab(header.shstrndx()?)?;
        binary.locate_symtab()?;

        Ok(binary)
    }

    /// Bounds-check one header table: entries must be at least their natural size
    /// and the whole table must lie inside the image, with the size arithmetic
    /// itself overflow-checked.
    #[allow(clippy::too_many_arguments)]
    fn check_table(
        diagnostics: &Diagnostics,
        category: DiagnosticCategory,
        what: &str,
        image_len: usize,
        offset: u64,
        entsize: u64,
        count: u64,
        natural: usize,
    ) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        if entsize < natural as u64 {
            let error = malformed_error!(
                "{} entries are {} bytes, need at least {}",
                what,
                entsize,
                natural
            );
            diagnostics.error(category, error.to_string());
            return Err(error);
        }

        match entsize
            .checked_mul(count)
            .and_then(|table| offset.checked_add(table))
        {
            Some(end) if end <= image_len as u64 => Ok(()),
            Some(end) => {
                let error = malformed_error!(
                    "{} table overflow (end 0x{:x} > size 0x{:x})",
                    what,
                    end,
                    image_len
                );
                diagnostics.error(category, error.to_string());
                Err(error)
            }
            None => {
                let error = malformed_error!(
                    "{} table size overflows (off 0x{:x}, {} entries of {} bytes)",
                    what,
                    offset,
                    count,
                    entsize
                );
                diagnostics.error(category, error.to_string());
                Err(error)
            }
        }
    }

    /// Locate the section name string table named by `e_shstrndx`, if any.
    ///
    /// Absence or an out-of-image table degrades section name lookup to `None`;
    /// it is never a parse error.
    fn locate_shstrtab(&mut self, index: u16) -> Result<()> {
        let Some(shdr) = self.section_header(u64::from(index)) else {
            return Ok(());
        };

        let extent = Extent {
            offset: shdr.offset()?,
            size: shdr.size()?,
        };

        if self.extent_in_image(extent) {
            self.shstrtab = Some(extent);
        } else {
            self.diagnostics.warning(
                DiagnosticCategory::Sections,
                format!("section name string table {} lies outside the image", index),
            );
        }

        Ok(())
    }

    /// Scan the section headers for the first symbol table whose linked string
    /// table is valid, and record the pair.
    ///
    /// A symbol table with an invalid link (or with data outside the image) is
    /// discarded and the scan continues; the context then simply has no symbol
    /// table, which is a degraded-but-valid state rather than an error.
    fn locate_symtab(&mut self) -> Result<()> {
        for index in 0..self.shnum {
            let Some(shdr) = self.section_header(index) else {
                break;
            };
            if shdr.type_tag()? != SHT_SYMTAB {
                continue;
            }

            let entries = Extent {
                offset: shdr.offset()?,
                size: shdr.size()?,
            };
            if !self.extent_in_image(entries) {
                self.diagnostics.warning(
                    DiagnosticCategory::Sections,
                    format!("symbol table section {} lies outside the image", index),
                );
                continue;
            }

            let link = u64::from(shdr.link()?);
            let Some(linked) = self.section_header(link) else {
                self.diagnostics.warning(
                    DiagnosticCategory::Sections,
                    format!(
                        "symbol table section {} links to invalid section {}",
                        index, link
                    ),
                );
                continue;
            };
            if linked.type_tag()? != SHT_STRTAB {
                self.diagnostics.warning(
                    DiagnosticCategory::Sections,
                    format!(
                        "symbol table section {} links to section {} which is not a string table",
                        index, link
                    ),
                );
                continue;
            }

            let strings = Extent {
                offset: linked.offset()?,
                size: linked.size()?,
            };
            if !self.extent_in_image(strings) {
                self.diagnostics.warning(
                    DiagnosticCategory::Sections,
                    format!("string table section {} lies outside the image", link),
                );
                continue;
            }

            self.symtab = Some(SymtabRef {
                section_index: index,
                entries,
                strings,
            });
            self.diagnostics.info(
                DiagnosticCategory::Sections,
                format!("symbol table in section {}, strings in section {}", index, link),
            );
            break;
        }

        Ok(())
    }

    /// The image's decoded identification (class and byte order).
    #[must_use]
    pub fn ident(&self) -> Ident {
        self.ident
    }

    /// Handle to the file header.
    #[must_use]
    pub fn header(&self) -> FileHeader<'data> {
        FileHeader::new(self.data, self.ident)
    }

    /// The raw image this context was parsed from.
    #[must_use]
    pub fn image(&self) -> &'data [u8] {
        self.data
    }

    /// Number of program header entries.
    #[must_use]
    pub fn program_header_count(&self) -> u64 {
        self.phnum
    }

    /// Number of section header entries.
    #[must_use]
    pub fn section_header_count(&self) -> u64 {
        self.shnum
    }

    /// Handle to the Nth program header, or `None` if the index is out of range.
    #[must_use]
    pub fn program_header(&self, index: u64) -> Option<ProgramHeader<'data>> {
        if index >= self.phnum {
            return None;
        }

        let offset = self
            .phentsize
            .checked_mul(index)
            .and_then(|at| at.checked_add(self.phoff))
            .and_then(|at| usize::try_from(at).ok())?;
        let entry = self
            .data
            .get(offset..offset.checked_add(self.ident.phdr_size())?)?;

        Some(ProgramHeader::new(entry, self.ident))
    }

    /// Handle to the Nth section header, or `None` if the index is out of range.
    #[must_use]
    pub fn section_header(&self, index: u64) -> Option<SectionHeader<'data>> {
        if index >= self.shnum {
            return None;
        }

        let offset = self
            .shentsize
            .checked_mul(index)
            .and_then(|at| at.checked_add(self.shoff))
            .and_then(|at| usize::try_from(at).ok())?;
        let entry = self
            .data
            .get(offset..offset.checked_add(self.ident.shdr_size())?)?;

        Some(SectionHeader::new(entry, self.ident))
    }

    /// The bytes of a section, bounds-checked against the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the section's declared file range
    /// escapes the image.
    pub fn section_data(&self, shdr: &SectionHeader<'_>) -> Result<&'data [u8]> {
        let offset = usize::try_from(shdr.offset()?).map_err(|_| OutOfBounds)?;
        let size = usize::try_from(shdr.size()?).map_err(|_| OutOfBounds)?;
        let end = offset.checked_add(size).ok_or(OutOfBounds)?;

        self.data.get(offset..end).ok_or(OutOfBounds)
    }

    /// Resolve a section's name through the section name string table.
    ///
    /// Returns `None` if the image has no usable section name string table, the
    /// name offset escapes it, or the name is not valid UTF-8.
    #[must_use]
    pub fn section_name(&self, shdr: &SectionHeader<'_>) -> Option<&'data str> {
        let strings = self.extent_bytes(self.shstrtab?);
        let bytes = string_at(strings, u64::from(shdr.name_index().ok()?))?;
        std::str::from_utf8(bytes).ok()
    }

    /// Scan all loadable program header entries and compute the minimal physical
    /// address range covering them.
    ///
    /// The result is cached in the context (see [`ElfBinary::footprint`]) and
    /// consumed by the loader for destination address translation. `None` means
    /// the image has nothing to load; callers must treat that as a normal state.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a loadable segment's
    /// `paddr + memsz` overflows the address space.
    pub fn compute_footprint(&mut self) -> Result<Option<Footprint>> {
        let mut range: Option<Footprint> = None;

        for index in 0..self.phnum {
            let Some(phdr) = self.program_header(index) else {
                break;
            };
            if !phdr.is_load()? {
                continue;
            }

            let paddr = phdr.paddr()?;
            let memsz = phdr.memsz()?;
            let end = paddr.checked_add(memsz).ok_or_else(|| {
                self.fail(
                    DiagnosticCategory::ProgramHeaders,
                    malformed_error!(
                        "segment {} wraps the address space (paddr 0x{:x} memsz 0x{:x})",
                        index,
                        paddr,
                        memsz
                    ),
                )
            })?;

            self.diagnostics.info(
                DiagnosticCategory::ProgramHeaders,
                format!("phdr {}: paddr 0x{:x} memsz 0x{:x}", index, paddr, memsz),
            );

            range = Some(match range {
                None => Footprint { start: paddr, end },
                Some(current) => Footprint {
                    start: current.start.min(paddr),
                    end: current.end.max(end),
                },
            });
        }

        match range {
            Some(footprint) => self.diagnostics.info(
                DiagnosticCategory::ProgramHeaders,
                format!("memory: 0x{:x} -> 0x{:x}", footprint.start, footprint.end),
            ),
            None => self.diagnostics.info(
                DiagnosticCategory::ProgramHeaders,
                "no loadable segments".to_string(),
            ),
        }

        self.footprint = range;
        Ok(range)
    }

    /// The footprint computed by [`ElfBinary::compute_footprint`], if any.
    #[must_use]
    pub fn footprint(&self) -> Option<Footprint> {
        self.footprint
    }

    /// Returns `true` if a symbol table (with a valid string table) was located.
    #[must_use]
    pub fn has_symtab(&self) -> bool {
        self.symtab.is_some()
    }

    /// Number of entries in the located symbol table (0 if absent).
    #[must_use]
    pub fn symbol_count(&self) -> u64 {
        match self.symtab {
            Some(symtab) => symtab.entries.size / self.ident.sym_size() as u64,
            None => 0,
        }
    }

    /// Handle to the Nth symbol table entry, or `None` if absent/out of range.
    #[must_use]
    pub fn symbol(&self, index: u64) -> Option<Symbol<'data>> {
        let symtab = self.symtab?;
        let size = self.ident.sym_size() as u64;
        if index >= symtab.entries.size / size {
            return None;
        }

        let offset = size
            .checked_mul(index)
            .and_then(|at| at.checked_add(symtab.entries.offset))
            .and_then(|at| usize::try_from(at).ok())?;
        let entry = self
            .data
            .get(offset..offset.checked_add(self.ident.sym_size())?)?;

        Some(Symbol::new(entry, self.ident))
    }

    /// Look up a symbol by name and return its value.
    ///
    /// Scans the located symbol table for an entry whose name matches exactly.
    /// `Ok(None)` is the normal negative result, covering both "no symbol table"
    /// and "no such symbol"; an `Err` means the tables themselves could not be
    /// walked. Entries with a name offset escaping the string table are skipped.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if a symbol entry cannot be read.
    pub fn symbol_address(&self, name: &str) -> Result<Option<u64>> {
        let Some(symtab) = self.symtab else {
            self.diagnostics.info(
                DiagnosticCategory::Symbols,
                format!("no symbol table; \"{}\" cannot be resolved", name),
            );
            return Ok(None);
        };

        let strings = self.extent_bytes(symtab.strings);
        for index in 0..self.symbol_count() {
            let Some(symbol) = self.symbol(index) else {
                break;
            };

            let name_offset = u64::from(symbol.name_index()?);
            let Some(bytes) = string_at(strings, name_offset) else {
                self.diagnostics.warning(
                    DiagnosticCategory::Symbols,
                    format!(
                        "symbol {} has an out-of-range name offset 0x{:x}",
                        index, name_offset
                    ),
                );
                continue;
            };

            if bytes == name.as_bytes() {
                let value = symbol.value()?;
                self.diagnostics.info(
                    DiagnosticCategory::Symbols,
                    format!("symbol \"{}\" at 0x{:x}", name, value),
                );
                return Ok(Some(value));
            }
        }

        self.diagnostics.info(
            DiagnosticCategory::Symbols,
            format!("symbol \"{}\" not found", name),
        );
        Ok(None)
    }

    /// The diagnostics collector this context records into.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Install a different diagnostics collector.
    pub fn set_diagnostics(&mut self, diagnostics: Arc<Diagnostics>) {
        self.diagnostics = diagnostics;
    }

    /// Record an error with the diagnostics collector and hand it back for
    /// propagation.
    pub(crate) fn fail(&self, category: DiagnosticCategory, error: Error) -> Error {
        self.diagnostics.error(category, error.to_string());
        error
    }

    /// Returns `true` if the extent lies fully inside the image.
    pub(crate) fn extent_in_image(&self, extent: Extent) -> bool {
        match extent.offset.checked_add(extent.size) {
            Some(end) => end <= self.data.len() as u64,
            None => false,
        }
    }

    /// The bytes of a previously validated extent.
    pub(crate) fn extent_bytes(&self, extent: Extent) -> &'data [u8] {
        let start = usize::try_from(extent.offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(usize::try_from(extent.size).unwrap_or(usize::MAX));
        self.data.get(start..end).unwrap_or(&[])
    }
}

/// The NUL-terminated byte string at `offset` within a string table, or `None`
/// if the offset escapes the table or no terminator follows.
fn string_at(table: &[u8], offset: u64) -> Option<&[u8]> {
    let start = usize::try_from(offset).ok()?;
    let tail = table.get(start..)?;
    let end = tail.iter().position(|&byte| byte == 0)?;
    Some(&tail[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::ident::{ByteOrder, Class};
    use crate::test::{symbols_sections, ImageBuilder};
    use crate::Error;

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(ElfBinary::parse(&[]).unwrap_err(), Error::Empty));
        assert!(matches!(
            ElfBinary::parse(b"MZ\x90\x00not an elf").unwrap_err(),
            Error::NotElf
        ));
    }

    #[test]
    fn parse_rejects_truncated_header() {
        let image = ImageBuilder::new(Class::Elf64, ByteOrder::Little).build();
        assert!(matches!(
            ElfBinary::parse(&image[..32]).unwrap_err(),
            Error::Malformed { .. }
        ));
    }

    #[test]
    fn parse_minimal_image() {
        let image = ImageBuilder::new(Class::Elf32, ByteOrder::Big).build();
        let binary = ElfBinary::parse(&image).unwrap();

        assert_eq!(binary.ident().class, Class::Elf32);
        assert_eq!(binary.ident().order, ByteOrder::Big);
        assert_eq!(binary.program_header_count(), 0);
        assert!(binary.program_header(0).is_none());
        assert!(!binary.has_symtab());
    }

    #[test]
    fn parse_rejects_phdr_table_overflow() {
        let mut image = ImageBuilder::new(Class::Elf64, ByteOrder::Little)
            .segment(0x1000, 16, vec![0xAA; 16])
            .build();

        // Push e_phnum to a count whose table cannot fit the image
        let phnum_at = 56;
        image[phnum_at..phnum_at + 2].copy_from_slice(&u16::to_le_bytes(0xFFFF));

        let diagnostics = Arc::new(Diagnostics::new());
        let result = ElfBinary::parse_with_diagnostics(&image, diagnostics.clone());
        assert!(matches!(result.unwrap_err(), Error::Malformed { .. }));
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn parse_rejects_undersized_entries() {
        let mut image = ImageBuilder::new(Class::Elf64, ByteOrder::Little)
            .segment(0x1000, 16, vec![0xAA; 16])
            .build();

        // Shrink e_phentsize below the natural ELF64 entry size
        let phentsize_at = 54;
        image[phentsize_at..phentsize_at + 2].copy_from_slice(&u16::to_le_bytes(8));

        assert!(matches!(
            ElfBinary::parse(&image).unwrap_err(),
            Error::Malformed { .. }
        ));
    }

    #[test]
    fn footprint_spans_loadable_segments() {
        let image = ImageBuilder::new(Class::Elf64, ByteOrder::Little)
            .segment(0x20_0000, 0x100, vec![1, 2, 3, 4])
            .segment(0x10_0000, 0x80, vec![5, 6])
            .non_loadable(vec![0xEE; 8])
            .build();

        let mut binary = ElfBinary::parse(&image).unwrap();
        let footprint = binary.compute_footprint().unwrap().unwrap();

        assert_eq!(footprint.start, 0x10_0000);
        assert_eq!(footprint.end, 0x20_0100);
        assert_eq!(footprint.len(), 0x10_0100);
        assert_eq!(binary.footprint(), Some(footprint));
    }

    #[test]
    fn footprint_absent_without_loadable_segments() {
        let image = ImageBuilder::new(Class::Elf32, ByteOrder::Little)
            .non_loadable(vec![0xEE; 8])
            .build();

        let mut binary = ElfBinary::parse(&image).unwrap();
        assert_eq!(binary.compute_footprint().unwrap(), None);
        assert_eq!(binary.footprint(), None);
    }

    #[test]
    fn symtab_located_and_resolved() {
        for (class, order) in [
            (Class::Elf32, ByteOrder::Little),
            (Class::Elf64, ByteOrder::Little),
            (Class::Elf64, ByteOrder::Big),
        ] {
            let (symtab, strtab) = symbols_sections(class, order, &[("foo", 0x1000), ("bar", 0x2000)]);
            let image = ImageBuilder::new(class, order)
                .section(SHT_SYMTAB, 1, symtab)
                .section(SHT_STRTAB, 0, strtab)
                .build();

            let binary = ElfBinary::parse(&image).unwrap();
            assert!(binary.has_symtab());
            assert_eq!(binary.symbol_count(), 2);
            assert_eq!(binary.symbol_address("foo").unwrap(), Some(0x1000));
            assert_eq!(binary.symbol_address("bar").unwrap(), Some(0x2000));
            assert_eq!(binary.symbol_address("baz").unwrap(), None);
        }
    }

    #[test]
    fn symtab_with_invalid_link_is_discarded() {
        let (symtab, _) = symbols_sections(
            Class::Elf64,
            ByteOrder::Little,
            &[("orphan", 0xDEAD)],
        );
        // Link points past the section table: symbol lookup degrades to absent
        let image = ImageBuilder::new(Class::Elf64, ByteOrder::Little)
            .section(SHT_SYMTAB, 7, symtab)
            .build();

        let diagnostics = Arc::new(Diagnostics::verbose());
        let binary = ElfBinary::parse_with_diagnostics(&image, diagnostics.clone()).unwrap();

        assert!(!binary.has_symtab());
        assert_eq!(binary.symbol_address("orphan").unwrap(), None);
        assert!(!diagnostics.has_errors());
        assert!(diagnostics
            .iter()
            .any(|entry| entry.message.contains("invalid section")));
    }

    #[test]
    fn string_table_walk() {
        let table = b"\0first\0second\0";
        assert_eq!(string_at(table, 0), Some(&b""[..]));
        assert_eq!(string_at(table, 1), Some(&b"first"[..]));
        assert_eq!(string_at(table, 7), Some(&b"second"[..]));
        assert_eq!(string_at(table, 100), None);
        // Unterminated tail
        assert_eq!(string_at(b"abc", 0), None);
    }
}
