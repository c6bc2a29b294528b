//! The embedded symbol table: a condensed, relocated copy of the image's headers
//! and symbol/string sections placed just past the loaded binary.
//!
//! Kernel debuggers and crash tooling want to resolve symbols of a loaded image
//! without access to the original file. To serve them, the loader can append a
//! minimal self-contained ELF blob behind the loaded segments:
//!
//! ```text
//! [u32 size][file header (patched)][section header table][strtab/symtab bytes...]
//! ```
//!
//! The copied file header has its program header fields zeroed (no segments travel
//! with the blob) and its section header offset pointed at the immediately
//! following table copy; each copied string/symbol section's header is rewritten
//! so its offset is relative to the embedded header rather than the original
//! image. The leading `u32` (in the image's byte order) records the number of
//! bytes that follow it.
//!
//! The work happens in two passes so the caller can size its allocation before
//! memory is committed: [`ElfBinary::plan_embedded_symtab`] computes the range the
//! blob will occupy, and the materialization runs automatically at the end of
//! [`ElfBinary::load`], writing exactly the planned number of bytes. Both passes
//! share one section predicate, which is what keeps them in agreement.

use crate::{
    elf::{
        binary::{ElfBinary, Extent},
        diagnostics::DiagnosticCategory,
        headers::{SectionHeader, SHT_STRTAB, SHT_SYMTAB},
        loader::{CopyPolicy, Region},
    },
    Error::OutOfBounds,
    Result,
};

/// Size of the length prefix leading the embedded blob.
const SIZE_PREFIX: u64 = 4;

/// The planned location of the embedded symbol table, in the same physical
/// address space as the load footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedSymtab {
    /// First address of the blob (aligned to the class's natural alignment)
    pub start: u64,
    /// One past the last address of the blob
    pub end: u64,
}

impl EmbeddedSymtab {
    /// Total number of bytes the blob occupies, including the size prefix.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` if the planned blob occupies no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl<'data> ElfBinary<'data> {
    /// Compute the space an embedded symbol table copy will need, starting at or
    /// after `proposed_start`.
    ///
    /// Callable before the destination allocation is finalized, so the caller can
    /// include the result in its sizing. The plan is cached in the context and
    /// consumed by [`ElfBinary::load`], which materializes the blob after the
    /// segments. `Ok(None)` means no symbol table was located and embedding is
    /// disabled entirely.
    ///
    /// # Arguments
    /// * `proposed_start` - Lowest acceptable address for the blob, typically the
    ///   end of the load footprint; rounded up to the class's natural alignment
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the image's declared header size is
    /// inconsistent or the accumulated size overflows.
    pub fn plan_embedded_symtab(&mut self, proposed_start: u64) -> Result<Option<EmbeddedSymtab>> {
        if self.symtab.is_none() {
            self.embedded = None;
            return Ok(None);
        }

        let header = self.header();
        let ehsize = u64::from(header.ehsize()?);
        if ehsize < self.ident.ehdr_size() as u64 || ehsize > self.data.len() as u64 {
            return Err(self.fail(
                DiagnosticCategory::Symbols,
                malformed_error!("file header declares an implausible size {}", ehsize),
            ));
        }

        let start = self.ident.round_up(proposed_start)?;

        // Size prefix, the patched file header and the copied section header table
        let table = self.shentsize.checked_mul(self.shnum).ok_or_else(|| {
            self.fail(
                DiagnosticCategory::Symbols,
                malformed_error!("section header table size overflows"),
            )
        })?;
        let mut size = SIZE_PREFIX
            .checked_add(ehsize)
            .and_then(|size| size.checked_add(table))
            .ok_or_else(|| {
                self.fail(
                    DiagnosticCategory::Symbols,
                    malformed_error!("embedded symbol table size overflows"),
                )
            })?;
        size = self.ident.round_up(size)?;

        // The string and symbol table payloads
        for index in 0..self.shnum {
            let Some(shdr) = self.section_header(index) else {
                break;
            };
            if !self.embeds_section(&shdr)? {
                continue;
            }

            size = size.checked_add(shdr.size()?).ok_or_else(|| {
                self.fail(
                    DiagnosticCategory::Symbols,
                    malformed_error!("embedded symbol table size overflows"),
                )
            })?;
            size = self.ident.round_up(size)?;
        }

        let end = start.checked_add(size).ok_or_else(|| {
            self.fail(
                DiagnosticCategory::Symbols,
                malformed_error!("embedded symbol table does not fit the address space"),
            )
        })?;

        let planned = EmbeddedSymtab { start, end };
        self.embedded = Some(planned);
        self.diagnostics.info(
            DiagnosticCategory::Symbols,
            format!("embedded symbol table: 0x{:x} -> 0x{:x}", start, end),
        );

        Ok(Some(planned))
    }

    /// The plan produced by [`ElfBinary::plan_embedded_symtab`], if any.
    #[must_use]
    pub fn embedded_symtab(&self) -> Option<EmbeddedSymtab> {
        self.embedded
    }

    /// The single predicate deciding which sections travel into the embedded
    /// blob: string/symbol tables whose bytes actually lie inside the image.
    /// Sizing and materialization both go through here, which guarantees the
    /// two passes agree byte-for-byte.
    fn embeds_section(&self, shdr: &SectionHeader<'_>) -> Result<bool> {
        let tag = shdr.type_tag()?;
        if tag != SHT_SYMTAB && tag != SHT_STRTAB {
            return Ok(false);
        }

        Ok(self.extent_in_image(Extent {
            offset: shdr.offset()?,
            size: shdr.size()?,
        }))
    }

    /// Materialize the planned blob through the destination region. Called by
    /// [`ElfBinary::load`] after the segments; a no-op if nothing was planned.
    pub(crate) fn write_embedded_symtab<R: Region + ?Sized>(
        &self,
        region: &mut R,
        policy: CopyPolicy,
    ) -> Result<()> {
        let Some(planned) = self.embedded else {
            return Ok(());
        };
        let Some(footprint) = self.footprint else {
            self.diagnostics.warning(
                DiagnosticCategory::Symbols,
                "embedded symbol table planned but no load footprint; skipped".to_string(),
            );
            return Ok(());
        };

        let blob = self.build_embedded_symtab(planned)?;

        let delta = planned.start.checked_sub(footprint.start).ok_or_else(|| {
            self.fail(
                DiagnosticCategory::Symbols,
                malformed_error!(
                    "embedded symbol table at 0x{:x} precedes the load footprint",
                    planned.start
                ),
            )
        })?;
        let dest = region.base().checked_add(delta).ok_or_else(|| {
            self.fail(
                DiagnosticCategory::Symbols,
                malformed_error!("embedded symbol table destination address overflows"),
            )
        })?;

        if policy == CopyPolicy::Defensive && !region.contains(dest, blob.len() as u64) {
            return Err(self.fail(
                DiagnosticCategory::Symbols,
                malformed_error!(
                    "embedded symbol table (0x{:x} bytes at 0x{:x}) does not fit the destination region",
                    blob.len(),
                    dest
                ),
            ));
        }

        region
            .write(dest, &blob)
            .map_err(|error| self.fail(DiagnosticCategory::Symbols, error))?;

        self.diagnostics.info(
            DiagnosticCategory::Symbols,
            format!("embedded symbol table written at 0x{:x}", dest),
        );

        Ok(())
    }

    /// Build the blob in memory, to exactly the planned size.
    fn build_embedded_symtab(&self, planned: EmbeddedSymtab) -> Result<Vec<u8>> {
        let total = usize::try_from(planned.len()).map_err(|_| OutOfBounds)?;
        let mut blob = vec![0u8; total];

        let header = self.header();
        let ehsize = usize::from(header.ehsize()?);

        // File header copy with the program header fields zeroed (no program
        // headers travel with the blob) and the section header table pointed at
        // the copy that follows immediately.
        let header_at = SIZE_PREFIX as usize;
        let source = self.data.get(..ehsize).ok_or(OutOfBounds)?;
        blob.get_mut(header_at..header_at + ehsize)
            .ok_or(OutOfBounds)?
            .copy_from_slice(source);
        {
            let copy = &mut blob[header_at..];
            self.ident.store_word(copy, 28, 32, 0)?; // e_phoff
            self.ident.store_word(copy, 32, 40, ehsize as u64)?; // e_shoff
            self.ident.store_half(copy, 42, 54, 0)?; // e_phentsize
            self.ident.store_half(copy, 44, 56, 0)?; // e_phnum
        }

        // Section header table copy
        let table_len = usize::try_from(self.shentsize * self.shnum).map_err(|_| OutOfBounds)?;
        let table_at = header_at + ehsize;
        let table_start = usize::try_from(self.shoff).map_err(|_| OutOfBounds)?;
        let table_src = self
            .data
            .get(table_start..table_start + table_len)
            .ok_or(OutOfBounds)?;
        blob.get_mut(table_at..table_at + table_len)
            .ok_or(OutOfBounds)?
            .copy_from_slice(table_src);

        let mut cursor = self
            .ident
            .round_up(SIZE_PREFIX + ehsize as u64 + table_len as u64)?;

        // String and symbol table payloads, with the copied headers rebased
        for index in 0..self.shnum {
            let Some(shdr) = self.section_header(index) else {
                break;
            };
            if !self.embeds_section(&shdr)? {
                continue;
            }

            let source = self.section_data(&shdr)?;
            let at = usize::try_from(cursor).map_err(|_| OutOfBounds)?;
            blob.get_mut(at..at + source.len())
                .ok_or(OutOfBounds)?
                .copy_from_slice(source);

            // Mangled to be based on the embedded header location
            let entry_at = table_at
                + usize::try_from(self.shentsize * index).map_err(|_| OutOfBounds)?;
            let entry = blob
                .get_mut(entry_at..entry_at + self.ident.shdr_size())
                .ok_or(OutOfBounds)?;
            self.ident.store_word(entry, 16, 24, cursor - SIZE_PREFIX)?; // sh_offset

            self.diagnostics.info(
                DiagnosticCategory::Symbols,
                format!(
                    "shdr {} copied into the embedded image at 0x{:x}",
                    index, cursor
                ),
            );

            cursor = self
                .ident
                .round_up(cursor.checked_add(source.len() as u64).ok_or(OutOfBounds)?)?;
        }

        debug_assert_eq!(cursor, planned.len());

        // The prefix records how many bytes follow it
        let content = u32::try_from(cursor - SIZE_PREFIX).map_err(|_| {
            malformed_error!("embedded symbol table exceeds the size prefix range")
        })?;
        self.ident.store_word32(&mut blob, 0, 0, content)?;

        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::binary::ElfBinary;
    use crate::elf::ident::{ByteOrder, Class};
    use crate::elf::loader::SliceRegion;
    use crate::test::{symbols_sections, ImageBuilder};

    fn image_with_symbols(class: Class, order: ByteOrder) -> Vec<u8> {
        let (symtab, strtab) =
            symbols_sections(class, order, &[("start", 0x10_0000), ("panic", 0x10_0040)]);
        ImageBuilder::new(class, order)
            .segment(0x10_0000, 64, (1..=32).collect())
            .section(SHT_SYMTAB, 1, symtab)
            .section(SHT_STRTAB, 0, strtab)
            .build()
    }

    #[test]
    fn plan_requires_a_symbol_table() {
        let image = ImageBuilder::new(Class::Elf64, ByteOrder::Little)
            .segment(0x1000, 16, vec![0u8; 16])
            .build();

        let mut binary = ElfBinary::parse(&image).unwrap();
        assert_eq!(binary.plan_embedded_symtab(0x2000).unwrap(), None);
        assert_eq!(binary.embedded_symtab(), None);
    }

    #[test]
    fn plan_aligns_and_accumulates() {
        let image = image_with_symbols(Class::Elf64, ByteOrder::Little);
        let mut binary = ElfBinary::parse(&image).unwrap();

        let planned = binary.plan_embedded_symtab(0x10_0041).unwrap().unwrap();
        // Start is rounded up to the ELF64 natural alignment
        assert_eq!(planned.start, 0x10_0048);
        assert!(planned.len() > 0);
        assert_eq!(planned.len() % 8, 0);
        assert_eq!(binary.embedded_symtab(), Some(planned));
    }

    #[test]
    fn materialization_matches_the_plan() {
        for (class, order) in [
            (Class::Elf32, ByteOrder::Little),
            (Class::Elf64, ByteOrder::Little),
            (Class::Elf64, ByteOrder::Big),
        ] {
            let image = image_with_symbols(class, order);
            let mut binary = ElfBinary::parse(&image).unwrap();

            let footprint = binary.compute_footprint().unwrap().unwrap();
            let planned = binary.plan_embedded_symtab(footprint.end).unwrap().unwrap();

            let total = (planned.end - footprint.start) as usize;
            let mut mem = vec![0xEE_u8; total];
            let mut region = SliceRegion::new(footprint.start, &mut mem);
            binary.load(&mut region, CopyPolicy::Defensive).unwrap();

            let blob_at = (planned.start - footprint.start) as usize;
            let blob = &mem[blob_at..blob_at + planned.len() as usize];

            // The prefix records the byte count that follows it
            let prefix = match order {
                ByteOrder::Little => u32::from_le_bytes(blob[..4].try_into().unwrap()),
                ByteOrder::Big => u32::from_be_bytes(blob[..4].try_into().unwrap()),
            };
            assert_eq!(u64::from(prefix), planned.len() - 4);
        }
    }

    #[test]
    fn embedded_blob_is_a_parsable_image() {
        let image = image_with_symbols(Class::Elf64, ByteOrder::Little);
        let mut binary = ElfBinary::parse(&image).unwrap();

        let footprint = binary.compute_footprint().unwrap().unwrap();
        let planned = binary.plan_embedded_symtab(footprint.end).unwrap().unwrap();

        let total = (planned.end - footprint.start) as usize;
        let mut mem = vec![0u8; total];
        let mut region = SliceRegion::new(footprint.start, &mut mem);
        binary.load(&mut region, CopyPolicy::Defensive).unwrap();

        // Past the 4-byte prefix sits a self-contained ELF image whose rebased
        // tables resolve the same symbols as the original
        let blob_at = (planned.start - footprint.start) as usize + 4;
        let embedded = ElfBinary::parse(&mem[blob_at..]).unwrap();

        assert_eq!(embedded.header().phnum().unwrap(), 0);
        assert_eq!(embedded.header().phoff().unwrap(), 0);
        assert!(embedded.has_symtab());
        assert_eq!(embedded.symbol_address("start").unwrap(), Some(0x10_0000));
        assert_eq!(embedded.symbol_address("panic").unwrap(), Some(0x10_0040));
        assert_eq!(embedded.symbol_address("missing").unwrap(), None);
    }

    #[test]
    fn load_skips_embedding_when_not_planned() {
        let image = image_with_symbols(Class::Elf64, ByteOrder::Little);
        let mut binary = ElfBinary::parse(&image).unwrap();

        let footprint = binary.compute_footprint().unwrap().unwrap();
        let mut mem = vec![0xEE_u8; footprint.len() as usize];
        let mut region = SliceRegion::new(footprint.start, &mut mem);
        binary.load(&mut region, CopyPolicy::Defensive).unwrap();

        // Only the segment was written: payload then zero fill
        assert_eq!(mem[0], 1);
        assert_eq!(&mem[32..64], &[0u8; 32]);
    }
}
