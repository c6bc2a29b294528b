//! Header handle types for the ELF file header, program headers, section headers
//! and symbol table entries.
//!
//! A handle pairs a pre-validated entry slice with the image's [`Ident`]; every
//! field getter goes through the dual-width accessor, so each record type is
//! written once and works for both classes and both byte orders. Handles are only
//! ever constructed by [`crate::elf::ElfBinary`] after the containing table has
//! been bounds-checked, which is what makes the per-field reads infallible in
//! practice (the `Result` they return guards against misuse, not expected input).

use crate::{elf::ident::Ident, Result};

use bitflags::bitflags;

/// Program header type tag marking a loadable segment.
pub const PT_LOAD: u32 = 1;

/// Section header type tag marking a symbol table.
pub const SHT_SYMTAB: u32 = 2;

/// Section header type tag marking a string table.
pub const SHT_STRTAB: u32 = 3;

/// The kind of a program header entry, decoded from its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SegmentKind {
    /// Unused entry
    Null,
    /// Loadable segment: copied into memory by the loader
    Load,
    /// Dynamic linking information
    Dynamic,
    /// Interpreter path
    Interp,
    /// Auxiliary notes
    Note,
    /// Any other type tag
    Other,
}

impl From<u32> for SegmentKind {
    fn from(tag: u32) -> SegmentKind {
        match tag {
            0 => SegmentKind::Null,
            1 => SegmentKind::Load,
            2 => SegmentKind::Dynamic,
            3 => SegmentKind::Interp,
            4 => SegmentKind::Note,
            _ => SegmentKind::Other,
        }
    }
}

/// The kind of a section header entry, decoded from its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SectionKind {
    /// Unused entry
    Null,
    /// Program-defined contents
    ProgBits,
    /// Symbol table: travels into the embedded symbol table image
    SymTab,
    /// String table: travels into the embedded symbol table image
    StrTab,
    /// Occupies no file space (bss-style)
    NoBits,
    /// Any other type tag
    Other,
}

impl From<u32> for SectionKind {
    fn from(tag: u32) -> SectionKind {
        match tag {
            0 => SectionKind::Null,
            1 => SectionKind::ProgBits,
            SHT_SYMTAB => SectionKind::SymTab,
            SHT_STRTAB => SectionKind::StrTab,
            8 => SectionKind::NoBits,
            _ => SectionKind::Other,
        }
    }
}

bitflags! {
    /// Segment permission flags from a program header's `p_flags` field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentFlags: u32 {
        /// Segment is executable
        const EXECUTE = 0b001;
        /// Segment is writable
        const WRITE = 0b010;
        /// Segment is readable
        const READ = 0b100;
    }
}

/// Handle to the ELF file header at the start of a validated image.
///
/// Locates every other table in the image. Obtained via
/// [`crate::elf::ElfBinary::header`].
#[derive(Debug, Clone, Copy)]
pub struct FileHeader<'data> {
    data: &'data [u8],
    ident: Ident,
}

impl<'data> FileHeader<'data> {
    pub(crate) fn new(data: &'data [u8], ident: Ident) -> FileHeader<'data> {
        FileHeader { data, ident }
    }

    /// The image's decoded identification (class and byte order).
    #[must_use]
    pub fn ident(&self) -> Ident {
        self.ident
    }

    /// Entry point address (`e_entry`).
    pub fn entry(&self) -> Result<u64> {
        self.ident.word(self.data, 24, 24)
    }

    /// File offset of the program header table (`e_phoff`).
    pub fn phoff(&self) -> Result<u64> {
        self.ident.word(self.data, 28, 32)
    }

    /// File offset of the section header table (`e_shoff`).
    pub fn shoff(&self) -> Result<u64> {
        self.ident.word(self.data, 32, 40)
    }

    /// Declared size of this header (`e_ehsize`).
    pub fn ehsize(&self) -> Result<u16> {
        self.ident.half(self.data, 40, 52)
    }

    /// Declared size of one program header entry (`e_phentsize`).
    pub fn phentsize(&self) -> Result<u16> {
        self.ident.half(self.data, 42, 54)
    }

    /// Number of program header entries (`e_phnum`).
    pub fn phnum(&self) -> Result<u16> {
        self.ident.half(self.data, 44, 56)
    }

    /// Declared size of one section header entry (`e_shentsize`).
    pub fn shentsize(&self) -> Result<u16> {
        self.ident.half(self.data, 46, 58)
    }

    /// Number of section header entries (`e_shnum`).
    pub fn shnum(&self) -> Result<u16> {
        self.ident.half(self.data, 48, 60)
    }

    /// Section header table index of the section name string table (`e_shstrndx`).
    pub fn shstrndx(&self) -> Result<u16> {
        self.ident.half(self.data, 50, 62)
    }
}

/// Handle to one program header entry, describing a segment of the image.
///
/// Obtained via [`crate::elf::ElfBinary::program_header`]; the backing slice is
/// guaranteed to cover a full entry.
#[derive(Debug, Clone, Copy)]
pub struct ProgramHeader<'data> {
    data: &'data [u8],
    ident: Ident,
}

impl<'data> ProgramHeader<'data> {
    pub(crate) fn new(data: &'data [u8], ident: Ident) -> ProgramHeader<'data> {
        ProgramHeader { data, ident }
    }

    /// Raw type tag (`p_type`).
    pub fn type_tag(&self) -> Result<u32> {
        self.ident.word32(self.data, 0, 0)
    }

    /// Decoded segment kind.
    pub fn kind(&self) -> Result<SegmentKind> {
        Ok(SegmentKind::from(self.type_tag()?))
    }

    /// Returns `true` if this segment must be copied into memory at load time.
    pub fn is_load(&self) -> Result<bool> {
        Ok(self.type_tag()? == PT_LOAD)
    }

    /// File offset of the segment's bytes (`p_offset`).
    pub fn offset(&self) -> Result<u64> {
        self.ident.word(self.data, 4, 8)
    }

    /// Virtual load address (`p_vaddr`).
    pub fn vaddr(&self) -> Result<u64> {
        self.ident.word(self.data, 8, 16)
    }

    /// Physical load address (`p_paddr`); the loader places segments by this.
    pub fn paddr(&self) -> Result<u64> {
        self.ident.word(self.data, 12, 24)
    }

    /// Number of bytes the segment occupies in the file (`p_filesz`).
    pub fn filesz(&self) -> Result<u64> {
        self.ident.word(self.data, 16, 32)
    }

    /// Number of bytes the segment occupies in memory (`p_memsz`); anything past
    /// `filesz` is zero-filled by the loader.
    pub fn memsz(&self) -> Result<u64> {
        self.ident.word(self.data, 20, 40)
    }

    /// Segment permission flags (`p_flags`).
    pub fn flags(&self) -> Result<SegmentFlags> {
        Ok(SegmentFlags::from_bits_truncate(self.ident.word32(
            self.data,
            24,
            4,
        )?))
    }

    /// Requested alignment (`p_align`).
    pub fn align(&self) -> Result<u64> {
        self.ident.word(self.data, 28, 48)
    }
}

/// Handle to one section header entry.
///
/// Obtained via [`crate::elf::ElfBinary::section_header`].
#[derive(Debug, Clone, Copy)]
pub struct SectionHeader<'data> {
    data: &'data [u8],
    ident: Ident,
}

impl<'data> SectionHeader<'data> {
    pub(crate) fn new(data: &'data [u8], ident: Ident) -> SectionHeader<'data> {
        SectionHeader { data, ident }
    }

    /// Offset of this section's name within the section name string table
    /// (`sh_name`).
    pub fn name_index(&self) -> Result<u32> {
        self.ident.word32(self.data, 0, 0)
    }

    /// Raw type tag (`sh_type`).
    pub fn type_tag(&self) -> Result<u32> {
        self.ident.word32(self.data, 4, 4)
    }

    /// Decoded section kind.
    pub fn kind(&self) -> Result<SectionKind> {
        Ok(SectionKind::from(self.type_tag()?))
    }

    /// Load address (`sh_addr`).
    pub fn addr(&self) -> Result<u64> {
        self.ident.word(self.data, 12, 16)
    }

    /// File offset of the section's bytes (`sh_offset`).
    pub fn offset(&self) -> Result<u64> {
        self.ident.word(self.data, 16, 24)
    }

    /// Size of the section in bytes (`sh_size`).
    pub fn size(&self) -> Result<u64> {
        self.ident.word(self.data, 20, 32)
    }

    /// Index of an associated section (`sh_link`); for a symbol table this names
    /// its string table.
    pub fn link(&self) -> Result<u32> {
        self.ident.word32(self.data, 24, 40)
    }

    /// Size of one entry for table-like sections (`sh_entsize`).
    pub fn entsize(&self) -> Result<u64> {
        self.ident.word(self.data, 36, 56)
    }
}

/// Handle to one symbol table entry.
///
/// Obtained via [`crate::elf::ElfBinary::symbol`].
#[derive(Debug, Clone, Copy)]
pub struct Symbol<'data> {
    data: &'data [u8],
    ident: Ident,
}

impl<'data> Symbol<'data> {
    pub(crate) fn new(data: &'data [u8], ident: Ident) -> Symbol<'data> {
        Symbol { data, ident }
    }

    /// Offset of this symbol's name within the associated string table
    /// (`st_name`).
    pub fn name_index(&self) -> Result<u32> {
        self.ident.word32(self.data, 0, 0)
    }

    /// The symbol's value, typically an address (`st_value`).
    pub fn value(&self) -> Result<u64> {
        self.ident.word(self.data, 4, 8)
    }

    /// The symbol's size in bytes (`st_size`).
    pub fn size(&self) -> Result<u64> {
        self.ident.word(self.data, 8, 16)
    }
}
