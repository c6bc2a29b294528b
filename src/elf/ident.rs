//! ELF identification and the dual-width field accessor.
//!
//! The first sixteen bytes of every ELF image describe how the rest of it must be
//! read: the magic signature, the class (32-bit or 64-bit layouts) and the byte
//! order. [`Ident`] captures that decision once, at validation time, and every
//! field access anywhere in the crate is routed through its accessor methods.
//!
//! The two classes lay out structurally identical records at different offsets and
//! widths. Rather than writing every header type twice, each accessor takes the
//! field's offset in *both* layouts and selects by the detected class, decoding per
//! the detected byte order and widening narrow fields to `u64`. This is the single
//! mechanism that lets the validator, the locators, the footprint calculator, the
//! loader and the embedder each exist exactly once.
//!
//! # Example
//!
//! ```rust,ignore
//! // p_paddr sits at offset 12 in an ELF32 program header and 24 in an ELF64 one.
//! let paddr = ident.word(entry, 12, 24)?;
//! ```

use crate::{
    file::io::{read_be_at, read_le_at, write_be_at, write_le_at},
    Error::NotElf,
    Result,
};

/// The ELF magic signature every image must start with.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Number of identification bytes at the start of the file header.
pub const EI_NIDENT: usize = 16;

/// Offset of the class byte within the identification bytes.
const EI_CLASS: usize = 4;
/// Offset of the byte-order byte within the identification bytes.
const EI_DATA: usize = 5;

const ELFCLASS32: u8 = 1;
const ELFCLASS64: u8 = 2;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;

/// The class of an ELF image: which of the two binary layouts its records use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Class {
    /// 32-bit layouts (`Elf32_Ehdr` and friends)
    #[strum(serialize = "ELF32")]
    Elf32,
    /// 64-bit layouts (`Elf64_Ehdr` and friends)
    #[strum(serialize = "ELF64")]
    Elf64,
}

/// The byte order the image's multi-byte fields are encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ByteOrder {
    /// Least significant byte first
    #[strum(serialize = "little-endian")]
    Little,
    /// Most significant byte first
    #[strum(serialize = "big-endian")]
    Big,
}

/// The decoded identification of an ELF image: class and byte order.
///
/// Detected once by [`Ident::parse`] during validation and cached in the parse
/// context; afterwards it acts as the dual-width accessor through which all header
/// fields are read and (for the embedder's rebasing writes) stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    /// Which of the two record layouts the image uses
    pub class: Class,
    /// How multi-byte fields are encoded
    pub order: ByteOrder,
}

impl Ident {
    /// Decode the identification bytes at the start of an image.
    ///
    /// # Arguments
    /// * `data` - The raw image, starting at its first byte
    ///
    /// # Errors
    /// Returns [`crate::Error::NotElf`] if the image is shorter than the
    /// identification block or does not carry the magic signature, and
    /// [`crate::Error::Malformed`] for an unsupported class or byte-order byte.
    pub fn parse(data: &[u8]) -> Result<Ident> {
        if data.len() < EI_NIDENT || data[..4] != ELF_MAGIC {
            return Err(NotElf);
        }

        let class = match data[EI_CLASS] {
            ELFCLASS32 => Class::Elf32,
            ELFCLASS64 => Class::Elf64,
            value => return Err(malformed_error!("unsupported ELF class {}", value)),
        };

        let order = match data[EI_DATA] {
            ELFDATA2LSB => ByteOrder::Little,
            ELFDATA2MSB => ByteOrder::Big,
            value => return Err(malformed_error!("unsupported ELF byte order {}", value)),
        };

        Ok(Ident { class, order })
    }

    /// Returns `true` if the image uses the 64-bit layouts.
    #[must_use]
    pub fn is_64bit(&self) -> bool {
        self.class == Class::Elf64
    }

    /// Natural size of the file header for this class.
    pub(crate) fn ehdr_size(&self) -> usize {
        match self.class {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    /// Natural size of one program header entry for this class.
    pub(crate) fn phdr_size(&self) -> usize {
        match self.class {
            Class::Elf32 => 32,
            Class::Elf64 => 56,
        }
    }

    /// Natural size of one section header entry for this class.
    pub(crate) fn shdr_size(&self) -> usize {
        match self.class {
            Class::Elf32 => 40,
            Class::Elf64 => 64,
        }
    }

    /// Natural size of one symbol table entry for this class.
    pub(crate) fn sym_size(&self) -> usize {
        match self.class {
            Class::Elf32 => 16,
            Class::Elf64 => 24,
        }
    }

    /// Natural alignment of this class, used when laying out the embedded
    /// symbol table.
    pub(crate) fn align(&self) -> u64 {
        match self.class {
            Class::Elf32 => 4,
            Class::Elf64 => 8,
        }
    }

    /// Round `value` up to the natural alignment of this class.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the rounding would overflow.
    pub(crate) fn round_up(&self, value: u64) -> Result<u64> {
        let mask = self.align() - 1;
        value
            .checked_add(mask)
            .map(|rounded| rounded & !mask)
            .ok_or_else(|| malformed_error!("alignment rounding overflows 0x{:x}", value))
    }

    fn select(&self, off32: usize, off64: usize) -> usize {
        match self.class {
            Class::Elf32 => off32,
            Class::Elf64 => off64,
        }
    }

    /// Read a half-word field (`u16` in both layouts).
    pub(crate) fn half(&self, data: &[u8], off32: usize, off64: usize) -> Result<u16> {
        let mut offset = self.select(off32, off64);
        match self.order {
            ByteOrder::Little => read_le_at(data, &mut offset),
            ByteOrder::Big => read_be_at(data, &mut offset),
        }
    }

    /// Read a field that is `u32` wide in both layouts.
    pub(crate) fn word32(&self, data: &[u8], off32: usize, off64: usize) -> Result<u32> {
        let mut offset = self.select(off32, off64);
        match self.order {
            ByteOrder::Little => read_le_at(data, &mut offset),
            ByteOrder::Big => read_be_at(data, &mut offset),
        }
    }

    /// Read a natural-word field: `u32` in the 32-bit layout (widened), `u64` in
    /// the 64-bit layout.
    pub(crate) fn word(&self, data: &[u8], off32: usize, off64: usize) -> Result<u64> {
        match self.class {
            Class::Elf32 => self.word32(data, off32, off64).map(u64::from),
            Class::Elf64 => {
                let mut offset = off64;
                match self.order {
                    ByteOrder::Little => read_le_at(data, &mut offset),
                    ByteOrder::Big => read_be_at(data, &mut offset),
                }
            }
        }
    }

    /// Store a half-word field (`u16` in both layouts).
    pub(crate) fn store_half(
        &self,
        data: &mut [u8],
        off32: usize,
        off64: usize,
        value: u16,
    ) -> Result<()> {
        let mut offset = self.select(off32, off64);
        match self.order {
            ByteOrder::Little => write_le_at(data, &mut offset, value),
            ByteOrder::Big => write_be_at(data, &mut offset, value),
        }
    }

    /// Store a field that is `u32` wide in both layouts.
    pub(crate) fn store_word32(
        &self,
        data: &mut [u8],
        off32: usize,
        off64: usize,
        value: u32,
    ) -> Result<()> {
        let mut offset = self.select(off32, off64);
        match self.order {
            ByteOrder::Little => write_le_at(data, &mut offset, value),
            ByteOrder::Big => write_be_at(data, &mut offset, value),
        }
    }

    /// Store a natural-word field, narrowing to `u32` for the 32-bit layout.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the value does not fit the narrow
    /// field.
    pub(crate) fn store_word(
        &self,
        data: &mut [u8],
        off32: usize,
        off64: usize,
        value: u64,
    ) -> Result<()> {
        match self.class {
            Class::Elf32 => {
                let narrow = u32::try_from(value).map_err(|_| {
                    malformed_error!("value 0x{:x} does not fit a 32-bit field", value)
                })?;
                self.store_word32(data, off32, off64, narrow)
            }
            Class::Elf64 => {
                let mut offset = off64;
                match self.order {
                    ByteOrder::Little => write_le_at(data, &mut offset, value),
                    ByteOrder::Big => write_be_at(data, &mut offset, value),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn ident_bytes(class: u8, order: u8) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(&ELF_MAGIC);
        bytes[EI_CLASS] = class;
        bytes[EI_DATA] = order;
        bytes[6] = 1; // EV_CURRENT
        bytes
    }

    #[test]
    fn parse_valid_idents() {
        let ident = Ident::parse(&ident_bytes(ELFCLASS64, ELFDATA2LSB)).unwrap();
        assert_eq!(ident.class, Class::Elf64);
        assert_eq!(ident.order, ByteOrder::Little);
        assert!(ident.is_64bit());

        let ident = Ident::parse(&ident_bytes(ELFCLASS32, ELFDATA2MSB)).unwrap();
        assert_eq!(ident.class, Class::Elf32);
        assert_eq!(ident.order, ByteOrder::Big);
        assert!(!ident.is_64bit());
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let mut bytes = ident_bytes(ELFCLASS64, ELFDATA2LSB);
        bytes[0] = 0x7e;
        assert!(matches!(Ident::parse(&bytes).unwrap_err(), Error::NotElf));

        // Too short to even hold the identification block
        assert!(matches!(
            Ident::parse(&[0x7f, b'E', b'L']).unwrap_err(),
            Error::NotElf
        ));
    }

    #[test]
    fn parse_rejects_unknown_class_and_order() {
        let bytes = ident_bytes(3, ELFDATA2LSB);
        assert!(matches!(
            Ident::parse(&bytes).unwrap_err(),
            Error::Malformed { .. }
        ));

        let bytes = ident_bytes(ELFCLASS32, 0);
        assert!(matches!(
            Ident::parse(&bytes).unwrap_err(),
            Error::Malformed { .. }
        ));
    }

    #[test]
    fn dual_width_reads() {
        let narrow = Ident {
            class: Class::Elf32,
            order: ByteOrder::Little,
        };
        let wide = Ident {
            class: Class::Elf64,
            order: ByteOrder::Big,
        };

        // 4 bytes of narrow field at 0, 8 bytes of wide field at 4
        let data = [
            0x78, 0x56, 0x34, 0x12, //
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
        ];

        assert_eq!(narrow.word(&data, 0, 4).unwrap(), 0x1234_5678);
        assert_eq!(wide.word(&data, 0, 4).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn store_word_narrows() {
        let narrow = Ident {
            class: Class::Elf32,
            order: ByteOrder::Little,
        };

        let mut data = [0u8; 8];
        narrow.store_word(&mut data, 0, 0, 0xAABB_CCDD).unwrap();
        assert_eq!(data[..4], [0xDD, 0xCC, 0xBB, 0xAA]);

        // A value that cannot be narrowed must be rejected, not truncated
        assert!(narrow.store_word(&mut data, 0, 0, u64::MAX).is_err());
    }

    #[test]
    fn round_up_to_class_alignment() {
        let narrow = Ident {
            class: Class::Elf32,
            order: ByteOrder::Little,
        };
        let wide = Ident {
            class: Class::Elf64,
            order: ByteOrder::Little,
        };

        assert_eq!(narrow.round_up(0).unwrap(), 0);
        assert_eq!(narrow.round_up(1).unwrap(), 4);
        assert_eq!(narrow.round_up(4).unwrap(), 4);
        assert_eq!(wide.round_up(9).unwrap(), 16);
        assert!(wide.round_up(u64::MAX).is_err());
    }
}
