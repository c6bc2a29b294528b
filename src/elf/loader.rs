//! Segment loading: copying loadable segments into a caller-owned destination
//! region under a selectable safety regime.
//!
//! The loader never touches raw memory itself. All writes go through the
//! [`Region`] collaborator, which models the caller's destination address space as
//! a base address plus a copy/zero primitive that may refuse any individual write.
//! [`SliceRegion`] is the provided implementation over a mutable byte slice, whose
//! writes are inherently bounds-checked.
//!
//! Two safety regimes exist, chosen per load via [`CopyPolicy`]:
//!
//! - [`CopyPolicy::Trusted`] performs only coarse range and overflow checks before
//!   handing each copy to the region. Appropriate when the image's origin is
//!   already trusted (a privileged boot path loading its own kernel); a hostile
//!   segment is still caught by the region's primitive, but only mid-load, after
//!   earlier segments were written.
//! - [`CopyPolicy::Defensive`] additionally proves that every byte a segment will
//!   write lies inside the declared region *before* the first byte is written.
//!   Appropriate when the image is attacker-influenced or the destination is a
//!   different protection domain.
//!
//! Either way a failed segment aborts the whole load; segments already written are
//! not rolled back and the destination contents must be treated as undefined.

use crate::{
    elf::{binary::ElfBinary, diagnostics::DiagnosticCategory},
    Error::{CopyFault, OutOfBounds},
    Result,
};

/// The safety regime a load runs under.
///
/// Modeled as a runtime parameter rather than a build-time switch so both regimes
/// face the same test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPolicy {
    /// Coarse checks only; the region primitive is the last line of defense.
    Trusted,
    /// Every segment is proven to fit the declared region before any byte of it
    /// is written.
    Defensive,
}

/// A caller-owned destination address space for the loader.
///
/// Implementations supply the copy/zero primitive the loader writes through. The
/// contract: `write` and `zero` either perform the full operation or fail without
/// any partial effect, and they must refuse writes outside the memory they
/// actually own — the loader relies on that refusal in the trusted regime.
pub trait Region {
    /// The address the region starts at, in the same address space as the
    /// segments' physical addresses after footprint translation.
    fn base(&self) -> u64;

    /// Number of bytes the region covers.
    fn size(&self) -> u64;

    /// Copy `bytes` to `addr`.
    ///
    /// # Errors
    /// Returns [`crate::Error::CopyFault`] if any part of the write falls outside
    /// the region.
    fn write(&mut self, addr: u64, bytes: &[u8]) -> Result<()>;

    /// Zero `len` bytes starting at `addr`.
    ///
    /// # Errors
    /// Returns [`crate::Error::CopyFault`] if any part of the fill falls outside
    /// the region.
    fn zero(&mut self, addr: u64, len: u64) -> Result<()>;

    /// Returns `true` if `[addr, addr + len)` lies fully inside the region,
    /// with overflowing ranges rejected.
    fn contains(&self, addr: u64, len: u64) -> bool {
        let Some(end) = addr.checked_add(len) else {
            return false;
        };
        let Some(limit) = self.base().checked_add(self.size()) else {
            return false;
        };
        addr >= self.base() && end <= limit
    }
}

/// A [`Region`] backed by a mutable byte slice.
///
/// The slice plays the part of the destination physical memory; `base` declares
/// which address its first byte corresponds to. Every write is bounds-checked
/// against the slice, which makes this implementation safe to point at hostile
/// input even in the trusted regime.
#[derive(Debug)]
pub struct SliceRegion<'mem> {
    base: u64,
    mem: &'mem mut [u8],
}

impl<'mem> SliceRegion<'mem> {
    /// Create a region covering `mem`, whose first byte lives at address `base`.
    pub fn new(base: u64, mem: &'mem mut [u8]) -> SliceRegion<'mem> {
        SliceRegion { base, mem }
    }

    /// The region's current contents, for inspection after a load.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.mem
    }

    fn range(&self, addr: u64, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr
            .checked_sub(self.base)
            .and_then(|offset| usize::try_from(offset).ok())
            .ok_or_else(|| CopyFault(format!("write at 0x{:x} precedes the region base", addr)))?;

        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.mem.len())
            .ok_or_else(|| {
                CopyFault(format!(
                    "write of 0x{:x} bytes at 0x{:x} escapes the region",
                    len, addr
                ))
            })?;

        Ok(start..end)
    }
}

impl Region for SliceRegion<'_> {
    fn base(&self) -> u64 {
        self.base
    }

    fn size(&self) -> u64 {
        self.mem.len() as u64
    }

    fn write(&mut self, addr: u64, bytes: &[u8]) -> Result<()> {
        let range = self.range(addr, bytes.len())?;
        self.mem[range].copy_from_slice(bytes);
        Ok(())
    }

    fn zero(&mut self, addr: u64, len: u64) -> Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| CopyFault(format!("zero fill of 0x{:x} bytes is unrepresentable", len)))?;
        let range = self.range(addr, len)?;
        self.mem[range].fill(0);
        Ok(())
    }
}

impl<'data> ElfBinary<'data> {
    /// Copy every loadable segment into the destination region and, if an
    /// embedded symbol table was planned, materialize it past them.
    ///
    /// Segments are processed in header table order, not sorted by address. Each
    /// is placed at `region.base() + (paddr - footprint.start)`: the image's
    /// physical layout translated to wherever the caller chose to put it. The
    /// segment's file bytes are copied and the remainder up to its memory size is
    /// zero-filled.
    ///
    /// Requires [`ElfBinary::compute_footprint`] to have run; without a footprint
    /// there is nothing to load and the call is a no-op.
    ///
    /// # Arguments
    /// * `region` - The caller-owned destination memory
    /// * `policy` - The safety regime to run under (see [`CopyPolicy`])
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for a segment with `memsz < filesz`
    /// or overflowing address arithmetic, [`crate::Error::OutOfBounds`] if a
    /// segment's file range escapes the image, and [`crate::Error::CopyFault`]
    /// if the region refuses a write. Any error aborts the load; earlier
    /// segments stay written and the destination contents are undefined.
    pub fn load<R: Region + ?Sized>(&self, region: &mut R, policy: CopyPolicy) -> Result<()> {
        let Some(footprint) = self.footprint else {
            self.diagnostics.info(
                DiagnosticCategory::Loader,
                "no loadable segments; nothing copied".to_string(),
            );
            return Ok(());
        };

        for index in 0..self.phnum {
            let Some(phdr) = self.program_header(index) else {
                break;
            };
            if !phdr.is_load()? {
                continue;
            }

            let paddr = phdr.paddr()?;
            let offset = phdr.offset()?;
            let filesz = phdr.filesz()?;
            let memsz = phdr.memsz()?;

            if memsz < filesz {
                return Err(self.fail(
                    DiagnosticCategory::Loader,
                    malformed_error!(
                        "segment {} declares memsz 0x{:x} smaller than filesz 0x{:x}",
                        index,
                        memsz,
                        filesz
                    ),
                ));
            }

            let source = self
                .segment_bytes(offset, filesz)
                .map_err(|error| self.fail(DiagnosticCategory::Loader, error))?;

            // paddr >= footprint.start by construction of the footprint
            let dest = region
                .base()
                .checked_add(paddr - footprint.start)
                .ok_or_else(|| {
                    self.fail(
                        DiagnosticCategory::Loader,
                        malformed_error!("segment {} destination address overflows", index),
                    )
                })?;

            if policy == CopyPolicy::Defensive && !region.contains(dest, memsz) {
                return Err(self.fail(
                    DiagnosticCategory::Loader,
                    malformed_error!(
                        "segment {} (0x{:x} bytes at 0x{:x}) does not fit the destination region",
                        index,
                        memsz,
                        dest
                    ),
                ));
            }

            let tail = dest.checked_add(filesz).ok_or_else(|| {
                self.fail(
                    DiagnosticCategory::Loader,
                    malformed_error!("segment {} zero fill address overflows", index),
                )
            })?;

            self.diagnostics.info(
                DiagnosticCategory::Loader,
                format!(
                    "phdr {} at 0x{:x} -> 0x{:x} ({:?})",
                    index,
                    dest,
                    tail,
                    phdr.flags()?
                ),
            );

            region
                .write(dest, source)
                .map_err(|error| self.fail(DiagnosticCategory::Loader, error))?;
            region
                .zero(tail, memsz - filesz)
                .map_err(|error| self.fail(DiagnosticCategory::Loader, error))?;
        }

        self.write_embedded_symtab(region, policy)?;

        Ok(())
    }

    /// The file-resident bytes of a segment, bounds-checked against the image.
    fn segment_bytes(&self, offset: u64, filesz: u64) -> Result<&'data [u8]> {
        let start = usize::try_from(offset).map_err(|_| OutOfBounds)?;
        let len = usize::try_from(filesz).map_err(|_| OutOfBounds)?;
        let end = start.checked_add(len).ok_or(OutOfBounds)?;

        self.data.get(start..end).ok_or(OutOfBounds)
    }
}
