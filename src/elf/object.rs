//! The owning entry point: an ELF image plus its parsed view in one value.
//!
//! [`crate::elf::ElfBinary`] borrows its image, which is the right shape for a
//! caller that already holds the bytes. For the common case of "open this file
//! and work with it", [`ElfObject`] bundles a [`crate::file::Backend`] (a
//! memory-mapped file or an owned buffer) together with the parsed context
//! borrowing it, using a self-referencing struct so the pair moves as one value
//! with no lifetime threading at the API surface.

use std::{path::Path, sync::Arc};

use ouroboros::self_referencing;

use crate::{
    elf::{
        binary::{ElfBinary, Footprint},
        diagnostics::Diagnostics,
        ident::Ident,
        loader::{CopyPolicy, Region},
        symtab::EmbeddedSymtab,
    },
    file::{Backend, Memory, Physical},
    Error::Empty,
    Result,
};

#[self_referencing]
/// A parsed ELF image that owns its backing data.
///
/// This is the main entry point for working with images from disk or memory. It
/// validates the image on construction (see [`ElfBinary::parse`] for the
/// contract) and exposes the same parse/measure/load/resolve operations, with the
/// backing bytes kept alive for as long as the object lives.
///
/// # Examples
///
/// ```rust,no_run
/// use elfscope::elf::{CopyPolicy, SliceRegion};
/// use elfscope::ElfObject;
/// use std::path::Path;
///
/// let mut binary = ElfObject::from_file(Path::new("vmlinux"))?;
///
/// if let Some(footprint) = binary.compute_footprint()? {
///     let mut memory = vec![0u8; footprint.len() as usize];
///     let mut region = SliceRegion::new(footprint.start, &mut memory);
///     binary.load_into(&mut region, CopyPolicy::Defensive)?;
/// }
///
/// if let Some(address) = binary.symbol_address("start_kernel")? {
///     println!("start_kernel at 0x{:x}", address);
/// }
/// # Ok::<(), elfscope::Error>(())
/// ```
pub struct ElfObject {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
    /// The parsed view, referencing the data.
    #[borrows(data)]
    #[covariant]
    binary: ElfBinary<'this>,
}

impl std::fmt::Debug for ElfObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElfObject")
            .field("binary", self.borrow_binary())
            .finish()
    }
}

impl ElfObject {
    /// Parse an ELF image from the given path.
    ///
    /// The file is memory-mapped for efficient access.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the image on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is empty, or fails
    /// validation (see [`ElfBinary::parse`]).
    pub fn from_file(file: &Path) -> Result<ElfObject> {
        Self::load(Physical::new(file)?, Arc::new(Diagnostics::new()))
    }

    /// Parse an ELF image from the given path, recording into the given
    /// diagnostics collector.
    ///
    /// # Arguments
    ///
    /// * `file` - Path to the image on disk.
    /// * `diagnostics` - Collector that receives validation and load messages.
    ///
    /// # Errors
    ///
    /// See [`ElfObject::from_file`].
    pub fn from_file_with_diagnostics(
        file: &Path,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<ElfObject> {
        Self::load(Physical::new(file)?, diagnostics)
    }

    /// Parse an ELF image from a memory buffer.
    ///
    /// Useful when the image arrived over a boot protocol or network channel
    /// and was never a file on disk.
    ///
    /// # Arguments
    ///
    /// * `data` - The bytes of the image.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty or fails validation (see
    /// [`ElfBinary::parse`]).
    pub fn from_mem(data: Vec<u8>) -> Result<ElfObject> {
        Self::load(Memory::new(data), Arc::new(Diagnostics::new()))
    }

    /// Parse an ELF image from a memory buffer, recording into the given
    /// diagnostics collector.
    ///
    /// # Arguments
    ///
    /// * `data` - The bytes of the image.
    /// * `diagnostics` - Collector that receives validation and load messages.
    ///
    /// # Errors
    ///
    /// See [`ElfObject::from_mem`].
    pub fn from_mem_with_diagnostics(
        data: Vec<u8>,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<ElfObject> {
        Self::load(Memory::new(data), diagnostics)
    }

    /// Parse an ELF image from a custom [`Backend`].
    ///
    /// # Arguments
    ///
    /// * `backend` - The data source providing the image bytes.
    /// * `diagnostics` - Collector that receives validation and load messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is empty or the image fails validation.
    pub fn from_backend<T: Backend + 'static>(
        backend: T,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<ElfObject> {
        Self::load(backend, diagnostics)
    }

    /// Internal loader for any backend.
    fn load<T: Backend + 'static>(data: T, diagnostics: Arc<Diagnostics>) -> Result<ElfObject> {
        if data.len() == 0 {
            return Err(Empty);
        }

        let data: Box<dyn Backend> = Box::new(data);

        ElfObject::try_new(data, |data| {
            ElfBinary::parse_with_diagnostics(data.data(), diagnostics)
        })
    }

    /// The parsed view over the image, for locator and header access.
    #[must_use]
    pub fn binary(&self) -> &ElfBinary<'_> {
        self.borrow_binary()
    }

    /// The image's decoded identification (class and byte order).
    #[must_use]
    pub fn ident(&self) -> Ident {
        self.borrow_binary().ident()
    }

    /// Total size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.borrow_data().len()
    }

    /// Returns `true` if the image has a length of zero (never the case for a
    /// successfully parsed object).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute (and cache) the physical footprint of the loadable segments.
    ///
    /// See [`ElfBinary::compute_footprint`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for overflowing segment address
    /// arithmetic.
    pub fn compute_footprint(&mut self) -> Result<Option<Footprint>> {
        self.with_binary_mut(|binary| binary.compute_footprint())
    }

    /// The footprint computed by [`ElfObject::compute_footprint`], if any.
    #[must_use]
    pub fn footprint(&self) -> Option<Footprint> {
        self.borrow_binary().footprint()
    }

    /// Plan the embedded symbol table copy. See
    /// [`ElfBinary::plan_embedded_symtab`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the image's header geometry is
    /// inconsistent or the accumulated size overflows.
    pub fn plan_embedded_symtab(&mut self, proposed_start: u64) -> Result<Option<EmbeddedSymtab>> {
        self.with_binary_mut(|binary| binary.plan_embedded_symtab(proposed_start))
    }

    /// The plan produced by [`ElfObject::plan_embedded_symtab`], if any.
    #[must_use]
    pub fn embedded_symtab(&self) -> Option<EmbeddedSymtab> {
        self.borrow_binary().embedded_symtab()
    }

    /// Copy the loadable segments (and the planned embedded symbol table, if
    /// any) into the destination region. See [`ElfBinary::load`].
    ///
    /// # Errors
    ///
    /// See [`ElfBinary::load`].
    pub fn load_into<R: Region + ?Sized>(&self, region: &mut R, policy: CopyPolicy) -> Result<()> {
        self.borrow_binary().load(region, policy)
    }

    /// Look up a symbol by name. See [`ElfBinary::symbol_address`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if a symbol entry cannot be read.
    pub fn symbol_address(&self, name: &str) -> Result<Option<u64>> {
        self.borrow_binary().symbol_address(name)
    }

    /// The diagnostics collector this object records into.
    #[must_use]
    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        self.borrow_binary().diagnostics().clone()
    }

    /// Install a different diagnostics collector.
    pub fn set_diagnostics(&mut self, diagnostics: Arc<Diagnostics>) {
        self.with_binary_mut(|binary| binary.set_diagnostics(diagnostics));
    }
}
