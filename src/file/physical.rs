//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`Physical`] backend that implements the [`crate::file::Backend`]
//! trait for accessing ELF images from disk using memory-mapped I/O. Kernel and boot images
//! can be large, and the loader touches them in a non-sequential pattern (header tables up
//! front, segment payloads scattered through the file), which is exactly the access pattern
//! demand paging handles well: only the pages actually read are ever loaded.
//!
//! All access operations include bounds checking to ensure memory safety; the mapping is
//! created read-only and shared, matching the parser's contract of never mutating the image.

use super::Backend;
use crate::{
    Error::{Error, FileError, OutOfBounds},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// A file backend that uses memory-mapped I/O for efficient access to images on disk.
///
/// [`Physical`] maps the file directly into the process's virtual address space,
/// eliminating the need to read the entire image into memory upfront while still
/// allowing fast random access to any part of it.
///
/// # Examples
///
/// ```rust,ignore
/// use elfscope::file::{Physical, Backend};
/// use std::path::Path;
///
/// let physical = Physical::new(Path::new("vmlinux"))?;
///
/// // Check the ELF magic
/// let magic = physical.data_slice(0, 4)?;
/// assert_eq!(magic, b"\x7fELF");
/// # Ok::<(), elfscope::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
}

impl Physical {
    /// Create a new physical file backend by memory-mapping the specified file.
    ///
    /// The file is mapped as read-only and shared, allowing multiple processes to
    /// efficiently access the same image.
    ///
    /// # Arguments
    /// * `path` - Path to the ELF image on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
