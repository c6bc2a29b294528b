use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while validating an ELF
/// image, computing its load footprint, copying its segments into a destination region and
/// materializing the embedded symbol table. Each variant provides specific context about the
/// failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Image Parsing Errors
/// - [`Error::NotElf`] - The input does not start with the ELF magic signature
/// - [`Error::Malformed`] - Structurally invalid image (bad identification bytes, header
///   tables extending past the image, overflowing size arithmetic)
/// - [`Error::OutOfBounds`] - Attempted to read beyond the image boundaries
/// - [`Error::Empty`] - Empty input provided
///
/// ## Load Errors
/// - [`Error::CopyFault`] - The destination copy/zero primitive refused a write
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Error`] - Generic error for miscellaneous failures (e.g. memory mapping)
///
/// Note that a failed symbol lookup is *not* an error: [`crate::elf::ElfBinary::symbol_address`]
/// returns `Ok(None)` for a miss, reserving this enum for genuinely exceptional conditions.
///
/// # Examples
///
/// ```rust,no_run
/// use elfscope::{Error, ElfObject};
///
/// match ElfObject::from_file(std::path::Path::new("vmlinux")) {
///     Ok(binary) => println!("Successfully parsed image"),
///     Err(Error::NotElf) => println!("Not an ELF binary"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed image: {}", message),
///     Err(e) => println!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input does not carry the ELF magic signature.
    ///
    /// This is the first check performed on any input; nothing else is read
    /// before it passes. It corresponds to "this is not the format we speak"
    /// rather than "this image is broken".
    #[error("Not an ELF binary")]
    NotElf,

    /// The image is damaged and could not be parsed.
    ///
    /// This error indicates that the image structure is corrupted or doesn't
    /// conform to the ELF format: unsupported identification bytes, header
    /// tables that extend past the end of the image, undersized table entries,
    /// or size arithmetic that would overflow. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the image.
    ///
    /// This error occurs when trying to read data beyond the end of the image
    /// or a located table. It's a safety check to prevent buffer overruns
    /// during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The destination copy/zero primitive refused a write.
    ///
    /// Reported by the [`crate::elf::Region`] collaborator when a segment copy
    /// or zero-fill would land outside the destination memory. The load is
    /// aborted; segments written before the fault are left in place and the
    /// destination contents must be considered undefined by the caller.
    #[error("Destination copy failed - {0}")]
    CopyFault(String),

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where an
    /// actual ELF image was expected.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external library errors with additional context.
    #[error("{0}")]
    Error(String),
}
