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
/// Most operations of the bridge never surface an error at all: expected shape mismatches
/// degrade to default values and expected representation incompatibilities are reported
/// through [`crate::interop::CastOutcome`]. What remains falls into three groups.
///
/// # Error Categories
///
/// ## Fatal Precondition Violations
/// - [`Error::DuplicateRegistration`] - A key that must be unique was registered twice
/// - [`Error::InvalidArgument`] - A required argument was missing or empty
/// - [`Error::Malformed`] - Module data handed to the catalog is unusable
///
/// ## Foreign Runtime Failures
/// - [`Error::ForeignCall`] - A call into the foreign runtime failed unexpectedly
/// - [`Error::ClassNotFound`] - No native class metadata exists for a type
/// - [`Error::InvalidPointer`] - A native pointer does not reference a live object
///
/// ## Reflective Model Errors
/// - [`Error::MemberNotFound`] - A field, property or method does not exist
/// - [`Error::NotInvocable`] - A member exists but cannot be used the requested way
/// - [`Error::EnumerationUnsupported`] - A collection type failed its enumeration probe
/// - [`Error::NotEnumerable`] - A value is not a collection at all
///
/// # Examples
///
/// ```rust
/// use dotbridge::{prelude::*, Error};
///
/// let context = BridgeContext::builder()
///     .config(BridgeConfig::managed())
///     .build()?;
///
/// match context.sequence(&Value::I32(4)) {
///     Ok(_) => println!("enumerable"),
///     Err(Error::NotEnumerable(name)) => println!("{name} is not a collection"),
///     Err(e) => println!("Other error: {e}"),
/// }
/// # Ok::<(), dotbridge::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Module data handed to the catalog could not be used.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
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

    /// A key that must be unique was registered a second time.
    ///
    /// Signals a programmer error at the call site, e.g. mapping one obfuscated
    /// name onto two different types.
    #[error("Duplicate registration - {0}")]
    DuplicateRegistration(String),

    /// A required argument was missing or empty.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// A call into the foreign runtime failed unexpectedly.
    ///
    /// The bridge never lets this error escape a public query; it is logged and
    /// converted into the documented fallback of the failing operation.
    #[error("Foreign runtime call failed - {0}")]
    ForeignCall(String),

    /// No native class metadata is known for the named type.
    #[error("No native class for {0}")]
    ClassNotFound(String),

    /// A native pointer does not reference a live foreign object.
    #[error("Invalid native pointer 0x{0:X}")]
    InvalidPointer(u64),

    /// A field, property or method does not exist on a type.
    #[error("Member not found - {0}")]
    MemberNotFound(String),

    /// A member exists but cannot be used the requested way (read, write or invoke).
    #[error("Member can not be used this way - {0}")]
    NotInvocable(String),

    /// The collection type failed its one-time enumeration probe.
    ///
    /// Once recorded, every later request for the same type fails with this error
    /// without probing again.
    #[error("Enumeration of {type_name} is not supported: {reason}")]
    EnumerationUnsupported {
        /// Assembly-qualified name of the collection type
        type_name: String,
        /// Why the probe failed
        reason: String,
    },

    /// The value is not a collection.
    #[error("{0} is not enumerable")]
    NotEnumerable(String),

    /// A [`crate::value::Value`] could not be converted into the requested Rust type.
    #[error("Cannot convert {source_type} to {target_type}")]
    ValueConversion {
        /// Kind of the value that was converted
        source_type: &'static str,
        /// Requested Rust type
        target_type: &'static str,
    },
}
