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
/// Only boundary failures surface as errors. A pass that does not recognize the shape
/// it is looking for leaves the tree untouched and reports nothing here; see
/// [`crate::deobfuscation::EventLog`] for the recoverable diagnostics.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Json`] - The input is not valid ESTree JSON
/// - [`Error::Malformed`] - The JSON is valid but does not describe a `Program`
/// - [`Error::Empty`] - Empty input provided
///
/// ## Output Errors
/// - [`Error::Unsupported`] - The code generator met a node kind it cannot print
///
/// # Examples
///
/// ```rust,no_run
/// use jsdeob::{deobfuscation::DeobfuscationEngine, Error};
///
/// let mut engine = DeobfuscationEngine::default();
/// match engine.process_file("bundle.json") {
///     Ok((program, result)) => println!("{}", result.summary()),
///     Err(Error::Json(err)) => eprintln!("not ESTree JSON: {err}"),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed input: {} ({}:{})", message, file, line);
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is structurally valid JSON but not a usable syntax tree.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
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

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading an input tree or
    /// writing generated output.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from `serde_json` while reading or writing ESTree JSON.
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// The code generator cannot render this node kind.
    ///
    /// Node kinds outside the typed model are carried through the pipeline untouched,
    /// but there is no source form to print for them.
    #[error("Unsupported node kind for code generation: {0}")]
    Unsupported(String),
}
