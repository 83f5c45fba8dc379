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
/// The analysis core is fail-fast: an instruction stream that breaks a structural
/// invariant (a destination register on an opcode that never writes one, a source
/// register with no live SSA version) is reported immediately instead of being
/// patched over. Unreachable code is never an error; it is pruned silently while
/// the control flow graph is built.
///
/// # Error Categories
///
/// ## Structural Errors
/// - [`Error::Malformed`] - The decoded instruction stream violates an invariant
/// - [`Error::GraphError`] - A graph could not be constructed from its inputs
/// - [`Error::SsaError`] - SSA construction was handed an unusable graph
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors while dumping graphs
/// - [`Error::Error`] - Everything else
///
/// # Examples
///
/// ```rust
/// use dexscope::{Error, analysis::ControlFlowGraph};
///
/// # use dexscope::code::{AnalyzedInstruction, Opcode};
/// # let instructions = vec![
/// #     AnalyzedInstruction::builder(0, Opcode::IF_EQZ).source(0).successors([1, 2]).build()?,
/// #     AnalyzedInstruction::builder(1, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(2, Opcode::CONST_4).destination(1).successor(3).build()?,
/// #     AnalyzedInstruction::builder(3, Opcode::RETURN).source(1).build()?,
/// # ];
/// match ControlFlowGraph::build(instructions, "Lfoo;->bar()V", false) {
///     Ok(cfg) => println!("{cfg}"),
///     Err(Error::GraphError(message)) => eprintln!("bad successor set: {message}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok::<(), dexscope::Error>(())
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The decoded instruction stream violates a structural invariant.
    ///
    /// The error includes the source location where the violation was detected
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

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while writing graph dumps,
    /// such as permission issues or an output path that is not a directory.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),

    /// Graph construction error.
    ///
    /// Raised when an instruction references a successor index outside the
    /// method, when an edge endpoint does not exist, or when analysis results
    /// computed for one graph are combined with another.
    #[error("{0}")]
    GraphError(String),

    /// SSA construction error.
    ///
    /// Raised when the SSA builder is given a graph it cannot convert, for
    /// example a control flow graph whose dominators were rooted elsewhere.
    #[error("SSA construction failed - {0}")]
    SsaError(String),
}
