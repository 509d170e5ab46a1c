/// Configuration subsystem - Editor settings and preferences
///
/// This module handles loading settings from .edrusrc files. Command-line
/// flags are layered on top by the binary.

pub mod rc;

// Re-export public interface
pub use rc::{RC_FILE, RcConfig, RcLoader};
