//! Provisioning tool integration
//!
//! Thin glue around a Terraform-compatible CLI: option assembly, retried
//! command invocation, output decoding, and workspace lifecycle.

pub mod invoke;
pub mod options;
pub mod output;
pub mod workspace;

pub use invoke::{apply, destroy, init, init_and_apply, run_command};
pub use options::{Options, DEFAULT_RETRYABLE_ERRORS};
pub use output::{output_list, output_map, output_string, read_output, read_outputs};
pub use workspace::Workspace;
