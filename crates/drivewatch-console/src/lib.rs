/// DriveWatch console frontend.
///
/// Everything the core leaves to a collaborator lives here: colored
/// operator messages, stdin-driven operator input with the exit-key
/// listener, and log-file setup.
pub mod input;
pub mod logging;
pub mod reporter;

pub use input::StdinOperator;
pub use reporter::ConsoleReporter;
