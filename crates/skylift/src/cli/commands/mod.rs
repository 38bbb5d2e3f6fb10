//! CLI commands

mod chrome;
mod completions;
mod init;
mod sources;
mod submit;

pub use chrome::ChromeCommand;
pub use completions::CompletionsCommand;
pub use init::InitCommand;
pub use sources::ConfigArgs;
pub use submit::SubmitCommand;
