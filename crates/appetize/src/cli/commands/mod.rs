//! CLI commands

mod credentials;
mod init;
mod instance;
mod publish;
mod record;

pub use credentials::CredentialsCommand;
pub use init::InitCommand;
pub use instance::InstanceCommand;
pub use publish::PublishCommand;
pub use record::RecordCommand;
