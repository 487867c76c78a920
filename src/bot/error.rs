#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BotError {
    #[error("This command must be used in a server.")]
    GuildOnlyCommand,

    #[error("This command must be used in a thread in a server.")]
    ThreadOnlyCommand,

    #[error("Invalid argument for {parameter}: {reason}")]
    InvalidCommandArgument { parameter: String, reason: String },

    #[error("{0}")]
    PermissionDenied(String),
}
