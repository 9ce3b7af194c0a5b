pub mod extract;

/// A command handler in the Tessitura CLI.
pub trait Command {
    /// Consumes the command state and runs it.
    fn handle(self) -> eyre::Result<()>;
}
