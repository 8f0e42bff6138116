//! Operator command: `/fb reload`.
use serde::Serialize;

use crate::host::CommandSender;
use crate::store::LoadReport;

pub const COMMAND_NAME: &str = "fb";
pub const MESSAGE_PREFIX: &str = "[FoodRebalanced]";
const VERBS: [&str; 1] = ["reload"];

/// Parsed command verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Reload,
}

impl AdminCommand {
    /// Parse the argument list following the command name.
    #[must_use]
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Option<Self> {
        match args {
            [verb] if verb.as_ref().trim().eq_ignore_ascii_case("reload") => Some(Self::Reload),
            _ => None,
        }
    }
}

/// How a command invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CommandReply {
    Reloaded { report: LoadReport },
    Denied,
    Usage,
}

impl CommandReply {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Reloaded { .. })
    }
}

#[must_use]
pub fn usage(file_name: &str) -> String {
    format!("/{COMMAND_NAME} reload - Reloads the {file_name} configuration (OP only)")
}

/// Console always passes; players need operator privileges.
pub fn can_use<S: CommandSender + ?Sized>(sender: &S) -> bool {
    sender.is_console() || sender.is_operator()
}

/// Run the command on behalf of `sender`, replying through it.
///
/// `reload` is only invoked for a permitted `reload` invocation.
pub fn dispatch<S, A, F>(sender: &mut S, args: &[A], file_name: &str, reload: F) -> CommandReply
where
    S: CommandSender + ?Sized,
    A: AsRef<str>,
    F: FnOnce() -> LoadReport,
{
    let Some(AdminCommand::Reload) = AdminCommand::parse(args) else {
        sender.send_message(&format!("Usage: {}", usage(file_name)));
        return CommandReply::Usage;
    };

    if !can_use(&*sender) {
        sender.send_message(&format!(
            "{MESSAGE_PREFIX} You do not have permission to execute this command."
        ));
        return CommandReply::Denied;
    }

    let report = reload();
    sender.send_message(&format!("{MESSAGE_PREFIX} {file_name} reloaded."));
    CommandReply::Reloaded { report }
}

/// Completions for the argument being typed.
#[must_use]
pub fn tab_complete<A: AsRef<str>>(args: &[A]) -> Vec<&'static str> {
    match args {
        [partial] => {
            let partial = partial.as_ref().to_lowercase();
            VERBS
                .iter()
                .copied()
                .filter(|verb| verb.starts_with(&partial))
                .collect()
        }
        _ => Vec::new(),
    }
}
