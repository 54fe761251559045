use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands and keys.",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Create a new session and switch to it.",
        handler: super::handle_new,
    },
    Command {
        name: "session",
        usage: "/session <name>",
        help: "Switch to a named session.",
        handler: super::handle_session,
    },
    Command {
        name: "sessions",
        usage: "/sessions",
        help: "List sessions with message counts.",
        handler: super::handle_sessions,
    },
    Command {
        name: "personality",
        usage: "/personality [id]",
        help: "List personalities, or stage one for the next /apply.",
        handler: super::handle_personality,
    },
    Command {
        name: "set",
        usage: "/set <field> <value>",
        help: "Stage a setting: model, temperature, max-tokens, personality, streaming.",
        handler: super::handle_set,
    },
    Command {
        name: "apply",
        usage: "/apply",
        help: "Commit staged settings and reseed the conversation.",
        handler: super::handle_apply,
    },
    Command {
        name: "settings",
        usage: "/settings",
        help: "Show applied settings and staged changes.",
        handler: super::handle_settings,
    },
    Command {
        name: "clear",
        usage: "/clear",
        help: "Empty the current session's transcript.",
        handler: super::handle_clear,
    },
    Command {
        name: "export",
        usage: "/export [filename]",
        help: "Export the current session as JSON.",
        handler: super::handle_export,
    },
    Command {
        name: "timestamps",
        usage: "/timestamps",
        help: "Toggle message timestamps.",
        handler: super::handle_timestamps,
    },
    Command {
        name: "stats",
        usage: "/stats",
        help: "Show message counts for the current session.",
        handler: super::handle_stats,
    },
    Command {
        name: "log",
        usage: "/log [filename]",
        help: "Toggle transcript logging or set the log file path.",
        handler: super::handle_log,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
