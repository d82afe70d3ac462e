use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;

use converter_core::Msg;
use converter_logging::converter_debug;

use crate::app::Inbox;

pub const HELP: &str =
    "Enter a URL to validate it. Commands: convert (c), download (d), reset (r), help (?), quit (q)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Submit(String),
    Convert,
    Download,
    Reset,
    Help,
    Quit,
}

impl UserCommand {
    /// Messages the command feeds into the reducer.
    pub fn into_messages(self) -> Vec<Msg> {
        match self {
            UserCommand::Submit(url) => vec![Msg::InputChanged(url), Msg::ValidateClicked],
            UserCommand::Convert => vec![Msg::ConvertClicked],
            UserCommand::Download => vec![Msg::DownloadClicked],
            UserCommand::Reset => vec![Msg::ResetClicked],
            UserCommand::Help | UserCommand::Quit => Vec::new(),
        }
    }
}

/// Parses one stdin line. Blank lines are ignored.
pub fn parse_command(line: &str) -> Option<UserCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let command = match line.to_ascii_lowercase().as_str() {
        "convert" | "c" => UserCommand::Convert,
        "download" | "d" => UserCommand::Download,
        "reset" | "r" => UserCommand::Reset,
        "help" | "?" => UserCommand::Help,
        "quit" | "q" | "exit" => UserCommand::Quit,
        _ => UserCommand::Submit(line.to_string()),
    };
    Some(command)
}

/// Reads stdin on a background thread. End of input quits only when
/// `quit_on_eof` is set, so `--auto` runs keep going with a closed stdin.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Inbox>, quit_on_eof: bool) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(command) = parse_command(&line) else {
                continue;
            };
            converter_debug!("stdin command {:?}", command);
            let sent = match command {
                UserCommand::Quit => tx.send(Inbox::Quit).is_ok(),
                UserCommand::Help => {
                    println!("{HELP}");
                    true
                }
                other => other
                    .into_messages()
                    .into_iter()
                    .all(|msg| tx.send(Inbox::Msg(msg)).is_ok()),
            };
            if !sent {
                return;
            }
        }
        if quit_on_eof {
            let _ = tx.send(Inbox::Quit);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_aliases_are_recognized() {
        assert_eq!(parse_command("convert"), Some(UserCommand::Convert));
        assert_eq!(parse_command(" D "), Some(UserCommand::Download));
        assert_eq!(parse_command("r"), Some(UserCommand::Reset));
        assert_eq!(parse_command("exit"), Some(UserCommand::Quit));
        assert_eq!(parse_command("?"), Some(UserCommand::Help));
    }

    #[test]
    fn anything_else_is_a_url_submission() {
        assert_eq!(
            parse_command("  https://youtu.be/abc \n"),
            Some(UserCommand::Submit("https://youtu.be/abc".to_string()))
        );
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn submit_edits_then_validates() {
        let msgs = UserCommand::Submit("https://youtu.be/abc".to_string()).into_messages();
        assert_eq!(
            msgs,
            vec![
                Msg::InputChanged("https://youtu.be/abc".to_string()),
                Msg::ValidateClicked
            ]
        );
        assert!(UserCommand::Quit.into_messages().is_empty());
    }
}
