/// Role selection. The session never polls shared state for this: whatever
/// the input source is, it delivers exactly one [`Role`] over a oneshot
/// channel, so a decision cannot fire twice within a session.

use clap::ValueEnum;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::debug;

/// Which end of the protocol this session plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    #[value(alias = "send")]
    Sender,
    #[value(alias = "receive")]
    Receiver,
}

/// Start the role input source.
///
/// With a CLI-provided role the decision is immediate. Otherwise an
/// interactive prompt reads from stdin until the operator picks a side;
/// closing stdin without picking drops the sender, which the session treats
/// as "undecided, shut down".
pub fn role_input(cli_role: Option<Role>) -> oneshot::Receiver<Role> {
    let (tx, rx) = oneshot::channel();
    match cli_role {
        Some(role) => {
            debug!(?role, "role supplied on the command line");
            let _ = tx.send(role);
        }
        None => {
            tokio::spawn(prompt_stdin(tx));
        }
    }
    rx
}

async fn prompt_stdin(tx: oneshot::Sender<Role>) {
    println!("choose a role: [s]end or [r]eceive");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim().to_ascii_lowercase().as_str() {
            "s" | "send" | "sender" => {
                let _ = tx.send(Role::Sender);
                return;
            }
            "r" | "receive" | "receiver" => {
                let _ = tx.send(Role::Receiver);
                return;
            }
            other => println!("unrecognized input {other:?}; type s or r"),
        }
    }
    debug!("stdin closed before a role was chosen");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_verb_and_noun_forms() {
        for (input, expected) in [
            ("sender", Role::Sender),
            ("send", Role::Sender),
            ("receiver", Role::Receiver),
            ("receive", Role::Receiver),
        ] {
            assert_eq!(Role::from_str(input, true).unwrap(), expected, "{input}");
        }
    }
}
