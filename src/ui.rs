//! Terminal presentation layer
//!
//! Renders the session state and turns typed commands into [`Action`]s.
//! Mirrors the single-button web front-end: a connect/status line, network
//! and balance once connected, and the switch / send / disconnect buttons.

use crate::network::Networks;
use crate::notice::{Notice, Notifier};
use crate::provider::WalletEnvironment;
use crate::session::{SessionState, WalletSession};
use crate::{Error, Result};
use std::fmt::Write;

/// A user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    Disconnect,
    Switch(u64),
    Send,
    Status,
    Help,
    Quit,
}

/// Parse one line of input
///
/// Accepts `connect`, `disconnect`, `switch <network>` (or just the network
/// name), `send`, `status`, `help` and `quit`.
pub fn parse_action(input: &str, networks: &Networks) -> Result<Action> {
    let mut words = input.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Action::Status);
    };

    let action = match command.to_lowercase().as_str() {
        "connect" | "c" => Action::Connect,
        "disconnect" | "d" => Action::Disconnect,
        "send" | "s" => Action::Send,
        "status" => Action::Status,
        "help" | "?" => Action::Help,
        "quit" | "exit" | "q" => Action::Quit,
        "switch" => {
            let target = words.next().ok_or_else(|| {
                Error::InvalidArgument("Usage: switch <network>".to_string())
            })?;
            Action::Switch(resolve_target(target, networks)?)
        }
        other => match networks.chain_id(other) {
            Some(chain_id) => Action::Switch(chain_id),
            None => {
                return Err(Error::InvalidArgument(format!(
                    "Unknown command '{}'. Type 'help' for the list.",
                    other
                )))
            }
        },
    };

    Ok(action)
}

fn resolve_target(target: &str, networks: &Networks) -> Result<u64> {
    networks
        .chain_id(target)
        .or_else(|| target.parse().ok())
        .ok_or_else(|| Error::InvalidArgument(format!("Unknown network '{}'", target)))
}

/// Run a session action and hand back its outcome
///
/// `Help` and `Quit` belong to the input loop and do nothing here.
pub async fn perform<E: WalletEnvironment>(
    session: &mut WalletSession<E>,
    action: Action,
) -> Result<()> {
    match action {
        Action::Connect => session.connect().await,
        Action::Disconnect => {
            session.disconnect();
            Ok(())
        }
        Action::Switch(chain_id) => session.switch_network(chain_id).await,
        Action::Send => session.send_transfer().await.map(|_| ()),
        Action::Status | Action::Help | Action::Quit => Ok(()),
    }
}

/// Render the session the way the web page lays it out
pub fn render(state: &SessionState, networks: &Networks, transfer_value: &str) -> String {
    let mut out = String::new();

    let Some(snapshot) = state.snapshot() else {
        let _ = writeln!(out, "[ Connect to wallet ]");
        return out;
    };

    let _ = writeln!(out, "[ Connected: {} ]", snapshot.account);
    let _ = writeln!(out, "Network: {}", snapshot.network.name);
    let _ = writeln!(out, "Balance: {} ETH", snapshot.balance);

    let mut buttons: Vec<String> = networks
        .watched_networks()
        .iter()
        .map(|n| format!("switch {}", n.name))
        .collect();
    buttons.push(format!("send ({} ETH)", transfer_value));
    buttons.push("disconnect".to_string());
    let _ = writeln!(out, "Actions: {}", buttons.join(" | "));

    out
}

/// Help text listing every command
pub fn help(networks: &Networks) -> String {
    let names: Vec<&str> = networks.known.iter().map(|n| n.name.as_str()).collect();
    format!(
        "Commands:\n  connect | disconnect | send | status | quit\n  switch <{}>",
        names.join("|")
    )
}

/// Notifier that prints notices to stdout, the terminal's blocking alert
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        println!("!! {}", notice);
    }
}
