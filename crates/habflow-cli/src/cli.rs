//! Command-line definitions.
//!
//! Kept free of crate-internal dependencies -- build.rs includes this
//! file directly to generate man pages, so everything here must compile
//! with only clap and clap_complete available.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Terminal host for habflow's openHAB item nodes.
#[derive(Debug, Parser)]
#[command(
    name = "habflow",
    version,
    about = "Follow and command openHAB items from the terminal",
    long_about = "Follow and command openHAB items from the terminal.\n\n\
                  `watch` holds a live event-stream subscription to one item and \
                  prints every flow message it produces; `send` posts a single \
                  command; `items` lists what the hub knows about."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub hostname or IP address.
    #[arg(long, global = true, env = "HABFLOW_HOST", default_value = "localhost")]
    pub host: String,

    /// Hub REST port.
    #[arg(long, global = true, env = "HABFLOW_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Timeout in seconds for one-shot requests.
    #[arg(long, global = true, env = "HABFLOW_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Print flow messages and item listings as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the hub's items with their current states.
    Items,

    /// Follow one item over the live event stream.
    Watch(WatchArgs),

    /// Send a single command to an item.
    Send(SendArgs),

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Name of the item to subscribe to.
    pub item: String,

    /// Stop after this many flow messages (for scripting).
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// Name of the item to command.
    pub item: String,

    /// Command to send. `on`/`1` and `off`/`0` alias to ON/OFF;
    /// anything else is passed through as a setpoint.
    pub command: Option<String>,
}
