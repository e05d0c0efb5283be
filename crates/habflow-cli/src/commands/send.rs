//! `habflow send`: post one command to an item.

use serde_json::Value;

use habflow_nodes::{ItemOutConfig, ItemOutNode};

use crate::cli::{GlobalOpts, SendArgs};
use crate::error::CliError;

pub async fn handle(args: SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = ItemOutConfig::new(super::descriptor(global), args.item);
    config.transport = super::transport(global);

    let node = ItemOutNode::new(config)?;

    // The CLI has no configured override; the argument is the payload,
    // so a missing argument exercises the no-command path.
    let payload = match args.command {
        Some(command) => Value::String(command),
        None => Value::Null,
    };

    let sent = node.send(&payload).await?;
    eprintln!("OK ({sent})");
    Ok(())
}
