//! `habflow watch`: hold a live subscription to one item and print
//! every flow message it produces.
//!
//! Flow messages go to stdout (plain or JSON lines); status transitions
//! go to stderr so the message stream stays pipeable. Runs until
//! interrupted, the optional `--count` is reached, or the node stops.

use chrono::Local;
use owo_colors::OwoColorize;

use habflow_nodes::{FlowMessage, ItemInConfig, ItemInNode, Severity, StatusSignal, Topic};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = ItemInConfig::new(super::descriptor(global), args.item);
    config.transport = super::transport(global);

    let mut node = ItemInNode::spawn(config)?;
    let mut status = node.status();
    let mut remaining = args.count;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
            changed = status.changed() => {
                if changed.is_ok() {
                    print_status(&status.borrow_and_update().clone());
                }
            }
            message = node.recv() => {
                let Some(message) = message else { break };
                print_message(&message, global.json)?;

                if let Some(count) = remaining.as_mut() {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        break;
                    }
                }
            }
        }
    }

    node.stop().await;
    Ok(())
}

fn print_message(message: &FlowMessage, json: bool) -> Result<(), CliError> {
    if json {
        println!(
            "{}",
            serde_json::to_string(message).map_err(|e| CliError::Decode {
                message: e.to_string()
            })?
        );
        return Ok(());
    }

    let topic = match message.topic {
        Topic::State => "state",
        Topic::StateChanged => "statechanged",
    };
    println!(
        "{} {:<12} {} = {}",
        Local::now().format("%H:%M:%S"),
        topic,
        message.item,
        message.payload
    );
    Ok(())
}

fn print_status(signal: &StatusSignal) {
    let marker = match signal.severity {
        Severity::Neutral => "○".yellow().to_string(),
        Severity::SuccessOn => "●".green().to_string(),
        Severity::SuccessOff => "●".white().to_string(),
        Severity::Error => "✗".red().to_string(),
    };
    eprintln!("{marker} {}", signal.text.dimmed());
}
