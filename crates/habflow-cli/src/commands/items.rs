//! `habflow items`: list the hub's item directory.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use habflow_api::{Item, RestClient};

use crate::cli::GlobalOpts;
use crate::error::CliError;

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TYPE")]
    item_type: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "LABEL")]
    label: String,
}

impl From<&Item> for ItemRow {
    fn from(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            item_type: item.item_type.clone().unwrap_or_default(),
            state: item.state.clone(),
            label: item.label.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let rest = RestClient::new(super::descriptor(global), &super::transport(global))?;
    let items = rest.list_items().await?;

    if global.json {
        for item in &items {
            println!(
                "{}",
                serde_json::to_string(item).map_err(|e| CliError::Decode {
                    message: e.to_string()
                })?
            );
        }
        return Ok(());
    }

    if items.is_empty() {
        eprintln!("No items configured on the hub");
        return Ok(());
    }

    let rows: Vec<ItemRow> = items.iter().map(ItemRow::from).collect();
    println!("{}", Table::new(rows).with(Style::blank()));
    Ok(())
}
