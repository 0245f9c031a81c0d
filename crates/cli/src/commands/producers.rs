use anyhow::Result;
use serde::Serialize;

use triage_core::producers::default_producer_registry;

#[derive(Debug, Serialize)]
pub struct ProducerInfo {
    pub name: String,
    pub description: String,
}

/// Producers known to this binary, sorted by name.
pub fn producer_infos() -> Vec<ProducerInfo> {
    let registry = default_producer_registry();
    registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let producer = registry.get(&name)?;
            Some(ProducerInfo { description: producer.description().to_string(), name })
        })
        .collect()
}

/// List the available producers.
pub fn list_producers_command(json: bool) -> Result<()> {
    let entries = producer_infos();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Producers:");
    for entry in entries {
        println!("- {}: {}", entry.name, entry.description);
    }

    Ok(())
}
