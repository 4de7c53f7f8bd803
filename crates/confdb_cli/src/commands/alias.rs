//! Alias lookup command implementation.

use confdb_core::IntegrationRef;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct AliasOwner<'a> {
    alias: &'a str,
    project_id: u64,
    integration_id: Option<u64>,
}

/// Runs the alias command.
pub fn run(path: &Path, name: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_existing(path)?;

    let owner = match db.get_integration_alias_by_alias(name) {
        Ok(owner) => owner,
        Err(err) if err.is_not_found() => {
            return Err(format!("Alias {name:?} is not registered").into());
        }
        Err(err) => return Err(err.into()),
    };

    match format {
        "json" => {
            let out = AliasOwner {
                alias: &owner.alias,
                project_id: owner.project_id.as_u64(),
                integration_id: owner.integration.integration_id(),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            println!("Alias:       {}", owner.alias);
            println!("Project:     {}", owner.project_id.as_u64());
            match owner.integration {
                IntegrationRef::Specific(id) => println!("Integration: {id}"),
                IntegrationRef::ProjectLevel => println!("Integration: (project-level)"),
            }
        }
    }

    Ok(())
}
