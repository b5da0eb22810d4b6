use serde_json::json;

use crate::client::{FileStorage, HttpRemote, Outcome, PersistenceClient};
use crate::config::{ClientConfig, EditTiming, FeedbackTiming, ServerConfig};
use crate::document::FieldKey;
use crate::editor::Editor;
use crate::error::{MealPlanError, Result};
use crate::page::{default_bindings, shortcuts};
use crate::server;

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn persistence_client(config: &ClientConfig) -> Result<PersistenceClient<HttpRemote, FileStorage>> {
    Ok(PersistenceClient::new(
        HttpRemote::new(config)?,
        FileStorage::new(&config.cache_dir),
    ))
}

pub fn handle_serve(config: ServerConfig) -> Result<()> {
    runtime()?.block_on(server::serve(config))
}

pub fn handle_show(config: ClientConfig, json: bool) -> Result<()> {
    let doc = runtime()?.block_on(async {
        let client = persistence_client(&config)?;
        Ok::<_, MealPlanError>(client.load().await)
    })?;

    if json {
        println!("{}", doc.to_json_pretty()?);
        return Ok(());
    }

    for key in default_bindings() {
        let value = doc.get(key.as_str());
        if !value.is_empty() {
            println!("{key}: {value}");
        }
    }
    Ok(())
}

pub fn handle_get(key: String, config: ClientConfig) -> Result<()> {
    let field = FieldKey::new(key);
    let doc = runtime()?.block_on(async {
        let client = persistence_client(&config)?;
        Ok::<_, MealPlanError>(client.load().await)
    })?;

    if !doc.contains(field.as_str()) && !default_bindings().contains(&field) {
        return Err(MealPlanError::UnknownField(field.to_string()));
    }

    println!("{}", doc.get(field.as_str()));
    Ok(())
}

pub fn handle_set(key: String, value: String, config: ClientConfig, json: bool) -> Result<()> {
    let field = FieldKey::new(key);

    let outcome = runtime()?.block_on(async {
        let mut editor = Editor::open(
            persistence_client(&config)?,
            default_bindings(),
            EditTiming::default(),
            FeedbackTiming::default(),
        )
        .await;
        editor.edit_field(&field, &value).await
    })?;

    if json {
        let result = json!({
            "key": field,
            "value": value.trim(),
            "outcome": outcome,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match outcome {
            Outcome::Ok => println!("Saved {field} (ok)"),
            Outcome::Degraded => {
                println!("Saved {field} to local cache only (degraded): server unreachable")
            }
            Outcome::Failed => println!("Could not save {field} (failed)"),
        }
    }

    if outcome == Outcome::Failed {
        return Err(MealPlanError::SaveFailed);
    }
    Ok(())
}

pub fn handle_fields() -> Result<()> {
    for key in default_bindings() {
        if key.is_multiline() {
            println!("{key} (multi-line)");
        } else {
            println!("{key}");
        }
    }
    println!();
    println!("{}", shortcuts());
    Ok(())
}
