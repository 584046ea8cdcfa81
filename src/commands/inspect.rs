//! `vcr-splice inspect` command.

use std::path::Path;

use crate::canonical::CanonicalInteraction;
use crate::cassette::format::CassetteFile;

/// Execute the `inspect` command.
///
/// Prints one line per interaction, or the whole cassette as JSON.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be read.
pub fn run(path: &Path, json: bool) -> Result<(), String> {
    let file = CassetteFile::read(path).map_err(|e| e.to_string())?;

    if json {
        let rendered = serde_json::to_string_pretty(&file).map_err(|e| e.to_string())?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Cassette: {}", file.name);
    println!("Recorded: {}", file.recorded_at.to_rfc3339());
    if file.interactions.is_empty() {
        println!("No interactions recorded.");
        return Ok(());
    }
    println!("Interactions: {}", file.interactions.len());
    for (i, interaction) in file.interactions.iter().enumerate() {
        println!("  {}. {}", i + 1, summarize(interaction));
    }
    Ok(())
}

fn summarize(interaction: &CanonicalInteraction) -> String {
    let request = &interaction.request;
    let response = &interaction.response;
    format!(
        "{} {} -> {} {} ({} bytes)",
        request.method,
        request.uri,
        response.status.code,
        response.status.message,
        response.body.len()
    )
}
