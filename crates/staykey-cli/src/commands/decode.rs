//! `staykey decode`: run the feed decoder against a local file.

use std::path::Path;

use chrono::Utc;

use staykey_core::{classify_feed_url, decode_feed, extract_guest_info, filter_active};

use crate::error::CliResult;

/// Decodes the file and prints its events.
pub fn run(file: &Path, json: bool, all: bool) -> CliResult<()> {
    let content = std::fs::read_to_string(file)?;
    let mut events = decode_feed(&content);
    if !all {
        events = filter_active(events, Utc::now(), true);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("no events decoded");
        return Ok(());
    }

    println!(
        "{} event(s) (channel guess from file name: {})",
        events.len(),
        classify_feed_url(&file.to_string_lossy())
    );
    for event in &events {
        let info = extract_guest_info(event.summary.as_deref(), event.description.as_deref());
        println!(
            "  {}  {} -> {}  guest={} phone={}",
            event.uid,
            event.start.format("%Y-%m-%d %H:%M"),
            event.end.format("%Y-%m-%d %H:%M"),
            info.name,
            info.phone.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}
