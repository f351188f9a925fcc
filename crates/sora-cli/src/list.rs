//! `--list` output.

use std::io::{self, Write};

use sora_models::HistoryEntry;

/// Print history, newest first, indexed the way `@N` references it.
pub fn write_history(entries: &[HistoryEntry], out: &mut dyn Write) -> io::Result<()> {
    if entries.is_empty() {
        writeln!(out, "No videos in history")?;
        return Ok(());
    }

    writeln!(out, "Video Generation History:\n")?;
    for (i, entry) in entries.iter().enumerate() {
        writeln!(out, "[{}] {}", i, entry.id)?;
        writeln!(out, "    Created: {}", entry.created_at)?;
        writeln!(out, "    Model:   {}", entry.model)?;
        writeln!(out, "    Prompt:  {}", entry.prompt)?;
        if !entry.output_file.is_empty() {
            writeln!(out, "    Output:  {}", entry.output_file)?;
        }
        if let Some(input) = &entry.image_input {
            writeln!(out, "    Image:   {}", input)?;
        }
        if let Some(source) = &entry.remixed_from {
            writeln!(out, "    Remix:   {}", source)?;
        }
        if let Some(error) = &entry.error {
            writeln!(out, "    Error:   {}", error)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
