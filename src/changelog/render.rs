use crate::changelog::{Changelog, ManagedChangelog};
use crate::error::Result;
use console::style;
use std::io::Write;

fn heading(changelog: &ManagedChangelog, content: &Changelog) -> String {
    match (&changelog.version, content.release_date) {
        (Some(version), Some(date)) => format!("{} ({})", version, date),
        (Some(version), None) => version.clone(),
        (None, _) => "Unreleased".to_string(),
    }
}

/// Human readable listing for the terminal
pub fn render_terminal(
    out: &mut dyn Write,
    changelog: &ManagedChangelog,
    content: &Changelog,
) -> Result<()> {
    writeln!(out, "{}", style(heading(changelog, content)).bold())?;
    for entry in &content.entries {
        writeln!(
            out,
            "  {} - {} ({})",
            style(&entry.kind).cyan().italic(),
            entry.description,
            style(&entry.author).yellow()
        )?;
    }
    Ok(())
}

fn anchor(reference: &str) -> String {
    let short = reference
        .rsplit('/')
        .next()
        .filter(|tail| !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()))
        .map(|number| format!("#{}", number))
        .unwrap_or_else(|| "Link".to_string());
    format!("<a href=\"{}\">{}</a>", reference, short)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Markdown section with an HTML table of entries
pub fn render_markdown(
    out: &mut dyn Write,
    changelog: &ManagedChangelog,
    content: &Changelog,
) -> Result<()> {
    writeln!(out, "## {}", heading(changelog, content))?;
    if changelog.version.is_none() && !changelog.exists() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "<table><tr><th>Type</th><th>Description</th><th>PR</th><th>Issues</th><th>Author</th></tr>"
    )?;
    for entry in &content.entries {
        let pr = entry.pr.as_deref().map(anchor).unwrap_or_default();
        let issues = entry
            .issues
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|issue| anchor(issue))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            out,
            "  <tr><td>{}</td><td>\n\n{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            capitalize(&entry.kind),
            entry.description,
            pr,
            issues,
            entry.authors().join(", ")
        )?;
    }
    writeln!(out, "</table>")?;
    Ok(())
}
