//! XMLTV document writer.
//!
//! Produces the `e.xml` document: a `<tv>` root carrying provenance
//! attributes, every `<channel>` first, then every `<programme>`. Output is
//! tab-indented with one element per line.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::Guide;

/// Language tag attached to display names and titles.
pub const LANG: &str = "zh";

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Escape text for use in element content or a double-quoted attribute.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // XML 1.0 forbids most C0 controls outright.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

/// Render a guide as an XMLTV document.
#[must_use]
pub fn render(guide: &Guide) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    if write_document(&mut out, guide).is_err() {
        out.clear();
    }
    out
}

fn write_document(out: &mut String, guide: &Guide) -> std::fmt::Result {
    writeln!(out, "{DECLARATION}")?;
    write!(
        out,
        r#"<tv info-name="{}" info-url="{}" data-from="{}""#,
        escape(&guide.info_name),
        escape(&guide.info_url),
        escape(&guide.data_from),
    )?;

    if guide.is_empty() {
        return writeln!(out, "/>");
    }
    writeln!(out, ">")?;

    for channel in &guide.channels {
        writeln!(out, "\t<channel id=\"{}\">", escape(&channel.id))?;
        writeln!(
            out,
            "\t\t<display-name lang=\"{LANG}\">{}</display-name>",
            escape(&channel.display_name)
        )?;
        writeln!(out, "\t</channel>")?;
    }

    for prog in &guide.programmes {
        writeln!(
            out,
            "\t<programme channel=\"{}\" start=\"{}\" stop=\"{}\">",
            escape(&prog.channel),
            escape(&prog.start),
            escape(&prog.stop),
        )?;
        writeln!(out, "\t\t<title lang=\"{LANG}\">{}</title>", escape(&prog.title))?;
        writeln!(out, "\t</programme>")?;
    }

    writeln!(out, "</tv>")
}

/// Render `guide` and write it to `path`.
///
/// The document is first written to a sibling temporary file and then
/// renamed over `path`, so readers of a published file never observe a
/// partially written guide. Missing parent directories are created.
pub fn write_file(guide: &Guide, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, render(guide))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            log::warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
        }
        return Err(e.into());
    }

    log::debug!(
        "Wrote {} channels / {} programmes to {}",
        guide.channel_count(),
        guide.programme_count(),
        path.display()
    );
    Ok(())
}
