use crate::model::{PluginRecord, RootStatus, ScanReport};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct PluginRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Identifier")]
    manufacturer: String,
}

#[derive(Tabled)]
struct RootRow {
    #[tabled(rename = "Root")]
    path: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if report.records.is_empty() {
        println!("No plugins found.");
    } else {
        println!("Found {} plugins:", report.records.len());
        println!();

        let rows: Vec<PluginRow> = report
            .records
            .iter()
            .map(|r| PluginRow {
                kind: r.kind.display_name().to_string(),
                name: truncate(&r.name, 40),
                version: r.version().unwrap_or("-").to_string(),
                domain: r
                    .domain
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                manufacturer: truncate(r.manufacturer().unwrap_or("-"), 40),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    if report
        .roots
        .iter()
        .any(|r| !matches!(r.status, RootStatus::Scanned { .. }))
    {
        println!();
        let rows: Vec<RootRow> = report
            .roots
            .iter()
            .map(|r| RootRow {
                path: r.path.display().to_string(),
                domain: r.domain.to_string(),
                status: format_status(&r.status),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    if let Some(error) = &report.error {
        println!();
        println!("Warning: {}", error);
    }

    Ok(())
}

/// Prints the detail view for a single plugin.
pub fn print_plugin_detail(record: &PluginRecord) {
    let field = |label: &str, value: Option<&str>| {
        println!("  {:<14} {}", label, value.unwrap_or("-"));
    };

    println!();
    println!("{}", record.name);
    println!();
    field("Kind:", Some(record.kind.display_name()));
    field("Path:", Some(record.identity.to_string_lossy().as_ref()));
    field("Domain:", record.domain.map(|d| d.as_str()));
    field("Version:", record.version());
    field("Identifier:", record.manufacturer());
    field("Description:", record.description());
    if !record.identity.exists() {
        println!();
        println!("  (bundle no longer exists on disk)");
    }
}

fn format_status(status: &RootStatus) -> String {
    match status {
        RootStatus::Scanned { count } => format!("{} plugins", count),
        RootStatus::Partial { count } => format!("{} plugins (incomplete)", count),
        RootStatus::Denied => "access denied".to_string(),
        RootStatus::Cancelled => "access cancelled".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Reverb", 10), "Reverb");
        assert_eq!(truncate("A Very Long Plugin Name", 10), "A Very ...");
    }

    #[test]
    fn test_format_status() {
        assert_eq!(format_status(&RootStatus::Scanned { count: 3 }), "3 plugins");
        assert_eq!(format_status(&RootStatus::Denied), "access denied");
    }
}
