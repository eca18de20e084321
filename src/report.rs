use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::planner::SyncPlan;

/// Output format for a plan report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(anyhow!(
                "Unknown report format '{other}' (expected console, json, or markdown)"
            )),
        }
    }
}

/// Serializable summary of a sync plan.
///
/// Entries are sorted by item name so the report is stable across runs
/// even though plan bucket order is not.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanReport {
    /// ISO 8601 timestamp of when the report was generated
    pub timestamp: String,

    pub create_count: usize,
    pub update_count: usize,
    pub delete_count: usize,

    pub creates: Vec<PlanEntry>,
    pub updates: Vec<UpdateEntry>,
    pub deletes: Vec<PlanEntry>,
}

/// One item headed for creation or deletion.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// One source/destination pair headed for update.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<String>,
}

impl PlanReport {
    /// Build a report from a computed plan.
    pub fn from_plan(plan: &SyncPlan) -> Self {
        let mut creates: Vec<PlanEntry> = plan
            .to_create
            .iter()
            .map(|item| PlanEntry {
                name: item.name.clone(),
                id: item.id.clone(),
            })
            .collect();
        creates.sort_by(|a, b| a.name.cmp(&b.name));

        let mut updates: Vec<UpdateEntry> = plan
            .to_update
            .iter()
            .map(|(src, dst)| UpdateEntry {
                name: src.name.clone(),
                source_id: src.id.clone(),
                destination_id: dst.id.clone(),
            })
            .collect();
        updates.sort_by(|a, b| a.name.cmp(&b.name));

        let mut deletes: Vec<PlanEntry> = plan
            .to_delete
            .iter()
            .map(|item| PlanEntry {
                name: item.name.clone(),
                id: item.id.clone(),
            })
            .collect();
        deletes.sort_by(|a, b| a.name.cmp(&b.name));

        PlanReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            create_count: creates.len(),
            update_count: updates.len(),
            delete_count: deletes.len(),
            creates,
            updates,
            deletes,
        }
    }

    fn is_empty(&self) -> bool {
        self.create_count == 0 && self.update_count == 0 && self.delete_count == 0
    }

    /// Print the report to stdout with color.
    pub fn print_console(&self) {
        println!("{}", "=== Vault Sync Plan (dry run) ===".bold().cyan());
        println!("  Create: {}", self.create_count);
        println!("  Update: {}", self.update_count);
        println!("  Delete: {}", self.delete_count);
        println!();

        for entry in &self.creates {
            println!("{} {}", "[CREATE]".green().bold(), entry.name);
        }
        for entry in &self.updates {
            println!("{} {}", "[UPDATE]".yellow().bold(), entry.name);
        }
        for entry in &self.deletes {
            println!("{} {}", "[DELETE]".red().bold(), entry.name);
        }

        println!();
        if self.is_empty() {
            println!("{}", "Vaults are already in sync.".green());
        } else {
            println!(
                "{}",
                "Sync planning complete; no changes were applied.".bold()
            );
        }
    }

    /// Render the console report without color, for writing to a file.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "=== Vault Sync Plan (dry run) ===");
        let _ = writeln!(text, "  Create: {}", self.create_count);
        let _ = writeln!(text, "  Update: {}", self.update_count);
        let _ = writeln!(text, "  Delete: {}", self.delete_count);
        let _ = writeln!(text);

        for entry in &self.creates {
            let _ = writeln!(text, "[CREATE] {}", entry.name);
        }
        for entry in &self.updates {
            let _ = writeln!(text, "[UPDATE] {}", entry.name);
        }
        for entry in &self.deletes {
            let _ = writeln!(text, "[DELETE] {}", entry.name);
        }

        text
    }

    /// Render the report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize plan report")
    }

    /// Render the report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# Vault Sync Plan (dry run)");
        let _ = writeln!(md);
        let _ = writeln!(md, "Generated: {}", self.timestamp);
        let _ = writeln!(md);
        let _ = writeln!(md, "| Action | Count |");
        let _ = writeln!(md, "|--------|-------|");
        let _ = writeln!(md, "| Create | {} |", self.create_count);
        let _ = writeln!(md, "| Update | {} |", self.update_count);
        let _ = writeln!(md, "| Delete | {} |", self.delete_count);

        let update_names: Vec<&String> = self.updates.iter().map(|e| &e.name).collect();
        for (heading, names) in [
            ("Create", self.creates.iter().map(|e| &e.name).collect()),
            ("Update", update_names),
            ("Delete", self.deletes.iter().map(|e| &e.name).collect()),
        ] {
            if !names.is_empty() {
                let _ = writeln!(md);
                let _ = writeln!(md, "## {heading}");
                let _ = writeln!(md);
                for name in names {
                    let _ = writeln!(md, "- {name}");
                }
            }
        }

        md
    }
}

/// Emit a plan in the requested format, to stdout or a file.
pub fn emit(plan: &SyncPlan, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let report = PlanReport::from_plan(plan);

    let rendered = match format {
        // A plain console report on stdout keeps its color; written to a
        // file it becomes the uncolored text rendering
        ReportFormat::Console if output.is_none() => {
            report.print_console();
            return Ok(());
        }
        ReportFormat::Console => report.to_text(),
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Markdown => report.to_markdown(),
    };

    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
