//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use argmap_builder::BatchReport;
use argmap_store::{ArgumentGraph, GraphDocument, GraphExporter};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a debate graph.
    pub fn format_graph(&self, graph: &ArgumentGraph, title: Option<&str>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(GraphDocument::from_graph(graph).to_json()?),
            OutputFormat::Outline => {
                let exporter = GraphExporter::new(graph);
                let outline = match title {
                    Some(title) => exporter.outline_with_title(title)?,
                    None => exporter.outline()?,
                };
                Ok(self.colorize_outline(&outline))
            }
        }
    }

    /// Highlight valence prefixes.
    fn colorize_outline(&self, outline: &str) -> String {
        if !self.color_enabled {
            return outline.to_string();
        }
        outline
            .lines()
            .map(|line| {
                if let Some((number, claim)) = line.split_once(" PRO: ") {
                    format!("{} {} {}", number.dimmed(), "PRO:".green().bold(), claim)
                } else if let Some((number, claim)) = line.split_once(" CON: ") {
                    format!("{} {} {}", number.dimmed(), "CON:".red().bold(), claim)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Format the summary of a batch run.
    pub fn format_batch(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_batch_json(report),
            OutputFormat::Outline => Ok(self.format_batch_table(report)),
        }
    }

    fn format_batch_json(&self, report: &BatchReport) -> Result<String> {
        let outcomes: Vec<serde_json::Value> = report
            .outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(build) => serde_json::json!({
                    "debate_id": o.debate_id,
                    "status": "built",
                    "nodes": build.graph.node_count(),
                    "edges": build.graph.edge_count(),
                    "merges": build.stats.merges,
                    "failed_nodes": build.stats.failed_nodes,
                    "unindexed_nodes": build.stats.unindexed_nodes,
                    "seconds": build.elapsed.as_secs_f64(),
                }),
                Err(e) => serde_json::json!({
                    "debate_id": o.debate_id,
                    "status": "failed",
                    "error": e,
                }),
            })
            .collect();

        Ok(serde_json::to_string_pretty(&serde_json::json!({
            "outcomes": outcomes,
            "skipped": report.skipped,
            "cancelled": report.cancelled,
        }))?)
    }

    fn format_batch_table(&self, report: &BatchReport) -> String {
        if report.outcomes.is_empty() && report.skipped.is_empty() {
            return self.colorize("No debates to build.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Debate", "Status", "Nodes", "Edges", "Merges", "Time"]);

        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(build) => builder.push_record([
                    outcome.debate_id.clone(),
                    "built".to_string(),
                    build.graph.node_count().to_string(),
                    build.graph.edge_count().to_string(),
                    build.stats.merges.to_string(),
                    format!("{:.1}s", build.elapsed.as_secs_f64()),
                ]),
                Err(e) => builder.push_record([
                    outcome.debate_id.clone(),
                    format!("failed: {}", e),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]),
            }
        }
        for debate_id in &report.skipped {
            builder.push_record([debate_id.as_str(), "skipped", "-", "-", "-", "-"]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmap_builder::{BuildReport, BuildStats, DebateOutcome};
    use argmap_domain::Valence;
    use std::collections::HashMap;
    use std::time::Duration;

    fn create_test_graph() -> ArgumentGraph {
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("We should tax carbon emissions.", "Carbon tax").unwrap();
        graph
            .add_child("It funds green infrastructure.", "Revenue", root, Valence::Pro, 0)
            .unwrap();
        graph
            .add_child("It burdens low-income households.", "Cost", root, Valence::Con, 0)
            .unwrap();
        graph
    }

    #[test]
    fn test_outline_format() {
        let formatter = Formatter::new(OutputFormat::Outline, false);
        let output = formatter.format_graph(&create_test_graph(), None).unwrap();
        assert_eq!(
            output,
            "1. We should tax carbon emissions.\n\
             1.1. PRO: It funds green infrastructure.\n\
             1.2. CON: It burdens low-income households.\n"
        );
    }

    #[test]
    fn test_outline_with_title() {
        let formatter = Formatter::new(OutputFormat::Outline, false);
        let output = formatter
            .format_graph(&create_test_graph(), Some("Carbon pricing"))
            .unwrap();
        assert!(output.starts_with("Discussion Title: Carbon pricing\n\n1. "));
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_graph(&create_test_graph(), None).unwrap();
        let restored = GraphDocument::from_json(&output).unwrap().into_graph().unwrap();
        assert_eq!(restored.node_count(), 3);
        assert!(output.contains("\"valence\": \"CON\""));
    }

    #[test]
    fn test_batch_table() {
        let formatter = Formatter::new(OutputFormat::Outline, false);
        let report = BatchReport {
            outcomes: vec![
                DebateOutcome {
                    debate_id: "carbon-tax".into(),
                    result: Ok(BuildReport {
                        debate_id: "carbon-tax".into(),
                        graph: create_test_graph(),
                        states: HashMap::new(),
                        stats: BuildStats::default(),
                        elapsed: Duration::from_millis(1500),
                    }),
                },
                DebateOutcome {
                    debate_id: "broken".into(),
                    result: Err("empty motion".into()),
                },
            ],
            skipped: vec!["uniforms".into()],
            cancelled: false,
        };
        let output = formatter.format_batch(&report).unwrap();
        assert!(output.contains("carbon-tax"));
        assert!(output.contains("failed: empty motion"));
        assert!(output.contains("skipped"));
        assert!(output.contains("1.5s"));
    }

    #[test]
    fn test_empty_batch() {
        let formatter = Formatter::new(OutputFormat::Outline, false);
        let output = formatter.format_batch(&BatchReport::default()).unwrap();
        assert!(output.contains("No debates to build"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Outline, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
