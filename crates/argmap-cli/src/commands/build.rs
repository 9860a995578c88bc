//! Build command implementation.

use crate::cli::BuildArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::runtime;
use argmap_builder::{DebateSpec, Motion};
use argmap_store::GraphDocument;
use std::fs;

/// Execute the build command.
pub async fn execute_build(args: BuildArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let spec = debate_spec(&args)?;
    let builder = runtime::debate_builder(config)?;

    let report = builder
        .build_debate(&spec, Some(runtime::shutdown_signal()))
        .await?;

    if let Some(path) = &args.output {
        fs::write(path, GraphDocument::from_graph(&report.graph).to_json()?)?;
        eprintln!(
            "{}",
            formatter.success(&format!("Graph written to {}", path.display()))
        );
    }

    let title = args.title.as_deref();
    println!("{}", formatter.format_graph(&report.graph, title)?.trim_end());
    eprintln!(
        "{}",
        formatter.success(&format!(
            "Built '{}': {} nodes, {} edges, {} merges in {:.1}s",
            report.debate_id,
            report.graph.node_count(),
            report.graph.edge_count(),
            report.stats.merges,
            report.elapsed.as_secs_f64()
        ))
    );
    if report.stats.failed_nodes > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} nodes were left as leaves after failures",
                report.stats.failed_nodes
            ))
        );
    }
    if report.stats.unindexed_nodes > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} nodes are missing from the similarity index; duplicates of them were not merged",
                report.stats.unindexed_nodes
            ))
        );
    }

    Ok(())
}

/// Turn command-line arguments into a debate definition.
fn debate_spec(args: &BuildArgs) -> Result<DebateSpec> {
    let motion = args.motion.trim();
    if motion.is_empty() {
        return Err(CliError::InvalidInput("motion must not be empty".into()));
    }
    let spec = DebateSpec {
        debate_id: args.id.clone().unwrap_or_else(|| slug(motion)),
        topic: args.topic.clone().unwrap_or_else(|| motion.to_string()),
        motion: Motion {
            claim: motion.to_string(),
            label: args.label.clone(),
        },
        tags: args
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        degree_config: args.degrees.clone(),
    };
    spec.validate().map_err(CliError::InvalidInput)?;
    Ok(spec)
}

/// Lowercase, dash-separated identifier derived from text.
fn slug(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(8)
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        "debate".to_string()
    } else {
        words.join("-")
    }
}
