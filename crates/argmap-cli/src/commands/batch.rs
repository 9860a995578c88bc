//! Batch command implementation.

use crate::cli::BatchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::runtime;
use argmap_builder::{BuildReport, DebateBatch, DebateManifest};
use argmap_store::{DebateLedger, GraphDocument, GraphExporter};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Execute the batch command.
pub async fn execute_batch(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let manifest = DebateManifest::from_toml(&fs::read_to_string(&args.manifest)?)
        .map_err(CliError::InvalidInput)?;

    let builder = Arc::new(runtime::debate_builder(config)?);
    let mut batch = DebateBatch::new(builder);
    if !args.no_ledger {
        let path = match &args.ledger {
            Some(path) => path.clone(),
            None => config.ledger()?,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        batch = batch.with_ledger(Arc::new(DebateLedger::open(&path)?));
    }

    let report = batch
        .run(&manifest.debates, Some(runtime::shutdown_signal()))
        .await?;

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
        for outcome in &report.outcomes {
            if let Ok(build) = &outcome.result {
                write_debate(dir, build)?;
            }
        }
    }

    println!("{}", formatter.format_batch(&report)?);
    if report.cancelled {
        eprintln!("{}", formatter.warning("Batch cancelled; rerun to resume"));
    } else if report.failed() > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} debates failed; rerun to retry them",
                report.failed()
            ))
        );
    } else {
        eprintln!(
            "{}",
            formatter.success(&format!("{} debates built", report.built()))
        );
    }

    Ok(())
}

/// Write `<id>.json` and `<id>.txt` for a built debate.
fn write_debate(dir: &Path, build: &BuildReport) -> Result<()> {
    let json = GraphDocument::from_graph(&build.graph).to_json()?;
    fs::write(dir.join(format!("{}.json", build.debate_id)), json)?;
    let outline = GraphExporter::new(&build.graph).outline()?;
    fs::write(dir.join(format!("{}.txt", build.debate_id)), outline)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmap_builder::BuildStats;
    use argmap_domain::Valence;
    use argmap_store::ArgumentGraph;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_write_debate() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("Uniforms should be mandatory.", "").unwrap();
        graph
            .add_child("They reduce bullying.", "Bullying", root, Valence::Pro, 0)
            .unwrap();
        let build = BuildReport {
            debate_id: "uniforms".into(),
            graph,
            states: HashMap::new(),
            stats: BuildStats::default(),
            elapsed: Duration::ZERO,
        };

        write_debate(dir.path(), &build).unwrap();

        let outline = fs::read_to_string(dir.path().join("uniforms.txt")).unwrap();
        assert!(outline.contains("1.1. PRO: They reduce bullying."));
        let json = fs::read_to_string(dir.path().join("uniforms.json")).unwrap();
        assert_eq!(
            GraphDocument::from_json(&json).unwrap().into_graph().unwrap().edge_count(),
            1
        );
    }
}
