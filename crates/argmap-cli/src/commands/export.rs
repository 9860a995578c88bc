//! Export command implementation.

use crate::cli::ExportArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use argmap_store::{ArgumentGraph, DebateLedger, GraphDocument};
use std::fs;

/// Execute the export command.
pub async fn execute_export(args: ExportArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let graph = load_graph(&args, config)?;
    println!(
        "{}",
        formatter.format_graph(&graph, args.title.as_deref())?.trim_end()
    );
    Ok(())
}

/// Read a graph from a file or from the ledger.
fn load_graph(args: &ExportArgs, config: &Config) -> Result<ArgumentGraph> {
    let json = match (&args.input, &args.debate) {
        (Some(path), _) => fs::read_to_string(path)?,
        (None, Some(debate_id)) => {
            let path = match &args.ledger {
                Some(path) => path.clone(),
                None => config.ledger()?,
            };
            DebateLedger::open(&path)?
                .graph_json(debate_id)?
                .ok_or_else(|| CliError::NotFound(debate_id.clone()))?
        }
        (None, None) => {
            return Err(CliError::InvalidInput(
                "either a graph file or --debate is required".into(),
            ))
        }
    };
    Ok(GraphDocument::from_json(&json)?.into_graph()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmap_domain::Valence;

    fn sample_json() -> String {
        let mut graph = ArgumentGraph::new();
        let root = graph.create_root("We should tax carbon emissions.", "").unwrap();
        graph
            .add_child("It burdens low-income households.", "Cost", root, Valence::Con, 0)
            .unwrap();
        GraphDocument::from_graph(&graph).to_json().unwrap()
    }

    fn args(input: Option<std::path::PathBuf>, debate: Option<&str>, ledger: Option<std::path::PathBuf>) -> ExportArgs {
        ExportArgs {
            input,
            debate: debate.map(str::to_string),
            ledger,
            title: None,
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, sample_json()).unwrap();

        let graph = load_graph(&args(Some(path), None, None), &Config::default()).unwrap();
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_load_from_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.db");
        {
            let ledger = DebateLedger::open(&ledger_path).unwrap();
            ledger.register("carbon-tax").unwrap();
            ledger.mark_built("carbon-tax", &sample_json()).unwrap();
        }

        let config = Config::default();
        let graph = load_graph(&args(None, Some("carbon-tax"), Some(ledger_path.clone())), &config)
            .unwrap();
        assert_eq!(graph.edge_count(), 1);

        let missing = load_graph(&args(None, Some("unknown"), Some(ledger_path)), &config);
        assert!(matches!(missing, Err(CliError::NotFound(_))));
    }
}
