use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use workflow::config::{ScriptSource, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline driver for scripted per-ray field editing")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    sweeps: usize,
    #[arg(long, default_value_t = 360)]
    rays: usize,
    #[arg(long, default_value_t = 400)]
    gates: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Per-ray script file, overriding the workflow's
    #[arg(long)]
    script: Option<PathBuf>,
    /// One-time setup script file, overriding the workflow's
    #[arg(long)]
    once: Option<PathBuf>,
    /// Generate a tail-radar volume with georeferenced rays
    #[arg(long, default_value_t = false)]
    airborne: bool,
    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.sweeps, args.rays, args.gates, args.seed)
    };
    if let Some(path) = args.script {
        workflow_config.for_each_ray = ScriptSource::from_path(path);
    }
    if let Some(path) = args.once {
        workflow_config.once = ScriptSource::from_path(path);
    }
    if args.airborne {
        workflow_config.generator.airborne = true;
    }

    let result = Runner::new(workflow_config).execute()?;
    let report = &result.report;
    println!(
        "Per-ray run -> processed {}, failed {}, fields committed {}, masks computed {}",
        report.rays_processed, report.rays_failed, report.fields_committed, report.masks_computed
    );
    println!(
        "committed fields: {:?}",
        report.committed_fields.iter().collect::<Vec<_>>()
    );
    for failure in report.failures.iter().take(10) {
        println!(
            "  ray {} [{:?}] {}",
            failure.ray_index, failure.kind, failure.message
        );
    }

    if let Some(path) = args.report {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = report.to_json().context("serializing run report")?;
        fs::write(&path, json).with_context(|| format!("writing report {}", path.display()))?;
    }

    Ok(())
}
