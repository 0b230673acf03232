//! Status command - dry run of the staleness check

use super::build_setup;
use crate::ProjectArgs;
use anyhow::{Context, Result};
use kiln_build::{Builder, OutputMode, PlannedFile};

pub fn run(project: &ProjectArgs, json: bool) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to read working directory")?;
    let (config, compiler) = build_setup(project, &working_dir)?;

    let builder = Builder::new(config, compiler)
        .context("Failed to create builder")?
        .with_output_mode(OutputMode::Quiet);
    let plan = builder.plan().context("Status check failed")?;

    if json {
        println!("{}", plan_json(&plan));
    } else {
        for file in &plan {
            println!("{}", plan_line(file));
        }
        let stale = plan.iter().filter(|f| f.reason.is_some()).count();
        println!("{} of {} files would be rebuilt", stale, plan.len());
    }

    Ok(())
}

fn plan_line(file: &PlannedFile) -> String {
    match &file.reason {
        Some(reason) => format!(
            "{:<9} {} [{}] ({})",
            file.status(),
            file.key,
            file.strategy,
            reason
        ),
        None => format!("{:<9} {} [{}]", file.status(), file.key, file.strategy),
    }
}

fn plan_json(plan: &[PlannedFile]) -> serde_json::Value {
    let files: Vec<_> = plan
        .iter()
        .map(|file| {
            serde_json::json!({
                "file": file.key,
                "strategy": file.strategy.to_string(),
                "status": file.status(),
                "reason": file.reason.as_ref().map(|r| r.to_string()),
            })
        })
        .collect();
    serde_json::json!({ "files": files })
}
