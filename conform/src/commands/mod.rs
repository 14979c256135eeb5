// conform/src/commands/mod.rs

pub mod check;
pub mod list;
pub mod references;
pub mod run;

use anyhow::Context;
use std::path::Path;

use conform_core::infrastructure::config::{Project, load_project};

pub(crate) fn load(project_dir: &Path) -> anyhow::Result<Project> {
    println!("⚙️  Loading configuration...");
    load_project(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })
}
