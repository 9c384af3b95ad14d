//! Calculate command

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use gantry_changelog::load_annotations;
use gantry_core::config::load_config;
use gantry_core::discover::Discoverer;
use gantry_git::{GitRepo, ModuleTags};
use gantry_release::{build_release_manifest, calculate, next_release_id, SystemClock};

use crate::cli::{output, Cli};

/// Calculate the next release and emit its manifest
#[derive(Debug, Args)]
pub struct CalculateCommand {
    /// Write the manifest to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Calculate a pre-release with this identifier for all modules
    #[arg(long)]
    pub preview: Option<String>,
}

impl CalculateCommand {
    /// Execute the calculate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let repo = GitRepo::discover(&cwd)?;
        let root = repo.workdir().to_path_buf();

        let config = load_config(&root)?;
        let discoverer = Discoverer::discover(&root)?;
        let tags = repo.tags()?;
        let module_tags = ModuleTags::parse(&tags);
        let annotations = load_annotations(&root)?;

        info!("calculating module changes");
        let release = calculate(&discoverer, &repo, &module_tags, &config, &annotations)?;

        let id = next_release_id(&tags, &SystemClock);
        let manifest = build_release_manifest(
            &release.tree,
            &id,
            &release.modules,
            cli.verbose,
            self.preview.as_deref(),
        )?;

        let json = serde_json::to_string_pretty(&manifest)?;
        match &self.output {
            Some(path) => {
                std::fs::write(path, format!("{json}\n"))?;
                output::success(&format!("wrote release manifest to {}", path.display()));
            }
            None => println!("{json}"),
        }

        Ok(())
    }
}
