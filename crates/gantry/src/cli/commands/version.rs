//! Version command

use clap::Args;

use gantry_changelog::load_annotations;
use gantry_core::config::load_config;
use gantry_core::discover::Discoverer;
use gantry_git::{module_tag, GitRepo, ModuleTags};
use gantry_release::{build_release_manifest, calculate, next_release_id, SystemClock};

use crate::cli::{output, Cli, OutputFormat};

/// Placeholder for modules that have never been tagged.
const UNRELEASED_VERSION: &str = "v0.0.0-00010101000000-000000000000";

/// Show a module's current or projected version
#[derive(Debug, Args)]
pub struct VersionCommand {
    /// Relative repository path of the module
    #[arg(default_value = ".")]
    pub module: String,

    /// Print the projected version tag after the next release
    #[arg(long)]
    pub unreleased: bool,

    /// Calculate a pre-release with this identifier, with --unreleased
    #[arg(long)]
    pub preview: Option<String>,
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let repo = GitRepo::discover(&cwd)?;
        let root = repo.workdir().to_path_buf();

        let config = load_config(&root)?;
        let discoverer = Discoverer::discover(&root)?;
        let tags = repo.tags()?;
        let module_tags = ModuleTags::parse(&tags);
        let annotations = load_annotations(&root)?;

        let release = calculate(&discoverer, &repo, &module_tags, &config, &annotations)?;

        if self.unreleased {
            let id = next_release_id(&tags, &SystemClock);
            let manifest = build_release_manifest(
                &release.tree,
                &id,
                &release.modules,
                false,
                self.preview.as_deref(),
            )?;

            if let Some(entry) = manifest.modules.get(&self.module) {
                let tag = module_tag(&self.module, &entry.to)?;
                self.print(&tag, cli)?;
                return Ok(());
            }
            // not part of the next release; fall through to the current version
        }

        let record = release
            .modules
            .values()
            .find(|r| r.rel_repo_path == self.module)
            .ok_or_else(|| anyhow::anyhow!("module not found: {}", self.module))?;

        let version = record.latest.as_deref().unwrap_or(UNRELEASED_VERSION);
        self.print(version, cli)?;
        Ok(())
    }

    fn print(&self, version: &str, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "module": self.module,
                    "version": version,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            OutputFormat::Text if cli.verbose => {
                println!("{}", output::key_value(&self.module, version));
            }
            OutputFormat::Text => println!("{version}"),
        }
        Ok(())
    }
}
