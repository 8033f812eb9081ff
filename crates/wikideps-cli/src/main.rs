//! Wiki-Diagrams dependency doctor
//!
//! The `wikideps` command verifies and self-heals the toolchain used to
//! render the wiki's diagrams, provisions the GitHub App key, and runs the
//! render pipeline.
//!
//! ## Commands
//!
//! - `deps`: all toolchain dependencies (full, verify-only, or CI minimal)
//! - `go`, `mermaid`, `git`, `docker`: one tool at a time
//! - `diagrams`: extract and render Mermaid diagrams
//! - `pipeline`: deps, clean, then render everything

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use wikideps_core::{plans, Dependency, DepsConfig, Mode, RunReport, Toolbox};
use wikideps_diagrams::{DiagramLayout, Renderer};

#[derive(Parser)]
#[command(name = "wikideps")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify, install and provision the Wiki-Diagrams toolchain", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines and JSON reports
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(long, global = true, env = "WIKIDEPS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// All toolchain dependencies: Go, Mermaid CLI, Git
    Deps {
        #[command(subcommand)]
        action: DepsAction,
    },

    /// Go toolchain
    Go {
        #[command(subcommand)]
        action: ToolAction,
    },

    /// Mermaid CLI and its system libraries
    Mermaid {
        #[command(subcommand)]
        action: MermaidAction,
    },

    /// Git availability and configuration
    Git {
        #[command(subcommand)]
        action: GitAction,
    },

    /// Docker Engine, Buildx and the GitHub App key
    Docker {
        #[command(subcommand)]
        action: DockerAction,
    },

    /// Diagram generation
    Diagrams {
        #[command(subcommand)]
        action: DiagramsAction,
    },

    /// Ensure dependencies, clean, then render every diagram
    Pipeline,
}

#[derive(Subcommand)]
enum DepsAction {
    /// Install what is missing, then verify everything
    All,
    /// Verify only; never installs
    Verify,
    /// Verify the steps that need no elevated privilege (CI)
    Minimal,
}

#[derive(Subcommand)]
enum ToolAction {
    /// Check the installed version against the pin
    Verify,
    /// Install the pinned version if verification fails
    Deps,
}

#[derive(Subcommand)]
enum MermaidAction {
    Verify,
    /// Install system libraries and the pinned CLI
    Deps,
    /// Print the installed CLI version
    Version,
    /// Install missing headless-browser libraries
    Syslibs,
}

#[derive(Subcommand)]
enum GitAction {
    Verify,
    /// Report the configured commit identity
    Config,
    Deps,
    /// Show branch, remote and last commit
    Info,
    /// Check that `origin` is reachable
    Remote,
}

#[derive(Subcommand)]
enum DockerAction {
    /// Check the engine, Buildx and the app key; changes nothing
    Verify,
    /// Install the engine and Buildx, publish the key, then verify
    Deps,
    /// Resolve the app key and publish it as a swarm secret
    Secrets,
}

#[derive(Subcommand)]
enum DiagramsAction {
    /// Render every Markdown source
    RenderAll,
    /// Render one diagram by name (without extension)
    Render { name: String },
    /// Remove generated output
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    wikideps_core::init_tracing(cli.json, level);

    let config = match &cli.config {
        Some(path) => DepsConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DepsConfig::from_env(),
    };
    let tools = Toolbox::system(config).context("Failed to initialise toolbox")?;

    match cli.command {
        Commands::Deps { action } => {
            let mode = match action {
                DepsAction::All => Mode::Full,
                DepsAction::Verify => Mode::VerifyOnly,
                DepsAction::Minimal => Mode::Minimal,
            };
            let report = plans::wiki_diagrams(&tools)
                .run(mode)
                .context("Dependency check failed")?;
            print_report(&report, cli.json)
        }
        Commands::Go { action } => {
            let go = tools.go();
            match action {
                ToolAction::Verify => go.verify().context("Go verification failed")?,
                ToolAction::Deps => go.ensure().context("Failed ensuring Go toolchain")?,
            }
            Ok(())
        }
        Commands::Mermaid { action } => cmd_mermaid(&tools, action, cli.json),
        Commands::Git { action } => cmd_git(&tools, action, cli.json),
        Commands::Docker { action } => cmd_docker(&tools, action, cli.json),
        Commands::Diagrams { action } => cmd_diagrams(&tools, action, cli.json),
        Commands::Pipeline => cmd_pipeline(&tools, cli.json),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    println!("Run {} ({}, {})", report.run_id, report.plan, report.mode);
    for step in &report.steps {
        println!("  {:?} {} ({} ms)", step.action, step.step, step.duration_ms);
    }
    println!("All {} steps passed", report.steps.len());
    Ok(())
}

fn cmd_mermaid(tools: &Toolbox, action: MermaidAction, json: bool) -> Result<()> {
    match action {
        MermaidAction::Verify => tools
            .mermaid()
            .verify()
            .context("Mermaid CLI verification failed")?,
        MermaidAction::Deps => tools
            .renderer()
            .ensure()
            .context("Failed ensuring Mermaid CLI")?,
        MermaidAction::Version => {
            let version = tools
                .mermaid()
                .resource()
                .installed_version()
                .context("Mermaid CLI not found in PATH")?;
            if json {
                print_json(&serde_json::json!({ "version": version }))?;
            } else {
                println!("Mermaid CLI version: {version}");
            }
        }
        MermaidAction::Syslibs => {
            let installed = tools
                .system_libraries()
                .ensure_present()
                .context("System library installation failed")?;
            if json {
                print_json(&serde_json::json!({ "installed": installed }))?;
            } else if installed.is_empty() {
                println!("All required system libraries are installed");
            } else {
                println!("Installed: {}", installed.join(" "));
            }
        }
    }
    Ok(())
}

fn cmd_git(tools: &Toolbox, action: GitAction, json: bool) -> Result<()> {
    let git = tools.git();
    match action {
        GitAction::Verify => git.verify().context("Git verification failed")?,
        GitAction::Deps => git.ensure().context("Git verification failed")?,
        GitAction::Config => {
            let identity = git.report_identity();
            if json {
                print_json(&identity)?;
            }
        }
        GitAction::Info => {
            let repo = git.repo_info();
            if json {
                print_json(&repo)?;
            } else {
                println!("Branch:      {}", repo.branch);
                println!("Remote:      {}", repo.remote);
                println!("Last Commit: {}", repo.last_commit);
                println!("Checked:     {}", repo.checked_at.to_rfc2822());
            }
        }
        GitAction::Remote => {
            let bytes = git
                .check_remote()
                .context("Failed to reach GitHub remote")?;
            println!("GitHub remote accessible ({bytes} bytes returned)");
        }
    }
    Ok(())
}

fn cmd_docker(tools: &Toolbox, action: DockerAction, json: bool) -> Result<()> {
    match action {
        DockerAction::Verify => {
            let report = plans::container(tools)
                .run(Mode::VerifyOnly)
                .context("Docker verification failed")?;
            print_report(&report, json)
        }
        DockerAction::Deps => {
            let report = plans::container(tools)
                .run(Mode::Full)
                .context("Failed ensuring Docker environment")?;
            print_report(&report, json)
        }
        DockerAction::Secrets => {
            let artifact = tools
                .resolver()
                .resolve()
                .context("Failed resolving GitHub App key")?;
            let outcome = tools
                .provisioner()
                .provision(&artifact)
                .context("Failed ensuring GitHub App key secret")?;
            if json {
                print_json(&serde_json::json!({ "key": artifact, "outcome": outcome }))
            } else {
                println!("{} ({}): {:?}", artifact.path.display(), artifact.origin, outcome);
                Ok(())
            }
        }
    }
}

fn renderer(tools: &Toolbox) -> Renderer {
    Renderer::new(DiagramLayout::default(), tools.runner())
}

fn cmd_diagrams(tools: &Toolbox, action: DiagramsAction, json: bool) -> Result<()> {
    let renderer = renderer(tools);
    match action {
        DiagramsAction::Clean => renderer.clean().context("Failed to clean diagrams")?,
        DiagramsAction::RenderAll => {
            require_renderer(tools)?;
            let rendered = renderer.render_all().context("Diagram rendering failed")?;
            print_rendered(&rendered, json)?;
        }
        DiagramsAction::Render { name } => {
            require_renderer(tools)?;
            let image = renderer
                .render_one(&name)
                .with_context(|| format!("Failed to render {name}"))?;
            print_rendered(&[image], json)?;
        }
    }
    Ok(())
}

fn require_renderer(tools: &Toolbox) -> Result<()> {
    tools
        .mermaid()
        .verify()
        .context("Mermaid CLI is not ready; run `wikideps mermaid deps`")
}

fn print_rendered(images: &[PathBuf], json: bool) -> Result<()> {
    if json {
        return print_json(&images);
    }
    for image in images {
        println!("Generated: {}", image.display());
    }
    Ok(())
}

fn cmd_pipeline(tools: &Toolbox, json: bool) -> Result<()> {
    info!("running full pipeline: deps, clean, render-all");
    plans::wiki_diagrams(tools)
        .run(Mode::Full)
        .context("Dependency check failed")?;

    let renderer = renderer(tools);
    renderer.clean().context("Failed to clean diagrams")?;
    let rendered = renderer.render_all().context("Diagram rendering failed")?;
    print_rendered(&rendered, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_nested_commands() {
        let cli = Cli::try_parse_from(["wikideps", "--json", "deps", "minimal"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Deps {
                action: DepsAction::Minimal
            }
        ));

        let cli = Cli::try_parse_from(["wikideps", "diagrams", "render", "flow", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Diagrams { action: DiagramsAction::Render { ref name } } if name == "flow"
        ));

        let cli = Cli::try_parse_from(["wikideps", "mermaid", "syslibs"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mermaid {
                action: MermaidAction::Syslibs
            }
        ));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["wikideps", "deps", "everything"]).is_err());
        assert!(Cli::try_parse_from(["wikideps", "diagrams", "render"]).is_err());
    }
}
