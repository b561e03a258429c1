//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Layers { file }) => cmd_layers(cli, file),
        Some(Commands::Tree { file }) => cmd_tree(cli, file),
        Some(Commands::Export { file, frames }) => cmd_export(cli, file, frames),
        Some(Commands::Normalize { file, output }) => cmd_normalize(cli, file, output.as_deref()),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `sozi --help`".to_string(),
        )),
    }
}

/// Local config directory: `-C` if given, else the document's directory.
fn local_dir(cli: &Cli, file: Option<&Path>) -> Option<PathBuf> {
    cli.config_dir.clone().or_else(|| {
        file.and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    })
}

fn container_for(cli: &Cli, file: Option<&Path>) -> CliResult<ServiceContainer> {
    let local = local_dir(cli, file);
    debug!(local = ?local, "loading settings");
    let settings = Settings::load(local.as_deref())?;
    Ok(ServiceContainer::new(settings))
}

#[instrument(skip(cli))]
fn cmd_layers(cli: &Cli, file: &Path) -> CliResult<()> {
    let container = container_for(cli, Some(file))?;
    let service = container.presentation_service();
    let presentation = service.open(file)?;

    output::header(&format!(
        "{} ({} layers)",
        file.display(),
        presentation.layer_count()
    ));
    for overview in service.overview(&presentation) {
        let layer = &overview.layer;
        let kind = if layer.auto { "auto" } else { "explicit" };
        output::detail(&format!(
            "{:<36} {:<8} {} ({} members)",
            layer.id,
            kind,
            layer.label,
            overview.members.len()
        ));
    }
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_tree(cli: &Cli, file: &Path) -> CliResult<()> {
    let container = container_for(cli, Some(file))?;
    let service = container.presentation_service();
    let presentation = service.open(file)?;

    let tree = Tree::new(file.display().to_string()).with_leaves(
        service.overview(&presentation).into_iter().map(|overview| {
            let kind = if overview.layer.auto { "auto" } else { "explicit" };
            Tree::new(format!("{} [{}]", overview.layer.label, kind)).with_leaves(overview.members)
        }),
    );
    output::info(&tree);
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_export(cli: &Cli, file: &Path, frames: &[String]) -> CliResult<()> {
    let container = container_for(cli, Some(file))?;
    let service = container.presentation_service();
    let presentation = service.open(file)?;
    service.add_frames(&presentation, frames)?;
    output::info(&service.export_toml(&presentation)?);
    Ok(())
}

#[instrument(skip(cli))]
fn cmd_normalize(cli: &Cli, file: &Path, target: Option<&Path>) -> CliResult<()> {
    let container = container_for(cli, Some(file))?;
    let service = container.presentation_service();
    let presentation = service.open(file)?;
    match target {
        Some(path) => {
            service.save_svg(&presentation, path)?;
            output::success(&format!(
                "{} layers written to {}",
                presentation.layer_count(),
                path.display()
            ));
        }
        None => output::info(service.render_svg(&presentation).trim_end()),
    }
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let local = local_dir(cli, None);
            let settings = Settings::load(local.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &describe_path(&path)),
                None => output::warning("no global config directory on this platform"),
            }
            if let Some(dir) = local_dir(cli, None) {
                output::action("local", &describe_path(&local_config_path(&dir)));
            }
        }
        ConfigCommands::Init { global } => {
            let target = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no global config directory on this platform".into())
                })?
            } else {
                let dir = local_dir(cli, None).unwrap_or_else(|| PathBuf::from("."));
                local_config_path(&dir)
            };
            let container = ServiceContainer::new(Settings::default());
            if container.fs.exists(&target) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    target.display()
                )));
            }
            container
                .fs
                .write(&target, &Settings::template())
                .map_err(|e| {
                    crate::infrastructure::InfraError::io(
                        format!("write {}", target.display()),
                        e,
                    )
                })?;
            output::success(&format!("created {}", target.display()));
        }
    }
    Ok(())
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}
