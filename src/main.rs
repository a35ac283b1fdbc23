use clap::Parser;
use tagmire::Settings;
use tagmire::cli::commands::{self, Workspace};
use tagmire::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    tagmire::logging::init_with_config(&settings.logging);

    if let Err(e) = run(cli.command, settings).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, settings: Settings) -> anyhow::Result<()> {
    if let Commands::Init { force } = command {
        return commands::init::run_init(force);
    }

    let workspace = Workspace::new(settings);
    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&workspace.settings),
        Commands::Tags { action } => commands::tags::run_tags(&workspace, action),
        Commands::Annotate {
            file,
            start,
            end,
            tags,
            note,
        } => commands::annotations::run_annotate(&workspace, &file, start, end, &tags, note),
        Commands::List { file, tag, json } => {
            commands::annotations::run_list(&workspace, file.as_deref(), tag.as_deref(), json)
        }
        Commands::Remove { file, position } => {
            commands::annotations::run_remove(&workspace, &file, position)
        }
        Commands::Check { files } => commands::check::run_check(&workspace, &files),
        Commands::Mv { old, new } => commands::annotations::run_mv(&workspace, &old, &new),
        Commands::Watch => commands::watch::run_watch(&workspace).await,
    }
}
