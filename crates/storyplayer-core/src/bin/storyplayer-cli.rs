use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use storyplayer_core::{
    AppConfig, CursorChange, PlayerObserver, PlayerSession, ProjectCatalog, format_timecode,
    init_tracing, parse_time,
    persistence::{load_project, save_timeline_snapshot},
    report::{generate_timeline_report, write_timeline_report},
};

#[derive(Debug, Parser)]
#[command(name = "storyplayer-cli")]
#[command(about = "Headless timeline tools for story projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overrides the configured log directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Explicit config file; otherwise storyplayer.config.toml is discovered.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List known project keys.
    Catalog,
    /// Print the computed timeline.
    Timeline {
        #[command(flatten)]
        target: ProjectArgs,
    },
    /// Show what is under the playhead at a time ("SS", "MM:SS" or "HH:MM:SS").
    Resolve {
        #[command(flatten)]
        target: ProjectArgs,

        #[arg(long)]
        at: String,
    },
    /// Play through the timeline with synthetic frame timestamps.
    Play {
        #[command(flatten)]
        target: ProjectArgs,

        #[arg(long)]
        from: Option<String>,
    },
    Report {
        #[command(flatten)]
        target: ProjectArgs,

        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the built composition, derived timing included, as JSON.
    Export {
        #[command(flatten)]
        target: ProjectArgs,

        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Catalog key or project file path. Defaults to the configured project.
    project: Option<String>,

    #[arg(long, default_value_t = 0)]
    composition: usize,
}

#[derive(Default)]
struct PrintingObserver {
    last_position: Option<(usize, Option<usize>)>,
}

impl PlayerObserver for PrintingObserver {
    fn on_cursor_changed(&mut self, change: &CursorChange<'_>) {
        let position = change
            .resolution
            .map(|resolution| (resolution.unit_index, resolution.event_index));
        if position == self.last_position {
            return;
        }
        self.last_position = position;

        println!("{}  {}", change.details.timecode, change.details.caption);
        for line in change.details.card.to_string().lines() {
            println!("    {line}");
        }
    }

    fn on_play_state_changed(&mut self, is_playing: bool) {
        println!("-- {}", if is_playing { "playing" } else { "stopped" });
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (config, config_error) = match &cli.config {
        Some(path) => (AppConfig::load_from(path)?, None),
        None => match AppConfig::load() {
            Ok(config) => (config, None),
            Err(error) => (AppConfig::default(), Some(error)),
        },
    };

    let mut diagnostics = config.diagnostics.clone();
    if let Some(log_dir) = &cli.log_dir {
        diagnostics.logs_dir.clone_from(log_dir);
    }
    let _telemetry = init_tracing(&diagnostics)?;
    if let Some(error) = config_error {
        tracing::warn!(error = %format!("{error:#}"), "using default configuration");
    }

    let catalog = ProjectCatalog::from_config(&config.catalog)?;

    match cli.command {
        Commands::Catalog => {
            for key in catalog.keys() {
                let location = catalog
                    .location(key)
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                println!("{key}\t{location}");
            }
        }
        Commands::Timeline { target } => {
            let session = open_session(&config, &catalog, &target)?;
            print_timeline(&session)?;
        }
        Commands::Resolve { target, at } => {
            let mut session = open_session(&config, &catalog, &target)?;
            session.seek(parse_time(&at));
            let details = session.details();
            println!("{}  {}", details.timecode, details.caption);
            println!("{}", details.card);
        }
        Commands::Play { target, from } => {
            let mut session = open_session(&config, &catalog, &target)?;
            session.add_observer(Box::new(PrintingObserver::default()));
            if let Some(from) = from {
                session.seek(parse_time(&from));
            }

            let interval = config.playback.frame_interval_ms as f64 / 1_000.0;
            session.play();
            let mut frame = 0_usize;
            while session.is_playing() && frame < config.playback.max_frames {
                session.tick(frame as f64 * interval);
                frame += 1;
            }
            tracing::info!(frames = frame, cursor = session.cursor(), "headless playback finished");
        }
        Commands::Report { target, output } => {
            let session = open_session(&config, &catalog, &target)?;
            let (project, composition) = session
                .project()
                .zip(session.composition())
                .context("session has no active composition")?;
            let report = generate_timeline_report(project, target.composition, composition);
            match output {
                Some(path) => {
                    write_timeline_report(&path, &report)?;
                    tracing::info!(path = %path.display(), "timeline report written");
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Export { target, output } => {
            let session = open_session(&config, &catalog, &target)?;
            let composition = session
                .composition()
                .context("session has no active composition")?;
            save_timeline_snapshot(&output, composition)?;
        }
    }

    Ok(())
}

fn open_session(
    config: &AppConfig,
    catalog: &ProjectCatalog,
    target: &ProjectArgs,
) -> anyhow::Result<PlayerSession> {
    let key = target
        .project
        .clone()
        .unwrap_or_else(|| config.catalog.default_project.clone());

    let mut session = PlayerSession::new();
    let path = Path::new(&key);
    if catalog.location(&key).is_none() && path.is_file() {
        let project = load_project(path)?;
        session.load_project(key, project)?;
    } else {
        session.load_from(catalog, &key)?;
    }

    if target.composition != 0 {
        session.activate_composition(target.composition)?;
    }
    Ok(session)
}

fn print_timeline(session: &PlayerSession) -> anyhow::Result<()> {
    let composition = session
        .composition()
        .context("session has no active composition")?;

    println!(
        "{}  total {} ({:.2}s)",
        composition.name.as_deref().unwrap_or("(untitled composition)"),
        format_timecode(composition.total_length),
        composition.total_length
    );
    for (unit_index, unit) in composition.units.iter().enumerate() {
        println!(
            "[{unit_index}] {}  {}  {:.2}s",
            unit.label,
            format_timecode(unit.start_time),
            unit.length
        );
        for (event_index, event) in unit.events.iter().enumerate() {
            println!(
                "    [{event_index}] {:<10} {:<14} +{:.2}s  {:.2}s",
                event.element_type.as_str(),
                event.element_id,
                event.computed_start,
                event.computed_duration
            );
        }
    }
    Ok(())
}
