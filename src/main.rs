use anyhow::Context;
use clap::Parser;
use sign_coder::config_files::install_defaults;
use sign_coder::logging;
use sign_coder::settings::{Settings, SETTINGS_FILE};
use sign_coder::signs::cheatsheet::{format_ascii_table, format_cheat_sheet};
use sign_coder::signs::replay::{
    load_recording, Recording, ReplayClassifier, ReplaySource, ReplaySourceFactory,
};
use sign_coder::signs::{
    DryRunInjector, FrameSource, KeyInjector, ServiceConfig, SignPipeline, SignService, SignTables,
    SystemKeyInjector, TickReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sign_coder")]
#[command(about = "Turn recognised hand signs into keystrokes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file. Table paths inside it resolve against its directory.
    #[arg(long, default_value = SETTINGS_FILE)]
    settings: PathBuf,

    /// Log at debug level (honours RUST_LOG)
    #[arg(long)]
    debug: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Write default settings and tables next to the settings file
    Init {
        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },
    /// Validate settings and tables
    Check,
    /// Print every sign binding
    Cheatsheet,
    /// Print the two-sign ASCII code table
    Ascii,
    /// Feed recorded classifier output through the recogniser
    Replay {
        /// JSON lines file, one array of detections (or null) per frame
        recording: PathBuf,

        /// Run on the worker thread at the configured frame rate
        #[arg(long)]
        realtime: bool,

        /// Inject keystrokes instead of logging them
        #[arg(long)]
        inject: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        logging::init(cli.debug, None);
        for file in install_defaults(&cli.settings, force)? {
            println!("{} {}: {}", file.status.as_str(), file.label, file.path.display());
        }
        return Ok(());
    }

    let settings = Settings::load(&cli.settings)
        .with_context(|| format!("failed to load {}", cli.settings.display()))?;
    settings.validate()?;
    logging::init(cli.debug || settings.debug_logging, settings.log_file.clone());

    let tables = Arc::new(SignTables::load(&settings.table_paths(&cli.settings))?);

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Check => {
            println!(
                "ok: {} signs, {} techniques, {} actions",
                tables.labels.len(),
                tables.techniques.len(),
                tables.actions.len()
            );
        }
        Commands::Cheatsheet => println!("{}", format_cheat_sheet(&tables, settings.locale)),
        Commands::Ascii => println!("{}", format_ascii_table(&tables.labels)),
        Commands::Replay {
            recording,
            realtime,
            inject,
        } => {
            let injector: Arc<dyn KeyInjector> = if inject && !settings.dry_run {
                Arc::new(SystemKeyInjector)
            } else {
                Arc::new(DryRunInjector)
            };
            let recording = Arc::new(load_recording(&recording)?);
            let config = settings.service_config();
            if realtime {
                replay_realtime(config, tables, recording, injector)?;
            } else {
                replay(&config, tables, recording, injector)?;
            }
        }
    }
    Ok(())
}

/// Replay on the calling thread with a virtual clock advancing one frame
/// interval per tick.
fn replay(
    config: &ServiceConfig,
    tables: Arc<SignTables>,
    recording: Arc<Recording>,
    injector: Arc<dyn KeyInjector>,
) -> anyhow::Result<()> {
    let mut pipeline = SignPipeline::new(
        config.session.clone(),
        config.fps_window,
        Arc::clone(&tables),
        injector,
    );
    let mut source = ReplaySource::new(Arc::clone(&recording));
    let classifier = ReplayClassifier::new(recording);
    let interval = config.frame_interval();
    let start = Instant::now();

    let mut tick: u32 = 0;
    let mut last = None;
    while !source.is_finished() {
        let now = start + interval * tick;
        tick = tick.saturating_add(1);
        if let Some(report) = pipeline.tick(&mut source, &classifier, now)? {
            print_report(&tables, &report);
            last = Some(report);
        }
    }
    source.release();

    if let Some(report) = last {
        println!("{}", report.state.fps_text);
        println!("footer: {}", report.state.footer);
    }
    Ok(())
}

fn print_report(tables: &SignTables, report: &TickReport) {
    let index = report.frame.index;
    let outcome = &report.outcome;
    for sign in &outcome.confirmed {
        println!("frame {index}: sign {}", tables.labels.label(*sign));
    }
    for action in &outcome.actions {
        println!("frame {index}: {} {:?}", action.kind.as_str(), action.payload);
    }
    if outcome.technique.is_some() {
        println!("frame {index}: technique {}", report.state.footer);
    }
    if outcome.inactivity_reset {
        println!("frame {index}: history cleared");
    }
}

/// Replay through the worker thread, printing the footer whenever it changes.
fn replay_realtime(
    config: ServiceConfig,
    tables: Arc<SignTables>,
    recording: Arc<Recording>,
    injector: Arc<dyn KeyInjector>,
) -> anyhow::Result<()> {
    let Some(last_index) = recording.last_readable() else {
        println!("recording has no readable frames");
        return Ok(());
    };
    let poll = config.frame_interval().max(Duration::from_millis(5));
    let mut service = SignService::new(
        config,
        tables,
        Arc::new(ReplaySourceFactory::new(Arc::clone(&recording))),
        Arc::new(ReplayClassifier::new(recording)),
        injector,
    );
    service.start()?;

    let slot = service.frame_slot();
    let mut seen = 0;
    let mut footer = String::new();
    while service.is_running() {
        std::thread::sleep(poll);
        if slot.version() == seen {
            continue;
        }
        seen = slot.version();
        let Some(frame) = slot.latest() else {
            continue;
        };
        if frame.state.footer != footer {
            footer = frame.state.footer.clone();
            println!("frame {}: {footer}", frame.frame.index);
        }
        if frame.frame.index >= last_index as u64 {
            break;
        }
    }
    service.stop();
    Ok(())
}
