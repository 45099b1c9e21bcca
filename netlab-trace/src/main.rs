//! Entry point for `netlab`.
//!
//! Parses CLI arguments, merges them over the optional lab file and runs the
//! chosen experiment to completion, either stepping by hand or on an
//! autoplay cadence.  All simulation work is delegated to library modules;
//! `main.rs` owns only process setup (logging, signal handling, argument
//! parsing, printing).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use netlab_trace::config::LabConfig;
use netlab_trace::engine::{ConfigError, Simulation, Snapshot, TraceSession};
use netlab_trace::experiment::{Experiment, ExperimentConfig};
use netlab_trace::random::{RandomSource, SeededRandom};
use netlab_trace::scheduler::Autoplay;
use netlab_trace::sliding_window::SlideRule;
use netlab_trace::topology::TopologyKind;

/// Step through networking and automata lab experiments.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Lab file with per-experiment defaults (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for loss draws; omit to seed from OS entropy.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print snapshots as JSON instead of the plain trace.
    #[arg(long, global = true)]
    json: bool,

    /// Step on a cadence of MS milliseconds (0 or no value: experiment default).
    #[arg(long, value_name = "MS", global = true, num_args = 0..=1, default_missing_value = "0")]
    autoplay: Option<u64>,

    /// Give up after this many manual steps.
    #[arg(long, default_value_t = 10_000, global = true)]
    max_steps: usize,

    #[command(subcommand)]
    experiment: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Windowed transmission with random per-frame ACK loss.
    SlidingWindow {
        #[arg(short, long)]
        window_size: Option<usize>,
        #[arg(short, long)]
        frames: Option<usize>,
        /// ACK loss probability in [0, 1].
        #[arg(short, long)]
        loss: Option<f64>,
        /// highest-ack or cumulative.
        #[arg(long)]
        slide_rule: Option<SlideRule>,
    },
    /// Stop-and-wait ARQ with timeout and retransmission.
    StopAndWait {
        #[arg(short, long)]
        frames: Option<usize>,
        #[arg(long)]
        ack_loss: Option<f64>,
        #[arg(long)]
        frame_loss: Option<f64>,
        #[arg(long)]
        timeout_ticks: Option<u32>,
    },
    /// Dijkstra shortest path, one visit per step.
    Dijkstra {
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Run a string through the lab DFA.
    Dfa {
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Lay out a bus, star, ring or mesh link by link.
    Topology {
        kind: Option<TopologyKind>,
    },
    /// Scripted tour of the three stop-and-wait outcomes.
    Tour,
}

fn experiment_config(command: Command, lab: LabConfig) -> Result<ExperimentConfig, ConfigError> {
    Ok(match command {
        Command::SlidingWindow {
            window_size,
            frames,
            loss,
            slide_rule,
        } => {
            let mut c = lab.sliding_window;
            c.window_size = window_size.unwrap_or(c.window_size);
            c.total_frames = frames.unwrap_or(c.total_frames);
            c.loss_probability = loss.unwrap_or(c.loss_probability);
            c.slide_rule = slide_rule.unwrap_or(c.slide_rule);
            ExperimentConfig::SlidingWindow(c)
        }
        Command::StopAndWait {
            frames,
            ack_loss,
            frame_loss,
            timeout_ticks,
        } => {
            let mut c = lab.stop_and_wait;
            c.total_frames = frames.unwrap_or(c.total_frames);
            c.ack_loss_probability = ack_loss.unwrap_or(c.ack_loss_probability);
            c.frame_loss_probability = frame_loss.unwrap_or(c.frame_loss_probability);
            c.ack_timeout_ticks = timeout_ticks.unwrap_or(c.ack_timeout_ticks);
            ExperimentConfig::StopAndWait(c)
        }
        Command::Dijkstra { source, target } => {
            let mut c = lab.dijkstra;
            c.source = source.unwrap_or(c.source);
            c.target = target.unwrap_or(c.target);
            ExperimentConfig::Dijkstra(c)
        }
        Command::Dfa { input } => {
            let mut section = lab.dfa;
            section.input = input.unwrap_or(section.input);
            ExperimentConfig::Dfa(section.to_config()?)
        }
        Command::Topology { kind } => {
            let mut c = lab.topology;
            c.kind = kind.unwrap_or(c.kind);
            ExperimentConfig::Topology(c)
        }
        Command::Tour => ExperimentConfig::ScenarioTour,
    })
}

fn print_snapshot(snapshot: &Snapshot<Experiment>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

/// Step by hand until terminal, printing lines as they are appended.
fn run_manual(
    mut session: TraceSession<Experiment>,
    json: bool,
    max_steps: usize,
) -> anyhow::Result<()> {
    let mut applied = 0;
    while !session.is_terminal() && applied < max_steps {
        let lines = session.advance();
        if !json {
            for line in lines {
                println!("{line}");
            }
        }
        applied += 1;
    }

    if !session.is_terminal() {
        log::warn!("stopped after {max_steps} steps without reaching a terminal state");
    }
    if json {
        print_snapshot(&session.snapshot())?;
    } else {
        println!("-- {}", session.state().describe());
    }
    Ok(())
}

/// Let the scheduler drive the session until terminal or Ctrl-C.
async fn run_autoplay(
    session: TraceSession<Experiment>,
    cadence: Duration,
    json: bool,
) -> anyhow::Result<()> {
    let mut autoplay = Autoplay::with_session(session, cadence);
    let mut printed = 0;
    autoplay.start(move |snapshot: &Snapshot<Experiment>| {
        if json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => log::error!("failed to encode snapshot: {e}"),
            }
        } else {
            for line in &snapshot.log[printed..] {
                println!("{line}");
            }
            printed = snapshot.log.len();
        }
    });

    let interrupted = tokio::select! {
        _ = autoplay.join() => false,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            true
        }
    };
    if interrupted {
        autoplay.cancel();
        log::info!("interrupted");
    }

    let snapshot = autoplay.snapshot();
    if !json {
        println!("-- {}", snapshot.state.describe());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let lab = match &cli.config {
        Some(path) => LabConfig::load(path)?,
        None => LabConfig::default(),
    };
    let lab_cadence = lab.autoplay.cadence();

    let config = experiment_config(cli.experiment, lab).context("refusing to start experiment")?;
    let rng: Box<dyn RandomSource> = match cli.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(SeededRandom::from_entropy()),
    };
    let session = TraceSession::<Experiment>::start(&config, rng)
        .context("refusing to start experiment")?;
    log::info!(
        "starting {} ({})",
        session.state().name(),
        session.state().describe()
    );

    match cli.autoplay {
        None => run_manual(session, cli.json, cli.max_steps),
        Some(ms) => {
            let cadence = match ms {
                0 => lab_cadence.unwrap_or_else(|| session.state().default_cadence()),
                ms => Duration::from_millis(ms),
            };
            run_autoplay(session, cadence, cli.json).await
        }
    }
}
