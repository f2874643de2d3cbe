//! engine_noise — command-line entry point.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_noise::app::{run, run_headless, AppConfig, SensorKind};
use engine_noise::player::Backend;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SensorArg {
    /// Keyboard simulator in the window
    Sim,
    /// Recorded x,y,z rows from --replay
    Replay,
}

/// Engine noise simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sample source
    #[arg(long, value_enum, default_value = "sim")]
    sensor: SensorArg,

    /// CSV file with an x,y,z header (for --sensor replay)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Start the replay over when it reaches the end
    #[arg(long)]
    loop_replay: bool,

    /// Directory holding engine_idle.mp3, engine_accelerating.mp3, engine_decelerating.mp3
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Do not open an audio device
    #[arg(long)]
    no_audio: bool,

    /// No window; log state changes until the replay ends
    #[arg(long)]
    headless: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> Result<AppConfig, String> {
        let sensor = match self.sensor {
            SensorArg::Sim => SensorKind::Sim,
            SensorArg::Replay => {
                let path = self.replay.clone()
                    .ok_or_else(|| "--sensor replay needs --replay <file>".to_string())?;
                SensorKind::Replay { path, loop_replay: self.loop_replay }
            }
        };
        Ok(AppConfig {
            sensor,
            assets:  self.assets.clone(),
            backend: if self.no_audio { Backend::Null } else { Backend::Device },
        })
    }
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn"  => Level::WARN,
            "error" => Level::ERROR,
            _       => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("engine_noise v{}", env!("CARGO_PKG_VERSION"));
    #[cfg(feature = "audio")]
    info!("audio: default output device");
    #[cfg(not(feature = "audio"))]
    info!("audio: null output (build with --features audio to hear it)");

    let cfg = match args.config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    let result = if args.headless {
        run_headless(cfg).map(|state| info!(state = %state, "final state"))
    } else {
        run(cfg)
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
