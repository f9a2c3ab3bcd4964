use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use motorcore::{Direction, protocol::commander::MotorCommand, std::SharedIndicator};

use crate::{
    config::{LinkConfig, load_config},
    drive::{Program, drive},
    emulator::emulate,
    util::{
        serde::serialize_to_json_file_pretty,
        serial::{open_port, simulated_pair},
    },
};

mod config;
mod drive;
mod emulator;
mod util;

/// Host tools for the single byte serial motor controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON link configuration, defaults are used for anything missing
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// serial port, overrides the configuration
    #[arg(short, long)]
    port: Option<String>,

    /// write log to file instead of stderr
    #[arg(short, long)]
    logfile: Option<PathBuf>,

    /// enable debug messages
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// send frames to a controller attached to the serial port
    Drive(DriveArgs),
    /// act as the controller on the serial port
    Emulate,
    /// drive an emulated controller over a pseudo terminal pair
    Simulated(DriveArgs),
    /// print the effective configuration, or write it to a file
    Config {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum DirectionArg {
    Forward,
    Backward,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Forward => Direction::Forward,
            DirectionArg::Backward => Direction::Backward,
        }
    }
}

#[derive(clap::Args, Debug)]
struct DriveArgs {
    #[arg(short, long, value_enum, default_value_t = DirectionArg::Forward)]
    direction: DirectionArg,

    /// speed level sent in every frame
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=15))]
    speed: u8,

    /// cycle through the predefined speed steps instead of holding one speed
    #[arg(long)]
    sweep: bool,
}

impl DriveArgs {
    fn program(&self) -> Program {
        if self.sweep {
            Program::Sweep(self.direction.into())
        } else {
            Program::Hold(MotorCommand::new(self.direction.into(), self.speed))
        }
    }
}

fn init_logger(args: &Args) -> Result<(), String> {
    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter(None, log::LevelFilter::Debug);
    } else {
        builder.filter(None, log::LevelFilter::Info);
    }
    if let Some(ref logfile) = args.logfile {
        let target = std::fs::File::create(logfile).map_err(|e| format!("Can't create logfile {logfile:?}: {e}"))?;
        builder.target(env_logger::Target::Pipe(Box::new(target)));
    }
    builder.init();
    Ok(())
}

async fn run(args: Args, config: LinkConfig) -> Result<(), String> {
    match args.mode {
        Mode::Drive(drive_args) => {
            let port = open_port(&config)?;
            let reason = tokio::select! {
                reason = drive(port, &config, drive_args.program()) => reason,
                _ = tokio::signal::ctrl_c() => return Ok(()),
            };
            Err(reason.to_string())
        }
        Mode::Emulate => {
            let port = open_port(&config)?;
            tokio::select! {
                res = emulate(port, &config, SharedIndicator::default()) => res,
                _ = tokio::signal::ctrl_c() => Ok(()),
            }
        }
        Mode::Simulated(drive_args) => {
            let (host, device) = simulated_pair()?;
            tokio::select! {
                reason = drive(host, &config, drive_args.program()) => Err(reason.to_string()),
                res = emulate(device, &config, SharedIndicator::default()) => res,
                _ = tokio::signal::ctrl_c() => Ok(()),
            }
        }
        Mode::Config { out: Some(out) } => serialize_to_json_file_pretty(&config, &out),
        Mode::Config { out: None } => {
            let json = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logger(&args) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let mut config = load_config(args.config.as_deref());
    if let Some(port) = args.port.clone() {
        config.port = port;
    }
    info!("Starting with {config:?}");

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
