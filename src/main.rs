use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, warn};
use unity_hil::config::{Config, ConfigLoader};
use unity_hil::error::RunError;
use unity_hil::procedure::MenuProcedure;
use unity_hil::report::RunReport;
use unity_hil::target::Target;
use unity_hil::{logging, port, runner};

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive a device's Unity test menu over its console and check the summary.",
    long_about = "Waits for the application to boot, opens the Unity test menu (retrying the trigger a bounded number of times), runs every registered test with '*' and fails unless at least one test ran and none failed."
)]
struct Args {
    /// Configuration file (otherwise UNITY_HIL_CONFIG, ./unity-hil.toml, user config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target the device runs on.
    #[arg(short, long, value_enum)]
    target: Option<Target>,

    /// Serial port of a hardware target.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate of the serial console.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Program that provides the console of a qemu/linux target.
    #[arg(long)]
    command: Option<String>,

    /// Arguments for --command.
    #[arg(last = true)]
    command_args: Vec<String>,

    /// Mirror everything the device prints to this file.
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Print a JSON report on stdout.
    #[arg(long)]
    json: bool,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// List available serial ports and exit.
    #[arg(long)]
    list_ports: bool,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(target) = self.target {
            config.dut.target = target;
        }
        if let Some(port) = &self.port {
            config.serial.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.serial.baud = baud;
        }
        if let Some(command) = &self.command {
            config.process.command = Some(command.clone());
            config.process.args = self.command_args.clone();
        }
        if let Some(transcript) = &self.transcript {
            config.dut.transcript = Some(transcript.clone());
        }
    }
}

fn load_config(args: &Args) -> Result<Config, RunError> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("unity-hil: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if let Err(e) = logging::init(&config.logging, args.verbose) {
        eprintln!("unity-hil: {e}");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    if args.print_config {
        return print_config(&config);
    }
    if args.list_ports {
        return list_ports(args.json);
    }

    run(&config, args.json)
}

fn run(config: &Config, json: bool) -> ExitCode {
    let target = config.dut.target;
    let started_at = Utc::now();
    let started = Instant::now();

    if !MenuProcedure::supports(target) {
        warn!(%target, "procedure is not tagged for this target, skipping");
        let report = RunReport::new(target, "", started_at).skipped("target not supported");
        emit_report(&report, json);
        return ExitCode::from(EXIT_PASS);
    }

    let prepared = MenuProcedure::from_config(config)
        .map_err(RunError::from)
        .and_then(|procedure| {
            let console = runner::connect(config)?;
            let dut = runner::attach(console, config)?;
            Ok((procedure, dut))
        });

    let (procedure, mut dut) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            error!(error = %e, "could not start the run");
            if !json {
                eprintln!("unity-hil: {e}");
            }
            let code = e.exit_code();
            let report =
                RunReport::new(target, "", started_at).finish(None, &Err(e), started.elapsed());
            emit_report(&report, json);
            return ExitCode::from(code);
        }
    };

    let console = dut.name().to_string();
    let mut stdout = std::io::stdout();
    let outcome = if json {
        // Keep stdout pure JSON; the summary line still reaches the log.
        runner::execute(&mut dut, &procedure, &mut std::io::sink())
    } else {
        runner::execute(&mut dut, &procedure, &mut stdout)
    };

    if let Err(e) = &outcome.result {
        error!(error = %e, "run failed");
        if !json {
            eprintln!("FAILED: {e}");
        }
    }

    let code = match &outcome.result {
        Ok(()) => EXIT_PASS,
        Err(e) => e.exit_code(),
    };
    let report = RunReport::new(target, console, started_at).finish(
        outcome.summary,
        &outcome.result,
        started.elapsed(),
    );
    emit_report(&report, json);
    ExitCode::from(code)
}

fn emit_report(report: &RunReport, json: bool) {
    if !json {
        return;
    }
    match report.to_json() {
        Ok(text) => println!("{text}"),
        Err(e) => error!(error = %e, "failed to serialize report"),
    }
}

fn print_config(config: &Config) -> ExitCode {
    match config.to_toml() {
        Ok(text) => {
            print!("{text}");
            ExitCode::from(EXIT_PASS)
        }
        Err(e) => {
            eprintln!("unity-hil: {e}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn list_ports(json: bool) -> ExitCode {
    let ports = match port::list_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("unity-hil: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if json {
        match serde_json::to_string_pretty(&ports) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("unity-hil: {e}");
                return ExitCode::from(EXIT_CONFIG_ERROR);
            }
        }
    } else if ports.is_empty() {
        println!("No serial ports detected on this system");
    } else {
        for p in &ports {
            let detail = [p.vid_pid.as_deref(), p.manufacturer.as_deref(), p.product.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            println!("{}\t{}\t{}", p.port_name, p.kind, detail);
        }
    }
    ExitCode::from(EXIT_PASS)
}
