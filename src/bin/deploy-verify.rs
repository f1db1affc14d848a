use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use deploy_verify::cli::{self, Command, CommonArgs, FormatArg};
use deploy_verify::config;
use deploy_verify::error::Result;
use deploy_verify::output::{
    self, Formatter, HumanFormatter, JsonFormatter, OutputOptions, SummaryFormatter,
};
use deploy_verify::report::LbStatus;
use deploy_verify::verifier::{self, DeployPlan, PollMode, RunOptions};

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = cli::parse_args()?;

    match cli.command {
        Command::Run(args) => {
            init_logging(&args.common);
            let config = config::build_config(&args.common)?;
            let options = RunOptions {
                mode: if args.once {
                    PollMode::OneShot
                } else {
                    PollMode::WaitForReady
                },
                deploy: DeployPlan {
                    clean: args.clean,
                    bring_up: args.deploy,
                    build: !args.skip_build,
                },
            };
            let verification = verifier::verify(&config, &options).await?;
            print!("{}", formatter_for(&args.common).write(&verification)?);
            Ok(verification.report.exit_code())
        }
        Command::Check(args) => {
            init_logging(&args);
            let config = config::build_config(&args)?;
            let options = RunOptions {
                mode: PollMode::OneShot,
                deploy: DeployPlan::default(),
            };
            let verification = verifier::verify(&config, &options).await?;
            print!("{}", formatter_for(&args).write(&verification)?);
            Ok(verification.report.exit_code())
        }
        Command::Probe(args) => {
            init_logging(&args);
            let config = config::build_config(&args)?;
            let run = verifier::probe(&config).await?;
            print!(
                "{}",
                formatter_for(&args).write_probe(&config.probe.front_door, &run)?
            );
            Ok(if run.lb_status() == LbStatus::Working { 0 } else { 1 })
        }
        Command::ShowConfig(args) => {
            let config = config::build_config(&args)?;
            print!(
                "{}",
                output::write_config(&config, args.format == FormatArg::Json)?
            );
            Ok(0)
        }
    }
}

fn init_logging(args: &CommonArgs) {
    let default = if args.verbose {
        "deploy_verify=debug"
    } else {
        "deploy_verify=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(output::color_enabled(
            args.no_color,
            no_color_env(),
            std::io::stderr().is_terminal(),
        ))
        .init();
}

fn formatter_for(args: &CommonArgs) -> Box<dyn Formatter> {
    match args.format {
        FormatArg::Human => Box::new(HumanFormatter::new(OutputOptions {
            color: output::color_enabled(
                args.no_color,
                no_color_env(),
                std::io::stdout().is_terminal(),
            ),
            verbose: args.verbose,
        })),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}

fn no_color_env() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}
