use clap::{ArgAction, Parser};
use once_cell::sync::Lazy;
use std::io;
use tracing_subscriber::EnvFilter;
use wsl_kinit::{
    exit_status, kinit, Context, HostVault, KinitRequest, Launcher, NativeRunner,
};

const PROGNAME: &str = "wsl-kinit";
const ENV_LOG: &str = "WSL_KINIT_LOG";

static ARGS: Lazy<Args> = Lazy::new(Args::parse);

/// Run kinit inside WSL with the password stored as a generic Windows
/// credential (target: the realm, username: the user).
#[derive(Parser)]
#[command(name = PROGNAME, version)]
struct Args {
    /// principal to acquire tickets for, as user@REALM
    principal: String,

    /// lists the tickets after acquiring them
    #[arg(short = 'l', long = "list", default_value_t = false)]
    list: bool,

    /// logs more on stderr (repeat for more detail)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    init_logging(ARGS.verbose);
    let status = exit_status(PROGNAME, run());
    std::process::exit(status)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn run() -> anyhow::Result<i32> {
    let context =
        Context::init().map_err(|e| anyhow::anyhow!("{:#} while loading configuration", e))?;
    let vault = HostVault::open()?;
    let launcher = Launcher::new(&context, NativeRunner);
    let request = KinitRequest {
        principal: ARGS.principal.clone(),
        list: ARGS.list,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    kinit(&context, &vault, &launcher, &request, &mut out)
}
