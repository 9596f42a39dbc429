use clap::Parser;
use std::io::Write;
use std::panic::{self, PanicHookInfo};
use std::process;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tpms_listener::app::{self, Options};
use tpms_listener::permission::AlwaysGranted;
use tracing_subscriber::EnvFilter;

/// Exit codes for the application
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_PANIC: i32 = 2;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "tpms_listener=debug"
    } else {
        "tpms_listener=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Clean exit codes for process managers that monitor exit status
    panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        eprintln!("Panic! {}", info);
        process::exit(EXIT_PANIC);
    }));

    let options = Options::parse();
    init_tracing(options.verbose);

    #[cfg(feature = "bluer")]
    let radio = tpms_listener::radio::bluer::BluerRadio::new(options.manufacturer_id);
    #[cfg(not(feature = "bluer"))]
    compile_error!("the binary requires the \"bluer\" feature");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let out: Arc<Mutex<dyn Write + Send>> = Arc::new(Mutex::new(std::io::stdout()));
    match app::run_with_io(options, &radio, &AlwaysGranted, shutdown, out).await {
        Ok(()) => process::exit(EXIT_SUCCESS),
        Err(why) => {
            eprintln!("error: {}", why);
            process::exit(EXIT_ERROR);
        }
    }
}
