use std::future::Future;
use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use uid_card::{list_readers, ReaderSession};

#[derive(Parser)]
#[command(name = "read-uid")]
#[command(about = "Print the UID of every contactless card presented to the reader")]
#[command(version)]
struct Args {
    /// Reader to open: `usb` for the first reader, `usb:<pattern>` to match by name
    #[arg(short, long, default_value = "usb")]
    device: String,

    /// List available readers and exit
    #[arg(long)]
    list_readers: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    if args.list_readers {
        return print_readers();
    }

    let mut session = match ReaderSession::open(&args.device) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!("Please ensure a contactless reader is connected");
            return ExitCode::FAILURE;
        }
    };

    let Some(canceller) = session.canceller() else {
        eprintln!("Error: reader closed before the read loop started");
        return ExitCode::FAILURE;
    };

    let interrupts = tokio::spawn(async move {
        let forced = watch_interrupts(tokio::signal::ctrl_c, || {
            debug!("Ctrl+C received");
            canceller.cancel();
        })
        .await;

        if forced {
            eprintln!("Interrupted again, exiting without cleanup");
            std::process::exit(130);
        }
    });
    // Let the listener install its SIGINT handler before the prompt appears
    tokio::task::yield_now().await;

    if let Some(name) = session.reader_name() {
        info!(reader = %name, "Waiting for cards");
    }
    println!("Place a card on the reader... (Ctrl+C to exit)");

    let worker = tokio::task::spawn_blocking(move || {
        let mut out = io::stdout().lock();
        session.run_forever(&mut out)
    });

    let result = worker.await;
    interrupts.abort();

    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(err)) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: read loop aborted: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// First interrupt runs `cancel`; returns `true` if a second one arrives.
///
/// A failure to listen for signals ends the watch and returns `false`.
async fn watch_interrupts<S, Fut, C>(mut next_signal: S, cancel: C) -> bool
where
    S: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
    C: FnOnce(),
{
    if next_signal().await.is_err() {
        return false;
    }
    cancel();

    next_signal().await.is_ok()
}

fn print_readers() -> ExitCode {
    match list_readers() {
        Ok(readers) if readers.is_empty() => {
            eprintln!("No readers found");
            ExitCode::FAILURE
        }
        Ok(readers) => {
            for reader in readers {
                println!("{}", reader);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

// Logs go to stderr; stdout carries only the prompt and UID lines.
// RUST_LOG overrides the default level.
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
