use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use vidscribe::{
    load_config, Config, JobOutcome, JobRequest, ProgressBook, QueueEvent, QueueManager,
    SpeechEngine,
};

struct CliArgs {
    config_path: Option<PathBuf>,
    output_dir: PathBuf,
    emit_json: bool,
    inputs: Vec<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage: vidscribe [OPTIONS] <FILE>...");
    eprintln!();
    eprintln!("Transcribe media files one at a time, in submission order.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>      JSON config file");
    eprintln!("  -o, --output-dir <DIR>   Directory for WAV and transcript artifacts (default: .)");
    eprintln!("      --json               Emit events as JSON lines instead of text");
    eprintln!("  -h, --help               Show this help");
}

fn parse_args() -> Result<CliArgs, String> {
    let mut config_path = None;
    let mut output_dir = PathBuf::from(".");
    let mut emit_json = false;
    let mut inputs = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let value = args.next().ok_or("--config requires a path")?;
                config_path = Some(PathBuf::from(value));
            }
            "-o" | "--output-dir" => {
                let value = args.next().ok_or("--output-dir requires a path")?;
                output_dir = PathBuf::from(value);
            }
            "--json" => emit_json = true,
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            other => inputs.push(PathBuf::from(other)),
        }
    }

    if inputs.is_empty() {
        return Err("No input files given".to_string());
    }

    Ok(CliArgs {
        config_path,
        output_dir,
        emit_json,
        inputs,
    })
}

#[cfg(feature = "whisper")]
fn build_engine(config: &Config) -> Arc<dyn SpeechEngine> {
    Arc::new(vidscribe::WhisperEngine::new(&config.model_path))
}

#[cfg(not(feature = "whisper"))]
fn build_engine(_config: &Config) -> Arc<dyn SpeechEngine> {
    warn!("Built without the 'whisper' feature; transcripts will be empty");
    Arc::new(vidscribe::NullEngine)
}

fn render_event(event: &QueueEvent, book: &ProgressBook, emit_json: bool) {
    if emit_json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize event: {}", e),
        }
        return;
    }

    match event {
        QueueEvent::Progress { row, pct } => {
            println!("row {}: {:>3}%  (overall {}%)", row, pct, book.overall());
        }
        QueueEvent::Status { row, message, .. } => {
            println!("row {}: {}", row, message);
        }
        QueueEvent::JobFinished { row, outcome } => match outcome {
            JobOutcome::Completed => println!("row {}: finished", row),
            JobOutcome::Aborted => println!("row {}: cancelled", row),
            JobOutcome::Failed { reason } => println!("row {}: failed ({})", row, reason),
        },
        QueueEvent::AllFinished => println!("All jobs finished"),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match &args.config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    if let Err(e) = std::fs::create_dir_all(&args.output_dir) {
        eprintln!(
            "Error: cannot create output directory {}: {}",
            args.output_dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    info!("Starting vidscribe v{}", env!("CARGO_PKG_VERSION"));

    let engine = build_engine(&config);
    let manager = Arc::new(QueueManager::new(Arc::new(config), engine));

    let mut book = ProgressBook::new();
    for (row, input) in args.inputs.iter().enumerate() {
        let row = row as u32;
        let title = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let request = JobRequest {
            input: input.clone(),
            output_dir: args.output_dir.clone(),
            title,
            link: String::new(),
        };
        if let Err(e) = manager.submit(row, request) {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
        book.track(row);
    }

    // First interrupt cancels everything; the queue then drains and the
    // event loop below exits through AllFinished.
    let interrupt_manager = Arc::clone(&manager);
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupt received, cancelling all jobs");
        interrupt_manager.cancel_all();
    }) {
        warn!("Failed to install interrupt handler: {}", e);
    }

    manager.start();

    let mut failures = 0usize;
    loop {
        let event = match manager.recv_event_timeout(Duration::from_millis(250)) {
            Some(event) => event,
            None => continue,
        };

        if let QueueEvent::Progress { row, pct } = &event {
            book.record(*row, *pct);
        }
        if let QueueEvent::JobFinished {
            outcome: JobOutcome::Failed { .. },
            ..
        } = &event
        {
            failures += 1;
        }

        let done = matches!(event, QueueEvent::AllFinished);
        render_event(&event, &book, args.emit_json);
        if done {
            break;
        }
    }

    manager.wait();

    if failures > 0 {
        warn!("{} job(s) failed", failures);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
