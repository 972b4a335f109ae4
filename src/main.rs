//! Find seamless loop points in audio files
//!
//! Usage:
//!   seamless-loop [--jobs N] [--json] <file1> <file2> ...
//!   seamless-loop [--jobs N] [--json] -i [base_dir]
//!
//! Prints one `<name>__s<loopStart>l<loopLength>` line per analyzed file.

use std::env;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use seamless_loop::batch::{analyze_file, parse_interactive_line, InteractiveCommand, TrackOutcome};
use seamless_loop::{AnalysisError, LoopConfig, LoopDetector};

const USAGE: &str = "Usage: seamless-loop [--jobs N] [--json] <file1> <file2> ...\n       \
                     seamless-loop [--jobs N] [--json] -i [base_dir]\n\
                     \n\
                     --jobs N   Search workers (default: 8)\n\
                     --json     Emit one JSON object per line (JSONL)\n\
                     -i         Read `path[,hint]` lines from stdin\n";

struct Options {
    json: bool,
    jobs: Option<usize>,
    interactive: bool,
    base_dir: Option<PathBuf>,
    paths: Vec<String>,
}

fn parse_args(mut args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options {
        json: false,
        jobs: None,
        interactive: false,
        base_dir: None,
        paths: Vec::new(),
    };

    while let Some(a) = args.first().cloned() {
        args.remove(0);
        match a.as_str() {
            "--json" => options.json = true,
            "--jobs" => {
                let v = args
                    .first()
                    .ok_or("--jobs requires a value")?
                    .parse::<usize>()
                    .map_err(|e| format!("--jobs: {}", e))?;
                args.remove(0);
                options.jobs = Some(std::cmp::max(1, v));
            }
            "-i" => options.interactive = true,
            "--help" | "-h" => return Ok(None),
            _ if options.interactive && options.base_dir.is_none() => {
                options.base_dir = Some(PathBuf::from(a));
            }
            _ => options.paths.push(a),
        }
    }

    if !options.interactive && options.paths.is_empty() {
        return Err("Provide at least one audio file path. Use --help for usage.".to_string());
    }

    Ok(Some(options))
}

/// Print the result of one file; returns whether a loop was found
fn report(path: &Path, result: Result<TrackOutcome, AnalysisError>, json: bool) -> bool {
    match result {
        Ok(TrackOutcome::Analyzed(report)) => {
            if json {
                match report.to_json() {
                    Ok(line) => println!("{}", line),
                    Err(e) => {
                        log::error!("Could not serialize result for {}: {}", path.display(), e)
                    }
                }
            } else {
                println!("{}", report);
            }
            true
        }
        Ok(TrackOutcome::Skipped { .. }) => false,
        Err(e) => {
            log::error!("{}: {}", path.display(), e);
            if json {
                let line = serde_json::json!({
                    "file": path.display().to_string(),
                    "error": e.to_string(),
                });
                println!("{}", line);
            }
            false
        }
    }
}

fn run_interactive(detector: &LoopDetector, base_dir: Option<&Path>, json: bool) {
    let base_dir = base_dir.filter(|dir| {
        let exists = dir.is_dir();
        if !exists {
            log::warn!("Base directory {} does not exist; ignoring it", dir.display());
        }
        exists
    });

    println!("Interactive mode. Enter `path[,hint]`, an empty line or `q` to quit.");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        if std::io::stdout().flush().is_err() {
            break;
        }

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                log::error!("Could not read input: {}", e);
                break;
            }
            None => break,
        };

        match parse_interactive_line(&line, base_dir) {
            InteractiveCommand::Quit => break,
            InteractiveCommand::BadHint => println!("Could not parse hint."),
            InteractiveCommand::Analyze { path, hint } => {
                let result = analyze_file(&path, hint, detector);
                report(&path, result, json);
            }
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = match parse_args(args) {
        Ok(Some(options)) => options,
        Ok(None) => {
            eprintln!("{}", USAGE);
            return;
        }
        Err(message) => {
            eprintln!("ERROR: {}", message);
            std::process::exit(2);
        }
    };

    let mut config = LoopConfig::default();
    if let Some(jobs) = options.jobs {
        config = config.with_max_workers(jobs);
    }

    let detector = match LoopDetector::new(config) {
        Ok(detector) => detector,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(2);
        }
    };

    if options.interactive {
        run_interactive(&detector, options.base_dir.as_deref(), options.json);
        return;
    }

    log::info!(
        "Batch: {} files, jobs={}",
        options.paths.len(),
        detector.config().max_workers
    );

    let t0 = Instant::now();
    let found = options
        .paths
        .iter()
        .map(|p| {
            let path = Path::new(p);
            report(path, analyze_file(path, None, &detector), options.json)
        })
        .filter(|&ok| ok)
        .count();

    log::info!(
        "Done: found={}/{} wall={:.0}ms",
        found,
        options.paths.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
}
