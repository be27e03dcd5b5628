//! Command-line front end for document sanitization.
//!
//! Usage:
//!   docshield analyze <file>
//!   docshield clean <file> [--all] [--keep-drawings|--strip-drawings] [--out <path>]
//!
//! `analyze` prints the JSON report to stdout. `clean` writes the output
//! archive (cleaned binary + JSON and HTML reports) next to the input as
//! `<stem>.cleaned.zip` unless `--out` is given.

use docshield::{package, CancelToken, CleanOptions, DocumentFormat, DrawPolicy, Sanitizer};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

struct CliArgs {
    command: String,
    input: PathBuf,
    out: Option<PathBuf>,
    all: bool,
    draw_policy: DrawPolicy,
}

impl CliArgs {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut command = String::new();
        let mut input: Option<PathBuf> = None;
        let mut out = None;
        let mut all = false;
        let mut draw_policy = DrawPolicy::None;

        let mut i = 0usize;
        while i < args.len() {
            match args[i].as_str() {
                "analyze" | "clean" if command.is_empty() => command = args[i].clone(),
                "--all" => all = true,
                "--keep-drawings" => draw_policy = DrawPolicy::None,
                "--strip-drawings" => draw_policy = DrawPolicy::All,
                "--out" => {
                    i += 1;
                    out = args.get(i).map(PathBuf::from);
                    if out.is_none() {
                        return Err("--out requires a path".to_string());
                    }
                },
                "-h" | "--help" => return Err(usage()),
                other if input.is_none() && !other.starts_with('-') => {
                    input = Some(PathBuf::from(other));
                },
                other => return Err(format!("unknown argument: {}\n{}", other, usage())),
            }
            i += 1;
        }
        if command.is_empty() {
            return Err(usage());
        }
        let input = input.ok_or_else(usage)?;
        Ok(Self {
            command,
            input,
            out,
            all,
            draw_policy,
        })
    }
}

fn usage() -> String {
    "usage: docshield <analyze|clean> <file> [--all] [--strip-drawings] [--out <path>]"
        .to_string()
}

fn detect_format(path: &Path) -> Result<DocumentFormat, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| format!("cannot determine format of {}", path.display()))?;
    DocumentFormat::from_extension(ext).map_err(|e| e.to_string())
}

fn run() -> Result<(), String> {
    let args = CliArgs::from_args()?;
    let format = detect_format(&args.input)?;
    let bytes = std::fs::read(&args.input)
        .map_err(|e| format!("cannot read {}: {}", args.input.display(), e))?;
    let name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let sanitizer = Sanitizer::new();
    let cancel = CancelToken::new();

    match args.command.as_str() {
        "analyze" => {
            let outcome = sanitizer
                .analyze(&bytes, format, &name, &cancel)
                .map_err(|e| e.to_string())?;
            let json =
                docshield::report::to_json(&outcome.report).map_err(|e| e.to_string())?;
            println!("{}", json);
            Ok(())
        },
        "clean" => {
            let options = if args.all {
                CleanOptions::all().with_draw_policy(args.draw_policy)
            } else {
                CleanOptions {
                    remove_metadata: true,
                    remove_comments: true,
                    draw_policy: args.draw_policy,
                    ..Default::default()
                }
            };
            let outcome = sanitizer
                .clean(&bytes, format, &name, &options, &cancel)
                .map_err(|e| e.to_string())?;
            log::info!(
                "score {} -> {}",
                outcome.report.score_before,
                outcome.report.score_after.unwrap_or(outcome.report.score_before)
            );
            let archive = package(&[outcome]).map_err(|e| e.to_string())?;
            let out_path = args
                .out
                .unwrap_or_else(|| args.input.with_extension("cleaned.zip"));
            std::fs::write(&out_path, archive)
                .map_err(|e| format!("cannot write {}: {}", out_path.display(), e))?;
            println!("wrote {}", out_path.display());
            Ok(())
        },
        other => Err(format!("unknown command: {}\n{}", other, usage())),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        },
    }
}
