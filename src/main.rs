//! Cellcalc - evaluate and edit formula spreadsheets from the command line

mod config;
mod logger;

use anyhow::{Context, Result, bail};
use cellcalc_core::{CellRef, Spreadsheet};
use cellcalc_engine::engine::ERROR_VALUE;
use log::LevelFilter;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn print_usage() {
    eprintln!("Usage: cellcalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet file to open (.xml)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <CELL>=<TEXT>   Set a cell's text, e.g. A1==B1*2 (can be repeated)");
    eprintln!("  -c, --command <FORMULA>   Evaluate a formula against the sheet and print it");
    eprintln!("  -o, --output <FILE>       Save the sheet as XML");
    eprintln!("  --config <FILE>           Load settings from a TOML file");
    eprintln!("  -v, --verbose             Log more to stderr (can be repeated)");
    eprintln!("  -h, --help                Print help");
}

#[derive(Debug, Default)]
struct Options {
    file_path: Option<PathBuf>,
    edits: Vec<String>,
    command: Option<String>,
    output_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    verbosity: u8,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            "-s" | "--set" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --set requires CELL=TEXT");
                    return ExitCode::FAILURE;
                }
                options.edits.push(args[i].to_string());
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires a formula");
                    return ExitCode::FAILURE;
                }
                options.command = Some(args[i].to_string());
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    return ExitCode::FAILURE;
                }
                options.output_file = Some(PathBuf::from(&args[i]));
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    return ExitCode::FAILURE;
                }
                options.config_file = Some(PathBuf::from(&args[i]));
            }
            "-v" | "--verbose" => options.verbosity = options.verbosity.saturating_add(1),
            arg if arg.starts_with('-') && arg.len() > 2 && arg[1..].chars().all(|c| c == 'v') => {
                let count = u8::try_from(arg.len() - 1).unwrap_or(u8::MAX);
                options.verbosity = options.verbosity.saturating_add(count);
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                return ExitCode::FAILURE;
            }
            _ => {
                if options.file_path.is_none() {
                    options.file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    return ExitCode::FAILURE;
                }
            }
        }
        i += 1;
    }

    match run(options) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(options: Options) -> Result<ExitCode> {
    let (config, warnings) = config::load_config(options.config_file.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let config_level = config.log_level().unwrap_or_else(|err| {
        eprintln!("Warning: {}", err);
        None
    });
    let level = logger::level_for_verbosity(options.verbosity)
        .or(config_level)
        .unwrap_or(LevelFilter::Warn);
    logger::init(level);

    let sheet_config = config.sheet_config();
    let mut sheet = Spreadsheet::with_file(&sheet_config, options.file_path.as_deref())
        .with_context(|| match &options.file_path {
            Some(path) => format!("Failed to open {}", path.display()),
            None => "Failed to create sheet".to_string(),
        })?;

    for edit in &options.edits {
        apply_edit(&mut sheet, edit)?;
    }

    if let Some(output_path) = &options.output_file {
        let saved = sheet
            .save_as(output_path)
            .with_context(|| format!("Failed to save {}", output_path.display()))?;
        if options.command.is_none() {
            println!("Saved to {}", saved.display());
            return Ok(ExitCode::SUCCESS);
        }
    }

    if let Some(formula) = &options.command {
        let value = sheet.evaluate(formula);
        println!("{}", value);
        return Ok(if value == ERROR_VALUE {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    for cell in sheet.populated_cells() {
        println!(
            "{}\t{}\t{}",
            sheet.cell_name(cell.position()),
            cell.text(),
            cell.value()
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Apply one `CELL=TEXT` edit. Everything after the first `=` is the text.
fn apply_edit(sheet: &mut Spreadsheet, edit: &str) -> Result<()> {
    let Some((name, text)) = edit.split_once('=') else {
        bail!("Invalid edit {:?}: expected CELL=TEXT", edit);
    };
    let Some(cell) = CellRef::from_str(name.trim()) else {
        bail!("Invalid cell name {:?} in edit {:?}", name, edit);
    };
    sheet
        .edit_text(cell, text)
        .with_context(|| format!("Failed to set {}", name.trim()))
}
