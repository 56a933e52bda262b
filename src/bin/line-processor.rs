//! CLI tool that runs the line processor over stdin or a file.

use clap::Parser;
use line_processor::logging::init_logging;
use line_processor::{PipelineReport, execute_serial, run_pipeline};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;

/// Reassemble input lines into 80-character records.
///
/// Line terminators become spaces, every "++" becomes "^", and only complete
/// 80-character lines are written. Input ends at a line reading exactly
/// "STOP" or at end of input.
#[derive(Parser)]
#[command(name = "line-processor")]
struct Cli {
    /// Input file (defaults to stdin)
    input: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Run every stage on one thread instead of the threaded pipeline
    #[arg(long)]
    serial: bool,

    /// Show paths, executor, and line counts on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.verbose {
        eprintln!("Input:    {}", cli.input.as_deref().unwrap_or("(stdin)"));
        eprintln!("Output:   {}", cli.output.as_deref().unwrap_or("(stdout)"));
        eprintln!(
            "Executor: {}",
            if cli.serial { "serial" } else { "threaded" }
        );
    }

    let input: Box<dyn io::BufRead + Send> = match &cli.input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error reading input file '{path}': {e}");
                process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let output: Box<dyn Write + Send> = match &cli.output {
        Some(out_path) => {
            if let Some(parent) = Path::new(out_path.as_str()).parent()
                && !parent.as_os_str().is_empty()
                && fs::create_dir_all(parent).is_err()
            {
                eprintln!("Error creating output directory for '{out_path}'");
                process::exit(1);
            }
            match File::create(out_path) {
                Ok(file) => Box::new(BufWriter::new(file)),
                Err(e) => {
                    eprintln!("Error writing output file '{out_path}': {e}");
                    process::exit(1);
                }
            }
        }
        None => Box::new(io::stdout()),
    };

    let result = if cli.serial {
        execute_serial(input, output)
    } else {
        run_pipeline(input, output)
    };

    match result {
        Ok(report) => {
            if cli.verbose {
                print_report(&report);
            }
        }
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            process::exit(1);
        }
    }
}

fn print_report(report: &PipelineReport) {
    eprintln!(
        "Lines:    {} in ({:?}) -> {} records out",
        report.lines_read, report.input_end, report.records_written
    );
    if report.bytes_discarded > 0 {
        eprintln!("Dropped:  {} trailing bytes", report.bytes_discarded);
    }
}
