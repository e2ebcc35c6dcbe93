//! receipts – command-line attributes → Arabic PDF generator.
//!
//! Usage:
//!   receipts <attributes.json> [output.pdf] [--kind invoice] [--landscape]
//!            [--layout layout.json] [--calls]
//!
//! If `output.pdf` is omitted the PDF is written next to the input file with
//! the same stem (e.g. `march.json` → `march.pdf`).

use std::{env, fs, path::Path, path::PathBuf, process};

use receipts_rtl::document::{DocumentAttributes, DocumentKind};
use receipts_rtl::pipeline::{generate_pdf, record_calls, PageOrientation, PipelineConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut layout_path: Option<PathBuf> = None;
    let mut landscape = false;
    let mut calls_only = false;
    let mut kind: Option<DocumentKind> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--calls" => calls_only = true,
            "--kind" | "-k" => match iter.next().map(|v| v.parse::<DocumentKind>()) {
                Some(Ok(k)) => kind = Some(k),
                Some(Err(e)) => fail(&args[0], &e),
                None => fail(&args[0], "--kind needs a value"),
            },
            "--layout" => match iter.next() {
                Some(v) => layout_path = Some(PathBuf::from(v)),
                None => fail(&args[0], "--layout needs a path"),
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => fail(&args[0], &format!("Unknown flag: {other}")),
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    fail(&args[0], &format!("Unexpected argument: {path}"));
                }
                positional += 1;
            }
        }
    }

    let Some(input) = input_path else {
        fail(&args[0], "no input file specified.");
    };

    let json = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };
    let attributes = match DocumentAttributes::from_json(&json) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let config = PipelineConfig {
        kind,
        orientation: if landscape {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        },
        ..PipelineConfig::default()
    };

    if calls_only {
        match record_calls(&attributes, &config).and_then(|c| c.to_json()) {
            Ok(transcript) => println!("{transcript}"),
            Err(e) => {
                eprintln!("Error composing document: {e}");
                process::exit(1);
            }
        }
        return;
    }

    // Default output: same directory + same stem as input, but with .pdf
    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("pdf");
        o
    });

    match generate_pdf(&attributes, &config) {
        Ok((bytes, layout)) => {
            write_file(&output, &bytes);
            if let Some(path) = layout_path {
                match layout.to_json() {
                    Ok(json) => write_file(&path, json.as_bytes()),
                    Err(e) => {
                        eprintln!("Error serialising layout: {e}");
                        process::exit(1);
                    }
                }
            }
            let pages = layout.pages.len();
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{})",
                output.display(),
                bytes.len(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error generating PDF: {e}");
            process::exit(1);
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) {
    // Create output directory if necessary.
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn fail(prog: &str, message: &str) -> ! {
    eprintln!("Error: {message}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("receipts – Arabic receipts, invoices and statements as PDF");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <attributes.json> [output.pdf] [--kind invoice] [--landscape] [--layout layout.json] [--calls]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <attributes.json>  Company, recipient, details and line items");
    eprintln!("  [output.pdf]       Output path  (default: same stem as input with .pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --kind, -k     invoice | receipt | statement (supplies the default title)");
    eprintln!("  --landscape    Swap page width and height");
    eprintln!("  --layout       Also write the page layout as JSON");
    eprintln!("  --calls        Print the placement calls as JSON instead of writing a PDF");
    eprintln!("  --help         Print this message");
}
