//! mdpress – command-line Markdown → PDF converter.
//!
//! Usage:
//!   mdpress <input.md>... [-o out.pdf] [--title "Atlas Whitepaper"]
//!
//! One input converts directly. Several inputs assemble into a book with a
//! cover page and table of contents; with `--separate` each input becomes
//! its own PDF instead.

use std::{env, fs, path::PathBuf, process};

use mdpress::book::{convert_book, convert_each, BookPlan};
use mdpress::pipeline::{convert_document, RenderOptions};
use mdpress::samples;
use mdpress::style::{ColorScheme, PageSize};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut out: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut page_size = PageSize::A4;
    let mut scheme = ColorScheme::Color;
    let mut diagrams_dir: Option<PathBuf> = None;
    let mut body_font: Option<PathBuf> = None;
    let mut dump_layout: Option<PathBuf> = None;
    let mut separate = false;
    let mut demo = false;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--title" | "-t" => title = Some(next_value(&mut iter, "--title")),
            "--page-size" | "-p" => {
                let v = next_value(&mut iter, "--page-size");
                page_size = match PageSize::parse(&v) {
                    Some(s) => s,
                    None => {
                        eprintln!("Invalid value for --page-size: '{v}' (expected a4 or letter)");
                        process::exit(1);
                    }
                };
            }
            "--scheme" | "-s" => {
                let v = next_value(&mut iter, "--scheme");
                scheme = match ColorScheme::parse(&v) {
                    Some(s) => s,
                    None => {
                        eprintln!("Invalid value for --scheme: '{v}' (expected color or grayscale)");
                        process::exit(1);
                    }
                };
            }
            "--diagrams" | "-d" => {
                diagrams_dir = Some(PathBuf::from(next_value(&mut iter, "--diagrams")))
            }
            "--font" => body_font = Some(PathBuf::from(next_value(&mut iter, "--font"))),
            "--out" | "-o" => out = Some(PathBuf::from(next_value(&mut iter, "--out"))),
            "--dump-layout" => {
                dump_layout = Some(PathBuf::from(next_value(&mut iter, "--dump-layout")))
            }
            "--separate" => separate = true,
            "--demo" => demo = true,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => inputs.push(PathBuf::from(path)),
        }
    }

    if demo {
        print!("{}", samples::whitepaper_sample());
        return;
    }

    if inputs.is_empty() {
        eprintln!("Error: no input file specified.");
        print_usage(&args[0]);
        process::exit(1);
    }

    let mut opts = RenderOptions {
        page_size,
        scheme,
        diagrams_dir,
        body_font,
        ..RenderOptions::default()
    };

    // Batch mode: one PDF per input, named after its stem.
    if separate {
        let out_dir = out.unwrap_or_else(|| PathBuf::from("."));
        match convert_each(&inputs, &out_dir, &opts) {
            Ok(outcome) => {
                let w = outcome.written.len();
                eprintln!(
                    "Wrote {} file{}, {} failed",
                    w,
                    if w == 1 { "" } else { "s" },
                    outcome.failures.len()
                );
                if !outcome.all_ok() {
                    process::exit(1);
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let result = if inputs.len() == 1 {
        let input = &inputs[0];
        let markdown = match fs::read_to_string(input) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error reading '{}': {e}", input.display());
                process::exit(1);
            }
        };
        // Default title: stem of the input filename.
        let default_title = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mdpress output")
            .to_string();
        opts.title = title.unwrap_or(default_title);
        convert_document(&markdown, &opts)
    } else {
        let book_title = title.unwrap_or_else(|| "Document Collection".to_string());
        let plan = BookPlan::from_paths(book_title, &inputs);
        convert_book(&plan, &opts)
    };

    // Default output: same stem as the single input, or book.pdf.
    let output = out.unwrap_or_else(|| {
        if inputs.len() == 1 {
            let mut o = inputs[0].clone();
            o.set_extension("pdf");
            o
        } else {
            PathBuf::from("book.pdf")
        }
    });

    match result {
        Ok((bytes, layout)) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Error creating output directory: {e}");
                        process::exit(1);
                    }
                }
            }
            if let Err(e) = fs::write(&output, &bytes) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            if let Some(path) = dump_layout {
                if let Err(e) = fs::write(&path, layout.to_json()) {
                    eprintln!("Error writing '{}': {e}", path.display());
                    process::exit(1);
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
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn next_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("mdpress – Markdown to branded PDF converter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.md>... [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.md>...     One file converts directly; several assemble into a book");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t       Document title (default: input filename stem)");
    eprintln!("  --out, -o         Output path; a directory when --separate is set");
    eprintln!("  --page-size, -p   a4 or letter (default: a4)");
    eprintln!("  --scheme, -s      color or grayscale (default: color)");
    eprintln!("  --diagrams, -d    Directory with .mmd sources and rendered images/");
    eprintln!("  --font            TTF file used to refine text measurement");
    eprintln!("  --separate        Convert each input to its own PDF");
    eprintln!("  --dump-layout     Also write the computed layout as JSON to this file");
    eprintln!("  --demo            Print a sample whitepaper document and exit");
    eprintln!("  --help            Print this message");
}
