//! mdpress-diagrams – batch-render `.mmd` Mermaid sources into the image
//! assets the PDF pipeline embeds.
//!
//! Usage:
//!   mdpress-diagrams <diagrams-dir> [--format png|svg] [--out-dir DIR]
//!
//! Outputs land in `<out-dir>/images/<format>/<stem>.<ext>`. The output
//! directory defaults to the source directory, which is where the PDF
//! pipeline looks for assets.

use std::{env, path::PathBuf, process};

use mdpress::mermaid::{render_directory, DiagramFormat, MermaidRenderer, RenderSettings};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut source_dir: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut settings = RenderSettings::default();

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" | "-f" => {
                let v = next_value(&mut iter, "--format");
                settings.format = match DiagramFormat::parse(&v) {
                    Some(f) => f,
                    None => {
                        eprintln!("Invalid value for --format: '{v}' (expected png or svg)");
                        process::exit(1);
                    }
                };
            }
            "--out-dir" | "-o" => {
                out_dir = Some(PathBuf::from(next_value(&mut iter, "--out-dir")))
            }
            "--theme" => settings.theme = next_value(&mut iter, "--theme"),
            "--background" | "-b" => settings.background = next_value(&mut iter, "--background"),
            "--width" | "-w" => {
                settings.width = Some(parse_dimension(&next_value(&mut iter, "--width"), "--width"))
            }
            "--height" | "-H" => {
                settings.height =
                    Some(parse_dimension(&next_value(&mut iter, "--height"), "--height"))
            }
            "--force" => settings.skip_existing = false,
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if source_dir.is_some() {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                source_dir = Some(PathBuf::from(path));
            }
        }
    }

    let source_dir = match source_dir {
        Some(d) => d,
        None => {
            eprintln!("Error: no diagram directory specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };
    let out_dir = out_dir.unwrap_or_else(|| source_dir.clone());

    let renderer = match MermaidRenderer::locate() {
        Some(r) => r,
        None => {
            eprintln!("Error: no mermaid renderer found.");
            eprintln!("Install @mermaid-js/mermaid-cli, or set MDPRESS_MMDC to an mmdc binary.");
            process::exit(1);
        }
    };

    match render_directory(&renderer, &source_dir, &out_dir, &settings) {
        Ok(summary) => {
            eprintln!(
                "Rendered {}, skipped {}, failed {}",
                summary.converted, summary.skipped, summary.failed
            );
            if summary.failed > 0 {
                process::exit(1);
            }
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

fn parse_dimension(value: &str, flag: &str) -> u32 {
    match value.parse() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Invalid value for {flag}: '{value}' (expected an integer)");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("mdpress-diagrams – Mermaid source to image converter");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <diagrams-dir> [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <diagrams-dir>      Directory containing .mmd sources");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --format, -f        png or svg (default: png)");
    eprintln!("  --out-dir, -o       Where images/<format>/ is created (default: source dir)");
    eprintln!("  --theme             Mermaid theme passed to mmdc (default: default)");
    eprintln!("  --background, -b    Background color passed to mmdc (default: white)");
    eprintln!("  --width, -w         Render width in pixels");
    eprintln!("  --height, -H        Render height in pixels");
    eprintln!("  --force             Re-render assets that already exist");
    eprintln!("  --help              Print this message");
}
