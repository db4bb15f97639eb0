//! Mermaid diagram conversion – drives the mermaid CLI (`mmdc`) to turn
//! `.mmd` sources into the PNG or SVG assets the PDF pipeline embeds.
//!
//! Rendering is best-effort per file: a failing diagram is logged and
//! counted, never fatal to the batch.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use which::which;

/// How to reach the mermaid CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MermaidRenderer {
    /// A concrete `mmdc` binary.
    Direct(PathBuf),
    /// Fall back to `npx -y -p @mermaid-js/mermaid-cli mmdc`.
    Npx,
}

impl MermaidRenderer {
    /// Locate a renderer: `MDPRESS_MMDC` env override, then `mmdc` on PATH,
    /// then `npx`.
    pub fn locate() -> Option<Self> {
        if let Ok(path) = std::env::var("MDPRESS_MMDC") {
            return Some(MermaidRenderer::Direct(PathBuf::from(path)));
        }
        if let Ok(path) = which("mmdc") {
            return Some(MermaidRenderer::Direct(path));
        }
        if which("npx").is_ok() {
            return Some(MermaidRenderer::Npx);
        }
        None
    }

    fn command(&self) -> Command {
        match self {
            MermaidRenderer::Direct(path) => Command::new(path),
            MermaidRenderer::Npx => {
                let mut cmd = Command::new("npx");
                cmd.args(["-y", "-p", "@mermaid-js/mermaid-cli", "mmdc"]);
                cmd
            }
        }
    }
}

/// Output format for rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagramFormat {
    #[default]
    Png,
    Svg,
}

impl DiagramFormat {
    pub fn extension(self) -> &'static str {
        match self {
            DiagramFormat::Png => "png",
            DiagramFormat::Svg => "svg",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Some(DiagramFormat::Png),
            "svg" => Some(DiagramFormat::Svg),
            _ => None,
        }
    }
}

/// Settings for a batch render.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub format: DiagramFormat,
    pub theme: String,
    pub background: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Leave assets already on disk alone.
    pub skip_existing: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: DiagramFormat::Png,
            theme: "default".to_string(),
            background: "white".to_string(),
            width: None,
            height: None,
            skip_existing: true,
        }
    }
}

/// Strip stray fence lines from a `.mmd` source. Files copied out of
/// Markdown sometimes keep them, and mmdc rejects the result.
pub fn clean_source(source: &str) -> String {
    source
        .lines()
        .filter(|line| {
            let t = line.trim();
            t != "```" && t != "```mermaid" && t != "```plaintext"
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_args(input: &Path, output: &Path, settings: &RenderSettings) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.display().to_string(),
        "-o".to_string(),
        output.display().to_string(),
        "-t".to_string(),
        settings.theme.clone(),
        "-b".to_string(),
        settings.background.clone(),
    ];
    if let Some(w) = settings.width {
        args.push("-w".to_string());
        args.push(w.to_string());
    }
    if let Some(h) = settings.height {
        args.push("-H".to_string());
        args.push(h.to_string());
    }
    args
}

/// Render one `.mmd` file to `dest`.
pub fn render_file(
    renderer: &MermaidRenderer,
    source: &Path,
    dest: &Path,
    settings: &RenderSettings,
) -> Result<(), String> {
    let raw =
        fs::read_to_string(source).map_err(|e| format!("read {}: {e}", source.display()))?;
    let cleaned = clean_source(&raw);

    // mmdc wants a file input; stage the cleaned source in a scratch dir.
    let scratch = tempfile::tempdir().map_err(|e| format!("scratch dir: {e}"))?;
    let input = scratch.path().join("source.mmd");
    fs::write(&input, cleaned).map_err(|e| format!("stage source: {e}"))?;

    let status = renderer
        .command()
        .args(render_args(&input, dest, settings))
        .status()
        .map_err(|e| format!("spawn mermaid renderer: {e}"))?;

    if !status.success() {
        return Err(format!("renderer exited with {status}"));
    }
    if !dest.is_file() {
        return Err("renderer reported success but wrote no output".to_string());
    }
    Ok(())
}

/// Tallies for a directory render.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Render every `.mmd` file in `source_dir` into
/// `out_dir/images/<fmt>/<stem>.<ext>`. Sources are processed in sorted
/// order so figure numbering stays stable across runs.
pub fn render_directory(
    renderer: &MermaidRenderer,
    source_dir: &Path,
    out_dir: &Path,
    settings: &RenderSettings,
) -> Result<RenderSummary, String> {
    let mut sources: Vec<PathBuf> = fs::read_dir(source_dir)
        .map_err(|e| format!("read {}: {e}", source_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "mmd"))
        .collect();
    sources.sort();

    let dest_dir = out_dir.join("images").join(settings.format.extension());
    fs::create_dir_all(&dest_dir)
        .map_err(|e| format!("create {}: {e}", dest_dir.display()))?;

    let mut summary = RenderSummary::default();
    for source in &sources {
        let stem = match source.file_stem() {
            Some(s) => s.to_string_lossy().into_owned(),
            None => continue,
        };
        let dest = dest_dir.join(format!("{stem}.{}", settings.format.extension()));
        if settings.skip_existing && dest.is_file() {
            summary.skipped += 1;
            continue;
        }
        match render_file(renderer, source, &dest, settings) {
            Ok(()) => summary.converted += 1,
            Err(e) => {
                log::warn!("Diagram '{}' failed: {e}", source.display());
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}
