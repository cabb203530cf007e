use crate::config::load_config;
use crate::ir::Scene;
use crate::layout::Size;
use crate::layout_dump::write_layout_dump;
#[cfg(feature = "png")]
use crate::render::write_output_png;
use crate::render::write_output_svg;
use crate::{RenderOptions, play_validated};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "flowstage", version, about = "Render staged flow diagrams to SVG/PNG")]
pub struct Args {
    /// Scene file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width
    #[arg(short = 'w', long = "width", default_value_t = 1280.0)]
    pub width: f32,

    /// Viewport height
    #[arg(short = 'H', long = "height", default_value_t = 720.0)]
    pub height: f32,

    /// Step index to show
    #[arg(long = "step")]
    pub step: Option<usize>,

    /// Virtual time to run the stage before rendering
    #[arg(long = "elapsedMs")]
    pub elapsed_ms: Option<u64>,

    /// Write computed geometry as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let input = read_input(args.input.as_deref())?;
    let scene = Scene::from_json(&input)?;
    if scene.nodes.is_empty() {
        tracing::warn!("scene has no nodes");
    }

    let options = RenderOptions {
        viewport: Size::new(args.width, args.height),
        step: args.step,
        elapsed: args.elapsed_ms.map(Duration::from_millis),
        config,
    };
    let player = play_validated(scene, &options);
    tracing::info!(
        step = ?player.step_name(),
        scale = player.stage().scale(),
        paths = player.stage().paths().len(),
        "stage settled"
    );

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &player.frame())?;
    }

    let svg = player.render_svg();
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &options)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, options: &RenderOptions) -> Result<()> {
    Ok(write_output_png(svg, output, &options.config.render)?)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _options: &RenderOptions) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "flowstage=debug" } else { "flowstage=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stage_flags() {
        let args = Args::try_parse_from([
            "flowstage",
            "-i",
            "scene.json",
            "--step",
            "2",
            "--elapsedMs",
            "1500",
            "-w",
            "640",
        ])
        .unwrap();
        assert_eq!(args.step, Some(2));
        assert_eq!(args.elapsed_ms, Some(1500));
        assert_eq!(args.width, 640.0);
        assert_eq!(args.height, 720.0);
        assert!(matches!(args.output_format, OutputFormat::Svg));
    }

    #[test]
    fn png_requires_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        let path = PathBuf::from("out.png");
        assert_eq!(ensure_output(&Some(path.clone()), "png").unwrap(), path);
    }

    #[test]
    fn reads_scene_from_file() {
        let path = std::env::temp_dir().join("flowstage-cli-read-input.json");
        std::fs::write(&path, r#"{"nodes": []}"#).unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), r#"{"nodes": []}"#);
        let _ = std::fs::remove_file(&path);
    }
}
