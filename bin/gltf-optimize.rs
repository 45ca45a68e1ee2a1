//! Command-line front end for the mesh optimization/LOD pipeline.
//!
//! Parses flags into an [`Options`](gltf_optimize::Options), runs
//! [`gltf_optimize::optimize`] against the default `meshopt`/`image`-backed
//! capabilities, and writes one `.glb` per requested LOD ratio next to the
//! output path (ratio `1.0` writes exactly to `--output`; every other ratio
//! gets a `_lodNN` suffix inserted before the extension).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use gltf_optimize::pipeline::{CancellationToken, Capabilities};
use gltf_optimize::{DefaultBufferCodec, DefaultImageCodec, DefaultSimplifier, Options};

/// Generate LOD variants of a glTF-Binary asset with quantized, compressed geometry.
#[derive(Parser)]
#[command(name = "gltf-optimize", author, version, about, long_about = None)]
struct Cli {
    /// Input `.glb` file.
    input: PathBuf,

    /// Output `.glb` file. Additional LOD ratios are written alongside it.
    output: PathBuf,

    /// Triangle-count ratios to generate, highest first. Repeat to pass more than one.
    #[arg(long = "lod", value_name = "RATIO")]
    lod_levels: Vec<f32>,

    /// Skip vertex deduplication.
    #[arg(long)]
    no_dedupe: bool,

    /// Skip vertex-cache/fetch reordering.
    #[arg(long)]
    no_cache_optimize: bool,

    /// Skip POSITION quantization.
    #[arg(long)]
    no_quantize_positions: bool,

    /// Bits used for quantized positions.
    #[arg(long, value_parser = clap::value_parser!(u8), default_value_t = 16)]
    position_bits: u8,

    /// Skip NORMAL quantization.
    #[arg(long)]
    no_quantize_normals: bool,

    /// Skip TANGENT quantization.
    #[arg(long)]
    no_quantize_tangents: bool,

    /// Skip TEXCOORD_n quantization.
    #[arg(long)]
    no_quantize_uvs: bool,

    /// Skip EXT_meshopt_compression on output bufferViews.
    #[arg(long)]
    no_meshopt: bool,

    /// Enable texture- and view-space importance analysis.
    #[arg(long)]
    texture_aware: bool,

    /// Importance score above which a vertex is locked against collapse.
    #[arg(long, default_value_t = 0.5)]
    importance_threshold: f32,

    /// Maximum geometric error simplification may introduce.
    #[arg(long, default_value_t = 0.02)]
    lod_error_threshold: f32,

    /// Uniform scale applied to material images before re-encoding.
    #[arg(long, default_value_t = 1.0)]
    texture_scale: f32,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    let mut options = Options::default();
    if !cli.lod_levels.is_empty() {
        options.lod_levels = cli.lod_levels;
    }
    options.deduplicate_vertices = !cli.no_dedupe;
    options.optimize_vertex_cache = !cli.no_cache_optimize;
    options.quantize_positions = !cli.no_quantize_positions;
    options.position_bits = cli.position_bits;
    options.quantize_normals = !cli.no_quantize_normals;
    options.quantize_tangents = !cli.no_quantize_tangents;
    options.quantize_uvs = !cli.no_quantize_uvs;
    options.meshopt_compression = !cli.no_meshopt;
    options.texture_aware = cli.texture_aware;
    options.importance_threshold = cli.importance_threshold;
    options.lod_error_threshold = cli.lod_error_threshold;
    options.texture_scale = cli.texture_scale;

    match run(&cli.input, &cli.output, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &Path, output: &Path, options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;

    let simplifier = DefaultSimplifier;
    let buffer_codec = DefaultBufferCodec;
    let image_codec = DefaultImageCodec;
    let capabilities = Capabilities {
        simplifier: &simplifier,
        buffer_codec: &buffer_codec,
        image_codec: &image_codec,
    };
    let cancel = CancellationToken::new();

    let result = gltf_optimize::optimize(&bytes, options, &capabilities, &cancel)?;

    for advisory in &result.advisories {
        log::warn!("{advisory}");
    }

    for lod in &result.lods {
        let path = output_path_for_ratio(output, lod.ratio, options.lod_levels.first().copied());
        std::fs::write(&path, &lod.glb)?;
        log::info!("wrote {} ({} bytes, ratio {})", path.display(), lod.glb.len(), lod.ratio);
    }

    Ok(())
}

/// The first (highest) ratio is written verbatim to `output`; every other
/// ratio gets a `_lodNN` suffix inserted before the extension, where `NN` is
/// the ratio expressed as a whole percentage.
fn output_path_for_ratio(output: &Path, ratio: f32, base_ratio: Option<f32>) -> PathBuf {
    if Some(ratio) == base_ratio {
        return output.to_path_buf();
    }
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let ext = output.extension().and_then(|s| s.to_str()).unwrap_or("glb");
    let percent = (ratio * 100.0).round() as i32;
    let file_name = format!("{stem}_lod{percent:03}.{ext}");
    output.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_ratio_keeps_original_path() {
        let out = PathBuf::from("model.glb");
        let path = output_path_for_ratio(&out, 1.0, Some(1.0));
        assert_eq!(path, out);
    }

    #[test]
    fn other_ratios_get_a_suffix() {
        let out = PathBuf::from("model.glb");
        let path = output_path_for_ratio(&out, 0.5, Some(1.0));
        assert_eq!(path, PathBuf::from("model_lod050.glb"));
    }
}
