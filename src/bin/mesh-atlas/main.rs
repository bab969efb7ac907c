//! mesh-atlas CLI - lightmap atlas generation from the command line.
//!
//! Usage: mesh-atlas <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `mesh-atlas --help` for available commands.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use mesh_atlas::io;
use mesh_atlas::mesh::build_mesh;
use mesh_atlas::{Atlas, CharterOptions, PackMethod, PackerOptions, Progress};

#[derive(Parser)]
#[command(name = "mesh-atlas")]
#[command(author, version, about = "Lightmap atlas generation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information and topology warnings
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Do not weld vertices at identical positions
        #[arg(long)]
        no_weld: bool,
    },

    /// Generate an atlas and write the mesh with its new UVs
    Generate {
        /// Input mesh file
        input: PathBuf,

        /// Output OBJ file
        output: PathBuf,

        /// Packing method
        #[arg(short, long, value_enum, default_value = "approximate")]
        method: Method,

        /// Target page resolution in texels
        #[arg(short, long, default_value = "512")]
        resolution: u32,

        /// Texels per world unit of surface area (texel-area method)
        #[arg(short, long, default_value = "8.0")]
        texel_area: f32,

        /// Attempt budget level for the exact method (0 = unbounded)
        #[arg(short, long, default_value = "1")]
        quality: u32,

        /// Texels of padding between charts
        #[arg(short, long, default_value = "0")]
        padding: u32,

        /// Align charts to 4x4 texel blocks
        #[arg(long)]
        block_align: bool,

        /// Add one extra texel of padding against filtering bleed
        #[arg(long)]
        conservative: bool,

        /// Never rotate charts
        #[arg(long)]
        no_rotation: bool,

        /// Maximum chart area in world units
        #[arg(long)]
        max_chart_area: Option<f32>,

        /// Maximum chart boundary length in world units
        #[arg(long)]
        max_boundary_length: Option<f32>,

        /// Growth cost threshold
        #[arg(long, default_value = "2.0")]
        max_cost: f32,

        /// Write a PNG preview of the chart layout
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Do not weld vertices at identical positions
        #[arg(long)]
        no_weld: bool,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Fixed texel density, page size follows
    TexelArea,
    /// Page size close to the resolution
    Approximate,
    /// Page size exactly the resolution (slow)
    Exact,
}

impl From<Method> for PackMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::TexelArea => PackMethod::TexelArea,
            Method::Approximate => PackMethod::ApproximateResolution,
            Method::Exact => PackMethod::ExactResolution,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, no_weld } => {
            cmd_info(&input, !no_weld)?;
        }

        Commands::Generate {
            input,
            output,
            method,
            resolution,
            texel_area,
            quality,
            padding,
            block_align,
            conservative,
            no_rotation,
            max_chart_area,
            max_boundary_length,
            max_cost,
            preview,
            no_weld,
            sequential,
        } => {
            let mut charter = CharterOptions::default()
                .with_max_cost(max_cost)
                .with_parallel(!sequential);
            if let Some(area) = max_chart_area {
                charter = charter.with_max_chart_area(area);
            }
            if let Some(length) = max_boundary_length {
                charter = charter.with_max_boundary_length(length);
            }

            let packer = PackerOptions::default()
                .with_method(method.into())
                .with_resolution(resolution)
                .with_texel_area(texel_area)
                .with_quality(quality)
                .with_padding(padding)
                .with_block_align(block_align)
                .with_conservative(conservative)
                .with_rotation(!no_rotation)
                .with_parallel(!sequential);

            cmd_generate(&input, &output, preview.as_deref(), &charter, &packer, !no_weld)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
///
/// Each pipeline stage restarts the bar when its message first appears.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0)); // Track highest percent seen (monotonic)
    let stage = Arc::new(Mutex::new(String::new()));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        if let Ok(mut stage) = stage.lock() {
            if *stage != message {
                if !stage.is_empty() {
                    eprintln!();
                }
                *stage = message.to_string();
                max_percent.store(0, Ordering::Relaxed);
            }
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only ever increase within a stage
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, raw_percent, message);
        let _ = std::io::stderr().flush();
    })
}

fn cmd_info(input: &Path, use_colocal: bool) -> Result<(), Box<dyn std::error::Error>> {
    let buffers = io::load(input)?;

    let mut warnings: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mesh = build_mesh(&buffers.input(), use_colocal, &mut |w| {
        *warnings.entry(w.kind.as_str()).or_default() += 1;
    })?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!(
        "Attributes: normals={}, uvs={}, materials={}",
        buffers.normals.is_some(),
        buffers.uvs.is_some(),
        buffers.face_materials.is_some()
    );

    // Compute some statistics
    let mut min_area = f64::MAX;
    let mut max_area = 0.0_f64;
    for fid in mesh.face_ids() {
        let area = mesh.face_area(fid);
        min_area = min_area.min(area);
        max_area = max_area.max(area);
    }
    println!("Surface area: {:.6}", mesh.surface_area());
    println!("Face area range: [{:.6}, {:.6}]", min_area, max_area);

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    let boundary = mesh.num_boundary_halfedges();
    if boundary == 0 {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary half-edges)", boundary);
    }

    if warnings.is_empty() {
        println!("Warnings: none");
    } else {
        println!("Warnings:");
        for (kind, count) in &warnings {
            println!("  {}: {}", kind, count);
        }
    }

    Ok(())
}

fn cmd_generate(
    input: &Path,
    output: &Path,
    preview: Option<&Path>,
    charter: &CharterOptions,
    packer: &PackerOptions,
    use_colocal: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let buffers = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", buffers.vertex_count(), buffers.face_count());

    let mut atlas = Atlas::new();
    let mut warnings = 0;
    atlas.add_mesh_with(&buffers.input(), use_colocal, |w| {
        warnings += 1;
        log::warn!("{}", w);
    })?;
    if warnings > 0 {
        println!("Warnings: {} (run with RUST_LOG=warn for details)", warnings);
    }

    let mode = if packer.parallel { "parallel" } else { "sequential" };
    println!("Generating atlas ({}, {})...", packer.method, mode);
    let progress = create_progress();

    let start = Instant::now();
    atlas.generate_with_progress(charter, packer, &progress)?;
    let elapsed = start.elapsed();
    eprintln!();

    println!(
        "Result: {} charts, {} page(s) of {}x{}, {:.1}% utilization",
        atlas.num_charts(),
        atlas.page_count(),
        atlas.width(),
        atlas.height(),
        atlas.utilization() * 100.0
    );

    io::obj::save_with_uvs(&buffers, &atlas.meshes()[0], atlas.width(), atlas.height(), output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    if let Some(preview) = preview {
        for page in 0..atlas.page_count() {
            let path = page_path(preview, page);
            io::preview::save_page(&atlas, page, &path)?;
            println!("Preview: {}", path.display());
        }
    }

    Ok(())
}

/// `atlas.png` for page 0, `atlas_1.png` for page 1 and so on.
fn page_path(base: &Path, page: u32) -> PathBuf {
    if page == 0 {
        return base.to_path_buf();
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("preview");
    let ext = base.extension().and_then(|e| e.to_str()).unwrap_or("png");
    base.with_file_name(format!("{}_{}.{}", stem, page, ext))
}
