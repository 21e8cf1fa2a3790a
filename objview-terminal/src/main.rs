/// objview Terminal - ASCII viewer for OBJ meshes
///
/// Loads an OBJ file (or a built-in cube) and renders it in the terminal.
/// Controls:
///   - E/R: Scale the model up/down
///   - T/Y, U/I, O/P: Move the model along x, y, z
///   - A/S, D/F, G/H (arrows for x/y): Rotate the model
///   - 0/9/8/7: Translate, rotate, scale, reflect the mesh geometry itself
///   - Space: Cycle shading mode
///   - Q/ESC: Quit

use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::{Point3, Vector3};
use objview_core::{import_mesh, MeshGeometry, ModelTransform};
use objview_terminal::{ShadingMode, TerminalApp, ViewerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "objview-terminal")]
#[command(version, about = "Render and edit OBJ meshes in the terminal")]
struct Cli {
    /// OBJ file to load. A unit cube with a corner at the origin is shown when omitted.
    path: Option<PathBuf>,

    /// Initial uniform model scale.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Initial model position as x,y,z.
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    position: Option<[f32; 3]>,

    /// Initial shading mode.
    #[arg(long, value_enum, default_value_t = ShadingMode::Flat)]
    shading: ShadingMode,

    /// Spin the model about y.
    #[arg(long)]
    spin: bool,

    /// Frame rate target.
    #[arg(long, default_value_t = 30)]
    fps: u64,
}

fn parse_vec3(s: &str) -> std::result::Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{}'", s));
    }

    let mut out = [0.0; 3];
    for (value, part) in out.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|_| format!("invalid number '{}'", part))?;
    }
    Ok(out)
}

fn main() -> Result<()> {
    // Log to stderr so the alternate screen stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let geometry = match &cli.path {
        Some(path) => import_mesh(path)
            .with_context(|| format!("Failed to load OBJ file: {}", path.display()))?,
        None => MeshGeometry::unit_cube(),
    };

    println!(
        "Loaded {} vertices, {} triangles",
        geometry.vertex_count(),
        geometry.face_count()
    );

    let [x, y, z] = cli.position.unwrap_or([0.0; 3]);
    let config = ViewerConfig {
        model: ModelTransform::new(Point3::new(x, y, z), cli.scale, Vector3::zeros()),
        shading: cli.shading,
        spin: cli.spin,
        target_fps: cli.fps,
    };

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    // Run the terminal app
    let mut app = TerminalApp::new(geometry, config)?;
    app.run()?;

    println!("Thank you for using objview!");
    Ok(())
}
