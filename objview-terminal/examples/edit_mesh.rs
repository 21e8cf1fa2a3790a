/// Example: Load an OBJ file, edit its geometry and report the derived buffer
///
/// Usage: cargo run --example edit_mesh -- path/to/file.obj

use anyhow::{Context, Result};
use nalgebra::{Point3, Vector3};
use objview_core::{import_mesh, HostDevice, MeshGeometry, MeshStore};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let geometry = match args.get(1) {
        Some(path) => {
            println!("Loading OBJ file: {}", path);
            import_mesh(path).with_context(|| format!("Failed to load OBJ file: {}", path))?
        }
        None => {
            eprintln!("Usage: {} <obj-file>", args[0]);
            eprintln!("\nNo OBJ file provided, using default cube...");
            MeshGeometry::cube(2.0)
        }
    };

    let mut device = HostDevice::new();
    {
        let mut store = MeshStore::new(geometry, &mut device)?;
        report("loaded", &store);

        store.scale(2.0, 1.0, 1.0)?;
        report("scaled x2 along x", &store);

        store.rotate(Vector3::new(0.0, 1.0, 0.0), 90.0)?;
        report("rotated 90 degrees about y", &store);

        store.reflect(Point3::origin(), Vector3::new(1.0, 0.0, 0.0))?;
        report("reflected across x = 0", &store);

        store.dispose();
    }

    println!(
        "{} uploads, {} buffers still live",
        device.uploads(),
        device.live_buffers()
    );
    Ok(())
}

fn report(step: &str, store: &MeshStore<&mut HostDevice>) {
    let geometry = store.geometry();
    match geometry.bounds() {
        Some((min, max)) => println!(
            "{:<28} V={} F={} bounds=({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
            step,
            geometry.vertex_count(),
            geometry.face_count(),
            min.x,
            min.y,
            min.z,
            max.x,
            max.y,
            max.z
        ),
        None => println!("{:<28} empty mesh", step),
    }
}
