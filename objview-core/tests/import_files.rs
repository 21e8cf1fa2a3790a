//! End-to-end import tests against OBJ files on disk

use std::fs;
use std::path::Path;

use objview_core::nalgebra::Vector3;
use objview_core::{import_mesh, HostDevice, MeshError, MeshStore};
use tempfile::tempdir;

fn write_obj(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write OBJ");
    path
}

#[test]
fn test_import_textured_quad() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_obj(
        dir.path(),
        "quad.obj",
        "\
# two triangles sharing the diagonal
o quad
v -1 -1 0
v  1 -1 0
v  1  1 0
v -1  1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
",
    );

    let mesh = import_mesh(&path).expect("Failed to import");
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.face_count(), 2);
    assert_eq!(mesh.indices(), &[0, 1, 2, 0, 2, 3]);
    // (1, 1) flips to (1, 0)
    assert_eq!(&mesh.tex_coords()[4..6], &[1.0, 0.0]);
    assert!(mesh.normals().chunks(3).all(|n| n == [0.0, 0.0, 1.0]));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let err = import_mesh(dir.path().join("absent.obj")).unwrap_err();
    assert!(matches!(err, MeshError::Io(_)));
}

#[test]
fn test_malformed_file_returns_no_geometry() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_obj(dir.path(), "broken.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 x\n");
    let err = import_mesh(&path).unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn test_imported_mesh_drives_store() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = write_obj(dir.path(), "tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");

    let mut device = HostDevice::new();
    {
        let mut store = MeshStore::new(import_mesh(&path).unwrap(), &mut device).unwrap();
        store.translate(Vector3::new(1.0, 0.0, 0.0)).unwrap();

        let buffer = store.buffer().expect("buffer after edit");
        assert_eq!(
            buffer.positions(),
            &[1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 1.0, 1.0, 0.0]
        );
        assert_eq!(buffer.indices(), &[0, 1, 2]);
    }
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn test_latin1_comment_does_not_abort_import() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("latin1.obj");
    fs::write(&path, b"# exported by caf\xE9\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
        .expect("Failed to write OBJ");

    let mesh = import_mesh(&path).expect("Failed to import");
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.face_count(), 1);
}
