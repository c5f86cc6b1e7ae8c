//! Surface file loading

use std::path::Path;

use anyhow::{Context, Result, bail};
use picking::SurfaceModel;
use tracing::info;

/// Load a surface from JSON.
///
/// The file holds `{ "meshes": [{ "positions": [[x, y, z], ...], "indices": [...] }],
/// "transform": [16 floats, column-major] }`; `transform` may be omitted.
pub fn load_surface(path: &Path) -> Result<SurfaceModel> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read surface file {}", path.display()))?;
    let surface: SurfaceModel = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse surface file {}", path.display()))?;

    if surface.triangle_count() == 0 {
        bail!("Surface file {} has no triangles", path.display());
    }
    for (k, mesh) in surface.meshes.iter().enumerate() {
        if mesh.indices.len() % 3 != 0 {
            bail!("Mesh {k} has {} indices, not a multiple of 3", mesh.indices.len());
        }
        if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= mesh.positions.len()) {
            bail!("Mesh {k} references vertex {bad} of {}", mesh.positions.len());
        }
    }

    info!(
        "Loaded surface {}: {} meshes, {} triangles",
        path.display(),
        surface.meshes.len(),
        surface.triangle_count()
    );
    Ok(surface)
}
