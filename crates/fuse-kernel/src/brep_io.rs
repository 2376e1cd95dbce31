//! BREP files: the compressed topology of a solid as pretty-printed JSON.

use crate::connect::CompressedBoundary;
use crate::types::KernelError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use truck_modeling::geometry::{Curve, Surface};
use truck_modeling::topology::{Shell, Solid};
use truck_modeling::Point3;
use truck_topology::compress::CompressedSolid;

/// Value of the `format` field written to every BREP file.
pub const BREP_FORMAT: &str = "step-fuse-brep";
pub const BREP_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BrepDocument {
    format: String,
    version: u32,
    solid: CompressedSolid<Point3, Curve, Surface>,
}

/// Serialize a solid. Equal topology always produces identical bytes.
pub fn brep_string(solid: &Solid) -> Result<String, serde_json::Error> {
    let document = BrepDocument {
        format: BREP_FORMAT.to_string(),
        version: BREP_VERSION,
        solid: solid.compress(),
    };
    serde_json::to_string_pretty(&document)
}

pub fn write_brep(solid: &Solid, path: &Path) -> Result<(), KernelError> {
    let text = brep_string(solid).map_err(|e| KernelError::write(path, e))?;
    std::fs::write(path, text).map_err(|e| KernelError::write(path, e))
}

/// Read a file written by [`write_brep`].
pub fn read_brep(path: &Path) -> Result<Solid, KernelError> {
    let text = std::fs::read_to_string(path).map_err(|e| KernelError::read(path, e))?;
    let document: BrepDocument =
        serde_json::from_str(&text).map_err(|e| KernelError::read(path, e))?;
    if document.format != BREP_FORMAT {
        return Err(KernelError::read(
            path,
            format!("unexpected format {:?}", document.format),
        ));
    }
    if document.version != BREP_VERSION {
        return Err(KernelError::read(
            path,
            format!("unsupported version {}", document.version),
        ));
    }
    solid_from_shells(document.solid.boundaries).map_err(|e| KernelError::read(path, e))
}

/// Rebuild a solid from compressed shells.
///
/// Closed, manifold shells form a checked solid. Anything else (open
/// surfaces, compounds) is kept as an unchecked collection of shells.
pub(crate) fn solid_from_shells(shells: Vec<CompressedBoundary>) -> Result<Solid, String> {
    let shells = shells
        .into_iter()
        .map(Shell::extract)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid shell topology: {e}"))?;
    match Solid::try_new(shells.clone()) {
        Ok(solid) => Ok(solid),
        Err(_) => Ok(Solid::new_unchecked(shells)),
    }
}
