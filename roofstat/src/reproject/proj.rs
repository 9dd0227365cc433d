//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec la feature `proj`.

use geo::{Coord, MapCoords};
use proj::Proj;

use crate::{Result, ScreeningError};

/// Reprojection via la bibliothèque PROJ
pub struct Reprojector {
    proj: Proj,
    source_epsg: u32,
    target_epsg: u32,
}

impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None)
            .map_err(|e| ScreeningError::reprojection(source_epsg, target_epsg, e.to_string()))?;

        Ok(Self {
            proj,
            source_epsg,
            target_epsg,
        })
    }

    /// Transforme une géométrie
    pub fn transform_geometry<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geom.try_map_coords(|c| -> Result<Coord> {
            let (x, y) = self.proj.convert((c.x, c.y)).map_err(|e| {
                ScreeningError::reprojection(self.source_epsg, self.target_epsg, e.to_string())
            })?;
            Ok(Coord { x, y })
        })
    }
}
