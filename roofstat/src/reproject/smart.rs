//! Choix du reprojecteur pour un couple d'EPSG
//!
//! Identité si les CRS sont égaux, sinon la reprojection légère quand elle
//! connaît les deux CRS, sinon PROJ (feature `proj`).

use super::ReprojectorLite;
use crate::Result;
use geo::MapCoords;

/// Reprojecteur retenu pour un couple (source, cible)
pub enum SmartReprojector {
    /// Reprojection légère (pure Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ
    #[cfg(feature = "proj")]
    Proj(super::proj::Reprojector),
    /// Pas de reprojection (source == cible)
    Identity,
}

impl SmartReprojector {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self> {
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            let lite = ReprojectorLite::new(source_epsg, target_epsg)?;
            return Ok(Self::Lite(lite));
        }

        #[cfg(feature = "proj")]
        {
            let proj = super::proj::Reprojector::new(source_epsg, target_epsg)?;
            Ok(Self::Proj(proj))
        }

        #[cfg(not(feature = "proj"))]
        Err(crate::ScreeningError::reprojection(
            source_epsg,
            target_epsg,
            "not supported by the built-in reprojector \
             (supported: 4326, 4269, 3857, 326zz, 327zz, 269zz, 5070); \
             build with --features proj for other CRS",
        ))
    }

    /// Transforme une géométrie
    pub fn transform_geometry<G>(&self, geom: &G) -> Result<G>
    where
        G: MapCoords<f64, f64, Output = G> + Clone,
    {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "proj")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Transforme une série de géométries, dans l'ordre
    pub fn transform_all<'a, G, I>(&self, geoms: I) -> Result<Vec<G>>
    where
        G: MapCoords<f64, f64, Output = G> + Clone + 'a,
        I: IntoIterator<Item = &'a G>,
    {
        geoms
            .into_iter()
            .map(|g| self.transform_geometry(g))
            .collect()
    }

    /// Retourne une description du reprojector utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (no reprojection)",
            Self::Lite(_) => "built-in (pure Rust)",
            #[cfg(feature = "proj")]
            Self::Proj(_) => "proj (PROJ library)",
        }
    }
}
