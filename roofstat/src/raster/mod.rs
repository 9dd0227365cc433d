//! Rasters mono-bande et contrat d'échantillonnage zonal
//!
//! Le pipeline ne lit jamais les pixels lui-même : il appelle un
//! [`ZonalSampler`] une fois par couple (raster, statistique). [`GridRaster`]
//! en est l'implémentation de référence, en mémoire.

pub mod ascii;
mod zonal;

use geo::{Coord, MultiPolygon, Rect};

use crate::types::Statistic;
use crate::{Result, ScreeningError};

/// Échantillonneur zonal (collaborateur externe du pipeline)
pub trait ZonalSampler {
    /// CRS natif du raster; les polygones doivent y être fournis
    fn epsg(&self) -> u32;

    /// Une valeur par polygone, dans l'ordre d'entrée.
    ///
    /// `None` quand aucune cellule valide (hors nodata) n'est couverte.
    fn sample(
        &self,
        polygons: &[MultiPolygon],
        statistic: Statistic,
        all_touched: bool,
    ) -> Result<Vec<Option<f64>>>;
}

/// Transformation affine d'un raster nord en haut (convention GDAL)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X du coin supérieur gauche
    pub origin_x: f64,
    /// Y du coin supérieur gauche
    pub origin_y: f64,
    /// Largeur d'un pixel (positive)
    pub pixel_width: f64,
    /// Hauteur d'un pixel (négative pour un raster nord en haut)
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Emprise d'une cellule
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        let x0 = self.origin_x + col as f64 * self.pixel_width;
        let y0 = self.origin_y + row as f64 * self.pixel_height;
        Rect::new(
            Coord { x: x0, y: y0 },
            Coord {
                x: x0 + self.pixel_width,
                y: y0 + self.pixel_height,
            },
        )
    }

    /// Centre d'une cellule
    pub fn cell_center(&self, col: usize, row: usize) -> Coord {
        Coord {
            x: self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            y: self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        }
    }

    /// Colonnes et lignes recouvrant une emprise, bornées à la grille.
    ///
    /// Les bornes sont inclusives au bord: une emprise qui s'arrête pile sur
    /// une limite de cellule inclut la cellule voisine (utile à all_touched).
    pub(crate) fn window(
        &self,
        bounds: Rect,
        width: usize,
        height: usize,
    ) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let c1 = (bounds.min().x - self.origin_x) / self.pixel_width;
        let c2 = (bounds.max().x - self.origin_x) / self.pixel_width;
        let r1 = (bounds.min().y - self.origin_y) / self.pixel_height;
        let r2 = (bounds.max().y - self.origin_y) / self.pixel_height;

        let cols = clamp_range(c1.min(c2), c1.max(c2), width)?;
        let rows = clamp_range(r1.min(r2), r1.max(r2), height)?;
        Some((cols, rows))
    }
}

fn clamp_range(lo: f64, hi: f64, len: usize) -> Option<std::ops::Range<usize>> {
    if !lo.is_finite() || !hi.is_finite() || hi < 0.0 || lo >= len as f64 {
        return None;
    }
    let start = lo.floor().max(0.0) as usize;
    let end = ((hi.floor() + 1.0).max(0.0) as usize).min(len);
    (start < end).then_some(start..end)
}

/// Raster mono-bande en mémoire
#[derive(Debug, Clone)]
pub struct GridRaster {
    name: String,
    epsg: u32,
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: Option<f64>,
    /// Valeurs ligne par ligne, du haut vers le bas
    values: Vec<f64>,
}

impl GridRaster {
    /// Construit un raster en vérifiant la cohérence des dimensions
    pub fn new(
        name: impl Into<String>,
        epsg: u32,
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(ScreeningError::raster_format(name, "empty grid"));
        }
        if values.len() != width * height {
            return Err(ScreeningError::raster_format(
                name,
                format!(
                    "expected {} values for {}x{} grid, got {}",
                    width * height,
                    width,
                    height,
                    values.len()
                ),
            ));
        }
        if transform.pixel_width <= 0.0 || transform.pixel_height == 0.0 {
            return Err(ScreeningError::raster_format(name, "invalid pixel size"));
        }

        Ok(Self {
            name,
            epsg,
            width,
            height,
            transform,
            nodata,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Valeur brute d'une cellule
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        (col < self.width && row < self.height).then(|| self.values[row * self.width + col])
    }

    /// Valeur d'une cellule si elle n'est pas nodata
    pub fn valid(&self, col: usize, row: usize) -> Option<f64> {
        self.get(col, row).filter(|&v| self.is_valid(v))
    }

    fn is_valid(&self, v: f64) -> bool {
        !v.is_nan() && self.nodata != Some(v)
    }

    /// Emprise totale de la grille
    pub fn bounds(&self) -> Rect {
        let a = self.transform.cell_rect(0, 0);
        let b = self.transform.cell_rect(self.width - 1, self.height - 1);
        Rect::new(
            Coord {
                x: a.min().x.min(b.min().x),
                y: a.min().y.min(b.min().y),
            },
            Coord {
                x: a.max().x.max(b.max().x),
                y: a.max().y.max(b.max().y),
            },
        )
    }

    /// Statistiques globales des cellules valides
    pub fn summary(&self) -> RasterSummary {
        let mut summary = RasterSummary {
            cells: self.values.len(),
            ..Default::default()
        };
        let mut sum = 0.0;
        for &v in self.values.iter().filter(|&&v| self.is_valid(v)) {
            summary.valid_count += 1;
            sum += v;
            summary.min = Some(summary.min.map_or(v, |m: f64| m.min(v)));
            summary.max = Some(summary.max.map_or(v, |m: f64| m.max(v)));
        }
        if summary.valid_count > 0 {
            summary.mean = Some(sum / summary.valid_count as f64);
        }
        summary
    }
}

/// Statistiques globales d'un raster
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RasterSummary {
    pub cells: usize,
    pub valid_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}
