//! Lecteur de grilles ESRI ASCII (`.asc`)
//!
//! Le format ne porte pas de CRS: l'EPSG est fourni par l'appelant.

use std::path::Path;

use super::{GeoTransform, GridRaster};
use crate::{Result, ScreeningError};

#[derive(Debug, Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<f64>,
    yll: Option<f64>,
    /// xllcenter/yllcenter au lieu de xllcorner/yllcorner
    center: bool,
    cellsize: Option<f64>,
    nodata: Option<f64>,
}

fn parse_number(name: &str, key: &str, raw: &str) -> Result<f64> {
    fast_float::parse(raw).map_err(|_| {
        ScreeningError::raster_format(name, format!("invalid value for {}: '{}'", key, raw))
    })
}

fn parse_count(name: &str, key: &str, raw: &str) -> Result<usize> {
    raw.parse().map_err(|_| {
        ScreeningError::raster_format(name, format!("invalid value for {}: '{}'", key, raw))
    })
}

/// Parse le contenu d'une grille ASCII
pub fn parse(name: &str, content: &str, epsg: u32) -> Result<GridRaster> {
    let mut header = Header::default();
    let mut rest = content;

    // En-tête: lignes "clé valeur" tant que la clé est alphabétique
    loop {
        let line_end = rest.find('\n').unwrap_or(rest.len());
        let line = rest[..line_end].trim();
        let mut tokens = line.split_ascii_whitespace();
        let Some(key) = tokens.next() else {
            if line_end == rest.len() {
                break;
            }
            rest = &rest[line_end + 1..];
            continue;
        };
        if !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
            break;
        }
        let value = tokens
            .next()
            .ok_or_else(|| ScreeningError::raster_format(name, format!("missing value for {}", key)))?;

        match key.to_ascii_lowercase().as_str() {
            "ncols" => header.ncols = Some(parse_count(name, key, value)?),
            "nrows" => header.nrows = Some(parse_count(name, key, value)?),
            "xllcorner" => header.xll = Some(parse_number(name, key, value)?),
            "yllcorner" => header.yll = Some(parse_number(name, key, value)?),
            "xllcenter" => {
                header.xll = Some(parse_number(name, key, value)?);
                header.center = true;
            }
            "yllcenter" => {
                header.yll = Some(parse_number(name, key, value)?);
                header.center = true;
            }
            "cellsize" => header.cellsize = Some(parse_number(name, key, value)?),
            "nodata_value" => header.nodata = Some(parse_number(name, key, value)?),
            other => {
                return Err(ScreeningError::raster_format(
                    name,
                    format!("unknown header key '{}'", other),
                ))
            }
        }

        if line_end == rest.len() {
            rest = "";
            break;
        }
        rest = &rest[line_end + 1..];
    }

    let missing = |key: &str| ScreeningError::raster_format(name, format!("missing header {}", key));
    let ncols = header.ncols.ok_or_else(|| missing("ncols"))?;
    let nrows = header.nrows.ok_or_else(|| missing("nrows"))?;
    let xll = header.xll.ok_or_else(|| missing("xllcorner"))?;
    let yll = header.yll.ok_or_else(|| missing("yllcorner"))?;
    let cellsize = header.cellsize.ok_or_else(|| missing("cellsize"))?;

    let (left, bottom) = if header.center {
        (xll - cellsize / 2.0, yll - cellsize / 2.0)
    } else {
        (xll, yll)
    };
    let top = bottom + nrows as f64 * cellsize;

    let values = rest
        .split_ascii_whitespace()
        .map(|raw| parse_number(name, "cell", raw))
        .collect::<Result<Vec<f64>>>()?;

    GridRaster::new(
        name,
        epsg,
        ncols,
        nrows,
        GeoTransform::new(left, top, cellsize, -cellsize),
        header.nodata,
        values,
    )
}

/// Lit une grille ASCII depuis un fichier
pub fn read(path: &Path, epsg: u32) -> Result<GridRaster> {
    let content = std::fs::read_to_string(path)?;
    parse(&path.display().to_string(), &content, epsg)
}
