//! Rapport de run
//!
//! Collecte les entrées (avec checksum), les comptages par niveau et par
//! drapeau QA, les seuils figés et la couverture des rasters.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use roofstat::{BatchThresholds, LayerCoverage, QaFlag, Screening, Tier};

use crate::export::{ExportSummary, ExportVariant};

/// Statut global du run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Tous les bâtiments ont été échantillonnés et exportés
    Success,
    /// Export réalisé, mais des bâtiments sont sans échantillon
    PartialSuccess,
    /// Run interrompu
    Failed,
}

/// Fichier d'entrée
#[derive(Debug, Clone, Serialize)]
pub struct InputFile {
    /// Rôle (buildings, impervious, land_cover, canopy)
    pub role: String,
    pub path: String,
    /// blake3 hexadécimal
    pub checksum: String,
    pub epsg: Option<u32>,
}

/// Rapport complet d'un run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub duration_secs: f64,
    pub status: RunStatus,

    pub working_epsg: u32,
    pub output_epsg: u32,
    pub variant: ExportVariant,

    pub inputs: Vec<InputFile>,
    pub output: Option<String>,

    // Compteurs globaux
    /// Bâtiments lus
    pub buildings: usize,
    /// Bâtiments sans échantillon d'imperméabilisation
    pub unsampled: usize,
    /// Features écrites
    pub exported: usize,
    /// Bâtiments écartés par la variante minimale
    pub dropped: usize,

    pub by_tier: BTreeMap<String, usize>,
    pub by_qa_flag: BTreeMap<String, usize>,

    pub thresholds: Option<BatchThresholds>,
    pub coverage: Vec<LayerCoverage>,

    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl RunReport {
    /// Crée un rapport vide pour un run
    pub fn new(working_epsg: u32, output_epsg: u32, variant: ExportVariant) -> Self {
        Self {
            duration_secs: 0.0,
            status: RunStatus::Success,
            working_epsg,
            output_epsg,
            variant,
            inputs: Vec::new(),
            output: None,
            buildings: 0,
            unsampled: 0,
            exported: 0,
            dropped: 0,
            by_tier: BTreeMap::new(),
            by_qa_flag: BTreeMap::new(),
            thresholds: None,
            coverage: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Enregistre un fichier d'entrée
    pub fn record_input(&mut self, role: &str, path: &Path, checksum: String, epsg: Option<u32>) {
        self.inputs.push(InputFile {
            role: role.to_string(),
            path: path.display().to_string(),
            checksum,
            epsg,
        });
    }

    /// Enregistre les résultats du screening
    pub fn record_screening(&mut self, screening: &Screening) {
        self.buildings = screening.records.len();
        self.unsampled = screening.unsampled();
        self.thresholds = Some(screening.thresholds);
        self.coverage = screening.coverage.clone();

        // Toutes les valeurs apparaissent, même à zéro
        self.by_tier = [Tier::High, Tier::Medium, Tier::Low]
            .into_iter()
            .map(|t| (t.to_string(), 0))
            .collect();
        self.by_qa_flag = QaFlag::ALL.into_iter().map(|f| (f.to_string(), 0)).collect();
        for record in &screening.records {
            if let Some(tier) = record.tier {
                *self.by_tier.entry(tier.to_string()).or_default() += 1;
            }
            if let Some(flag) = record.qa_flag {
                *self.by_qa_flag.entry(flag.to_string()).or_default() += 1;
            }
        }

        if self.unsampled > 0 {
            self.record_warning(format!(
                "{} of {} buildings have no impervious sample",
                self.unsampled, self.buildings
            ));
        }
        for c in &screening.coverage {
            if c.available && c.sampled == 0 {
                self.record_warning(format!(
                    "Layer {} (EPSG:{}) covers no building; check its extent and CRS",
                    c.layer.as_str(),
                    c.raster_epsg.unwrap_or_default()
                ));
            }
        }
    }

    /// Enregistre le bilan de l'export
    pub fn record_export(&mut self, output: &Path, summary: &ExportSummary) {
        self.output = Some(output.display().to_string());
        self.exported = summary.written;
        self.dropped = summary.dropped;
    }

    pub fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Enregistre l'erreur qui a interrompu le run
    pub fn record_failure(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Définit la durée du run
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if !self.errors.is_empty() || self.output.is_none() {
            RunStatus::Failed
        } else if self.unsampled > 0 {
            RunStatus::PartialSuccess
        } else {
            RunStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("GREEN-ROOF SCREENING REPORT");
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "CRS: working EPSG:{}, output EPSG:{} ({} variant)",
            self.working_epsg, self.output_epsg, self.variant
        );

        if !self.inputs.is_empty() {
            println!("\n--- INPUTS ---");
            for input in &self.inputs {
                let epsg = input.epsg.map(|e| format!(" EPSG:{}", e)).unwrap_or_default();
                println!(
                    "  {}: {}{} [{}]",
                    input.role,
                    input.path,
                    epsg,
                    &input.checksum[..input.checksum.len().min(12)]
                );
            }
        }

        println!("\n--- SUMMARY ---");
        println!(
            "Buildings: {} screened, {} unsampled, {} exported, {} dropped",
            self.buildings, self.unsampled, self.exported, self.dropped
        );
        if let Some(output) = &self.output {
            println!("Output: {}", output);
        }

        if !self.by_tier.is_empty() {
            println!("\n--- BY TIER ---");
            for tier in [Tier::High, Tier::Medium, Tier::Low] {
                let count = self.by_tier.get(tier.as_str()).copied().unwrap_or(0);
                println!("  {}: {}", tier, count);
            }
        }

        if !self.by_qa_flag.is_empty() {
            println!("\n--- BY QA FLAG ---");
            for (flag, count) in &self.by_qa_flag {
                println!("  {}: {}", flag, count);
            }
        }

        if let Some(t) = &self.thresholds {
            println!("\n--- THRESHOLDS ---");
            println!("  area P95: {:.1} m2", t.area_p95);
            println!("  area P85: {}", fmt_opt(t.area_p85));
            println!("  impervious P85: {}", fmt_opt(t.imp_p85));
            println!(
                "  score P50/P85: {} / {}",
                fmt_opt(t.score_q50),
                fmt_opt(t.score_q85)
            );
        }

        if !self.coverage.is_empty() {
            println!("\n--- COVERAGE ---");
            for c in &self.coverage {
                if c.available {
                    println!("  {}: {}/{} buildings", c.layer.as_str(), c.sampled, c.total);
                } else {
                    println!("  {}: not provided", c.layer.as_str());
                }
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  {}", w);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        if !self.errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", self.errors.len());
            for e in &self.errors {
                println!("  {}", e);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        let count = |tier: Tier| self.by_tier.get(tier.as_str()).copied().unwrap_or(0);
        format!(
            "{} buildings: {} High, {} Medium, {} Low, {} unsampled",
            self.buildings,
            count(Tier::High),
            count(Tier::Medium),
            count(Tier::Low),
            self.unsampled
        )
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}", v))
}
