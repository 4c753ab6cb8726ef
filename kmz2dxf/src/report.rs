//! Rapport de conversion
//!
//! Compteurs par catégorie, séries d'étiquettes, avertissements de repli
//! et empreinte blake3 du DXF produit.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::classify::Category;
use crate::label::LabelCluster;

/// Statut global de la conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionStatus {
    /// Conversion complète
    Success,
    /// Conversion complète, avec des symboles remplacés par des marqueurs
    SuccessWithWarnings,
}

/// Avertissement non bloquant (repli d'insertion de symbole)
#[derive(Debug, Clone, Serialize)]
pub struct SymbolInsertionWarning {
    /// Nom du placemark
    pub item: String,
    /// Clé de catégorie
    pub category: String,
    pub message: String,
}

/// Rapport complet d'une conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Fichier source
    pub source: String,
    /// Code EPSG du repère de dessin
    pub epsg: u32,
    /// Durée de la conversion
    pub duration_secs: f64,
    pub status: ConversionStatus,

    /// Nombre de placemarks convertis
    pub items: usize,
    /// Clé de catégorie → nombre de placemarks
    pub by_category: BTreeMap<String, usize>,

    /// Nombre de séries d'étiquettes homepass
    pub clusters: usize,
    /// Détail des séries
    pub label_clusters: Vec<LabelCluster>,

    pub warnings: Vec<SymbolInsertionWarning>,

    /// Empreinte blake3 (hex) du DXF écrit
    pub output_checksum: Option<String>,
}

impl ConversionReport {
    pub fn new(source: &str, epsg: u32) -> Self {
        Self {
            source: source.to_string(),
            epsg,
            duration_secs: 0.0,
            status: ConversionStatus::Success,
            items: 0,
            by_category: BTreeMap::new(),
            clusters: 0,
            label_clusters: Vec::new(),
            warnings: Vec::new(),
            output_checksum: None,
        }
    }

    /// Enregistre un placemark classé
    pub fn record_item(&mut self, category: Category) {
        self.items += 1;
        *self
            .by_category
            .entry(category.key().to_string())
            .or_default() += 1;
    }

    pub fn record_warning(&mut self, item: &str, category: Category, message: impl Into<String>) {
        self.warnings.push(SymbolInsertionWarning {
            item: item.to_string(),
            category: category.key().to_string(),
            message: message.into(),
        });
    }

    pub fn record_clusters(&mut self, clusters: &[LabelCluster]) {
        self.clusters = clusters.len();
        self.label_clusters = clusters.to_vec();
    }

    /// Calcule l'empreinte du document sérialisé
    pub fn set_checksum(&mut self, content: &[u8]) {
        self.output_checksum = Some(blake3::hash(content).to_hex().to_string());
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.warnings.is_empty() {
            ConversionStatus::Success
        } else {
            ConversionStatus::SuccessWithWarnings
        };
    }

    /// Nombre de placemarks d'une catégorie
    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(category.key()).copied().unwrap_or(0)
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("CONVERSION REPORT - {}", self.source);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!("Projection: EPSG:{}", self.epsg);

        println!("\n--- SUMMARY ---");
        println!("Items: {}", self.items);
        println!("Label clusters: {}", self.clusters);
        if let Some(ref checksum) = self.output_checksum {
            println!("Checksum (blake3): {}", checksum);
        }

        if !self.by_category.is_empty() {
            println!("\n--- BY CATEGORY ---");
            for (key, count) in &self.by_category {
                println!("  {}: {}", key, count);
            }
        }

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  [{}] {}: {}", w.category, w.item, w.message);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
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
        format!(
            "{}: {} items, {} clusters, {} warnings",
            self.source,
            self.items,
            self.clusters,
            self.warnings.len()
        )
    }
}
