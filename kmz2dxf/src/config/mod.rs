//! Configuration de la conversion

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::classify::Category;
use crate::label::LabelParams;
use crate::project::{UtmZone, DEFAULT_EPSG};

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Code EPSG UTM WGS84 du repère de dessin
    pub epsg: u32,

    /// Écart maximal d'abscisse dans une série d'étiquettes
    pub max_gap: f64,

    /// Longueur minimale d'un segment de câble pour l'orientation
    pub min_segment_length: f64,

    /// Hauteur de texte des étiquettes
    pub text_height: f64,

    /// Hauteur de texte des étiquettes homepass
    pub homepass_text_height: f64,

    /// Largeur moyenne d'un glyphe, en fraction de la hauteur
    pub glyph_width_factor: f64,

    /// Rayon du cercle de repli pour les points sans symbole
    pub point_marker_radius: f64,

    /// Rayon du repère d'un chemin réduit à un seul sommet
    pub degenerate_marker_radius: f64,

    /// Clé de catégorie → nom de calque
    pub layers: BTreeMap<String, String>,

    /// Clé de catégorie → échelle du symbole
    pub symbol_scales: BTreeMap<String, f64>,

    /// Clé de catégorie → couleur ACI
    pub colors: BTreeMap<String, u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsg: DEFAULT_EPSG,
            max_gap: 20.0,
            min_segment_length: 15.0,
            text_height: 2.0,
            homepass_text_height: 1.5,
            glyph_width_factor: 0.6,
            point_marker_radius: 1.0,
            degenerate_marker_radius: 0.5,
            layers: BTreeMap::new(),
            symbol_scales: BTreeMap::new(),
            colors: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "compact" => Self::load_embedded(include_str!("presets/compact.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, compact", preset),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        let path = Path::new(name_or_path);
        if name_or_path.ends_with(".json") || path.is_file() {
            Self::load(path)
        } else {
            Self::from_preset(name_or_path)
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Surcharges depuis l'environnement (`KMZ2DXF_EPSG`, `KMZ2DXF_MAX_GAP`, `KMZ2DXF_MIN_SEGMENT`)
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("KMZ2DXF_EPSG") {
            self.epsg = v.trim().parse().context("Invalid KMZ2DXF_EPSG")?;
        }
        if let Ok(v) = std::env::var("KMZ2DXF_MAX_GAP") {
            self.max_gap = v.trim().parse().context("Invalid KMZ2DXF_MAX_GAP")?;
        }
        if let Ok(v) = std::env::var("KMZ2DXF_MIN_SEGMENT") {
            self.min_segment_length = v.trim().parse().context("Invalid KMZ2DXF_MIN_SEGMENT")?;
        }
        Ok(())
    }

    /// Vérifie la cohérence des valeurs
    pub fn validate(&self) -> Result<()> {
        if UtmZone::from_epsg(self.epsg).is_none() {
            anyhow::bail!(
                "EPSG:{} non supporté. Zones UTM WGS84 uniquement (32601-32660, 32701-32760)",
                self.epsg
            );
        }
        let positive = [
            ("max_gap", self.max_gap),
            ("text_height", self.text_height),
            ("homepass_text_height", self.homepass_text_height),
            ("glyph_width_factor", self.glyph_width_factor),
            ("point_marker_radius", self.point_marker_radius),
            ("degenerate_marker_radius", self.degenerate_marker_radius),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                anyhow::bail!("{} must be > 0 (got {})", name, value);
            }
        }
        if !(self.min_segment_length.is_finite() && self.min_segment_length >= 0.0) {
            anyhow::bail!(
                "min_segment_length must be >= 0 (got {})",
                self.min_segment_length
            );
        }
        Ok(())
    }

    /// Calque d'une catégorie (la clé elle-même si non configuré)
    pub fn layer_for(&self, category: Category) -> &str {
        self.layers
            .get(category.key())
            .map(String::as_str)
            .unwrap_or(category.key())
    }

    pub fn symbol_scale(&self, category: Category) -> f64 {
        self.symbol_scales
            .get(category.key())
            .copied()
            .unwrap_or(1.0)
    }

    /// Couleur ACI (7 = blanc/noir par défaut)
    pub fn color(&self, category: Category) -> u8 {
        self.colors.get(category.key()).copied().unwrap_or(7)
    }

    pub fn label_params(&self) -> LabelParams {
        LabelParams {
            max_gap: self.max_gap,
            min_segment_length: self.min_segment_length,
        }
    }
}
