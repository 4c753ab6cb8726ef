//! Erreurs de conversion KMZ → DXF

use thiserror::Error;

/// Erreurs structurelles : elles interrompent la conversion
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Lecture du KMZ impossible (conteneur, KML)
    #[error(transparent)]
    Kmz(#[from] kmz::KmzError),

    /// Aucune géométrie exploitable après extraction
    #[error("Empty dataset: no usable geometry in the survey")]
    EmptyDataset,

    /// Code EPSG hors des zones UTM WGS84
    #[error("Unsupported projection EPSG:{0} (expected 32601-32660 or 32701-32760)")]
    UnsupportedProjection(u32),

    /// Gabarit DXF illisible
    #[error("Invalid DXF template: {reason}")]
    Template { reason: String },

    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn template(reason: impl Into<String>) -> Self {
        Self::Template {
            reason: reason.into(),
        }
    }
}
