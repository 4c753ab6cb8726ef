//! Types d'erreurs pour le crate kmz

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture d'un KMZ
#[derive(Debug, Error)]
pub enum KmzError {
    /// Erreur d'I/O lors de la lecture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Conteneur zip illisible
    #[error("Invalid zip container: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Aucun document KML dans l'archive
    #[error("Invalid archive format: {0}")]
    ArchiveFormat(String),

    /// Document KML mal formé
    #[error("Markup parse error: {0}")]
    MarkupParse(String),
}

impl KmzError {
    /// Crée une erreur de parsing du balisage
    pub fn markup(reason: impl Into<String>) -> Self {
        Self::MarkupParse(reason.into())
    }

    /// Vrai pour les erreurs liées au conteneur (zip absent, corrompu ou sans KML)
    pub fn is_archive_error(&self) -> bool {
        matches!(self, Self::Zip(_) | Self::ArchiveFormat(_))
    }
}
