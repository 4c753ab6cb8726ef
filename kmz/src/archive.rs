//! Lecture des conteneurs KMZ (zip contenant un document KML)

use std::io::{Cursor, Read};
use std::path::Path;

use tracing::debug;

use crate::KmzError;

/// Document KML extrait d'un conteneur
#[derive(Debug)]
pub struct MarkupEntry {
    /// Nom de l'entrée dans l'archive (ou nom du fichier .kml)
    pub name: String,

    /// Contenu brut du document
    pub bytes: Vec<u8>,
}

/// Extrait le premier document `.kml` d'un KMZ en mémoire
///
/// Les entrées sont parcourues dans l'ordre de l'archive ; la comparaison de
/// l'extension ignore la casse.
///
/// # Errors
///
/// `KmzError::Zip` si le conteneur est illisible, `KmzError::ArchiveFormat`
/// si aucune entrée ne se termine par `.kml`.
pub fn extract_kml(data: &[u8]) -> Result<MarkupEntry, KmzError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() || !is_markup_name(entry.name()) {
            continue;
        }

        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(initial_capacity(entry.size(), data.len()));
        entry.read_to_end(&mut bytes)?;

        debug!(entry = %name, size = bytes.len(), "KML entry found");
        return Ok(MarkupEntry { name, bytes });
    }

    Err(KmzError::ArchiveFormat(format!(
        "no .kml document among {} archive entries",
        archive.len()
    )))
}

/// Lit un fichier `.kmz`, ou un `.kml` nu (détecté par l'extension)
pub fn read_path(path: &Path) -> Result<MarkupEntry, KmzError> {
    let data = std::fs::read(path)?;

    if path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("kml"))
    {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(MarkupEntry { name, bytes: data });
    }

    extract_kml(&data)
}

/// Taille déclarée par l'en-tête zip, bornée par la taille de l'archive :
/// l'en-tête n'est pas vérifié avant lecture
fn initial_capacity(declared: u64, archive_len: usize) -> usize {
    usize::try_from(declared).map_or(archive_len, |size| size.min(archive_len))
}

fn is_markup_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".kml")
}
