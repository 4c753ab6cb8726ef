//! Classification des placemarks par nom de dossier
//!
//! Table de règles ordonnée (prédicat, catégorie). Les marqueurs d'exclusion
//! et d'état (FAT AREA, EXISTING/EMR, UNCOVER) sont cherchés dans tout le
//! chemin ; les dossiers sont ensuite examinés du plus profond vers la racine
//! et, pour chaque nom, la première règle satisfaite l'emporte.

use serde::Serialize;

/// Catégories de composants réseau
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Fdt,
    Fat,
    HomepassCovered,
    HomepassUncovered,
    NewPole74,
    NewPole73,
    NewPole94,
    NewPole,
    ExistingPoleEmr74,
    ExistingPoleEmr73,
    ExistingPole,
    DistributionCable,
    SlingWire,
    Boundary,
    Road,
    JointClosure,
    Slack,
    /// Dossier non reconnu : conservé comme poteau générique
    GenericPole,
}

impl Category {
    pub const ALL: [Category; 18] = [
        Category::Fdt,
        Category::Fat,
        Category::HomepassCovered,
        Category::HomepassUncovered,
        Category::NewPole74,
        Category::NewPole73,
        Category::NewPole94,
        Category::NewPole,
        Category::ExistingPoleEmr74,
        Category::ExistingPoleEmr73,
        Category::ExistingPole,
        Category::DistributionCable,
        Category::SlingWire,
        Category::Boundary,
        Category::Road,
        Category::JointClosure,
        Category::Slack,
        Category::GenericPole,
    ];

    /// Clé stable (configuration, rapport, calque par défaut)
    pub fn key(self) -> &'static str {
        match self {
            Category::Fdt => "FDT",
            Category::Fat => "FAT",
            Category::HomepassCovered => "HP_COVER",
            Category::HomepassUncovered => "HP_UNCOVER",
            Category::NewPole74 => "NEW_POLE_7_4",
            Category::NewPole73 => "NEW_POLE_7_3",
            Category::NewPole94 => "NEW_POLE_9_4",
            Category::NewPole => "NEW_POLE",
            Category::ExistingPoleEmr74 => "EXISTING_POLE_EMR_7_4",
            Category::ExistingPoleEmr73 => "EXISTING_POLE_EMR_7_3",
            Category::ExistingPole => "EXISTING_POLE",
            Category::DistributionCable => "DISTRIBUTION_CABLE",
            Category::SlingWire => "SLING_WIRE",
            Category::Boundary => "BOUNDARY",
            Category::Road => "ROAD",
            Category::JointClosure => "JOINT_CLOSURE",
            Category::Slack => "SLACK",
            Category::GenericPole => "POLE",
        }
    }

    pub fn is_homepass(self) -> bool {
        matches!(self, Category::HomepassCovered | Category::HomepassUncovered)
    }

    pub fn is_pole(self) -> bool {
        matches!(
            self,
            Category::NewPole74
                | Category::NewPole73
                | Category::NewPole94
                | Category::NewPole
                | Category::ExistingPoleEmr74
                | Category::ExistingPoleEmr73
                | Category::ExistingPole
                | Category::GenericPole
        )
    }
}

/// Indicateurs calculés sur l'ensemble du chemin de dossiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathFlags {
    /// `FAT AREA` présent dans un dossier du chemin
    pub fat_area: bool,
    /// `EXISTING` ou `EMR` présent dans un dossier du chemin
    pub existing: bool,
    /// `UNCOVER` présent dans un dossier du chemin
    pub uncover: bool,
    /// `POLE` présent dans un dossier du chemin
    pub pole: bool,
}

impl PathFlags {
    /// `folders` déjà en majuscules
    pub fn scan<S: AsRef<str>>(folders: &[S]) -> Self {
        let mut flags = PathFlags::default();
        for folder in folders {
            let f: &str = folder.as_ref();
            flags.fat_area |= is_fat_area(f);
            flags.existing |= is_existing(f);
            flags.uncover |= f.contains("UNCOVER");
            flags.pole |= f.contains("POLE");
        }
        flags
    }
}

/// Règle de classification : nom de dossier en majuscules et indicateurs du chemin
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str, &PathFlags) -> bool,
    pub category: Category,
}

fn is_existing(folder: &str) -> bool {
    folder.contains("EXISTING") || folder.contains("EMR")
}

fn is_fat_area(folder: &str) -> bool {
    folder.contains("FAT AREA")
}

fn is_homepass(folder: &str) -> bool {
    folder.contains("HP") || folder.contains("HOMEPASS") || folder.contains("COVER")
}

/// Poteau existant : marqueur dans le dossier, ou dossier de poteau/gabarit sous un parent existant
fn is_existing_pole(f: &str, path: &PathFlags) -> bool {
    is_existing(f) || (path.existing && is_pole_folder(f))
}

/// Poteau neuf : aucun marqueur existant dans tout le chemin
fn is_new_pole(f: &str, path: &PathFlags) -> bool {
    !path.existing && (f.contains("POLE") || (path.pole && has_pole_size(f)))
}

fn is_pole_folder(f: &str) -> bool {
    f.contains("POLE") || f.contains("TIANG") || has_pole_size(f)
}

fn has_pole_size(f: &str) -> bool {
    f.contains("7-4") || f.contains("7-3") || f.contains("9-4")
}

/// Règles dans l'ordre de priorité
pub const RULES: &[Rule] = &[
    Rule {
        name: "homepass uncovered",
        matches: |f, path| f.contains("UNCOVER") || (path.uncover && is_homepass(f)),
        category: Category::HomepassUncovered,
    },
    Rule {
        name: "homepass covered",
        matches: |f, path| !path.uncover && is_homepass(f),
        category: Category::HomepassCovered,
    },
    Rule {
        name: "existing pole EMR 7-4",
        matches: |f, path| is_existing_pole(f, path) && f.contains("7-4"),
        category: Category::ExistingPoleEmr74,
    },
    Rule {
        name: "existing pole EMR 7-3",
        matches: |f, path| is_existing_pole(f, path) && f.contains("7-3"),
        category: Category::ExistingPoleEmr73,
    },
    Rule {
        name: "existing pole",
        matches: is_existing_pole,
        category: Category::ExistingPole,
    },
    Rule {
        name: "new pole 7-4",
        matches: |f, path| is_new_pole(f, path) && f.contains("7-4"),
        category: Category::NewPole74,
    },
    Rule {
        name: "new pole 7-3",
        matches: |f, path| is_new_pole(f, path) && f.contains("7-3"),
        category: Category::NewPole73,
    },
    Rule {
        name: "new pole 9-4",
        matches: |f, path| is_new_pole(f, path) && f.contains("9-4"),
        category: Category::NewPole94,
    },
    Rule {
        name: "new pole",
        matches: is_new_pole,
        category: Category::NewPole,
    },
    Rule {
        name: "boundary",
        matches: |f, _| is_fat_area(f) || f.contains("BOUNDARY"),
        category: Category::Boundary,
    },
    Rule {
        name: "FDT",
        matches: |f, _| f.contains("FDT"),
        category: Category::Fdt,
    },
    Rule {
        // FAT AREA n'importe où dans le chemin exclut FAT
        name: "FAT",
        matches: |f, path| f.contains("FAT") && !path.fat_area,
        category: Category::Fat,
    },
    Rule {
        name: "sling wire",
        matches: |f, _| f.contains("SLING"),
        category: Category::SlingWire,
    },
    Rule {
        name: "distribution cable",
        matches: |f, _| f.contains("CABLE"),
        category: Category::DistributionCable,
    },
    Rule {
        name: "road",
        matches: |f, _| f.contains("ROAD") || f.contains("JALAN") || f.contains("STREET"),
        category: Category::Road,
    },
    Rule {
        name: "joint closure",
        matches: |f, _| f.contains("JOINT") || f.contains("CLOSURE"),
        category: Category::JointClosure,
    },
    Rule {
        name: "slack",
        matches: |f, _| f.contains("SLACK"),
        category: Category::Slack,
    },
];

/// Catégorie d'un unique nom de dossier, sans contexte
pub fn classify_folder(folder: &str) -> Option<Category> {
    let upper = folder.to_uppercase();
    let flags = PathFlags::scan(&[upper.as_str()]);
    first_match(&upper, &flags)
}

fn first_match(upper: &str, flags: &PathFlags) -> Option<Category> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(upper, flags))
        .map(|rule| rule.category)
}

/// Catégorie d'un placemark depuis son chemin de dossiers.
///
/// Les indicateurs (FAT AREA, EXISTING/EMR, UNCOVER) portent sur tout le chemin ;
/// les règles sont ensuite essayées du dossier le plus profond vers la racine.
pub fn classify(folder_path: &[String]) -> Category {
    let upper: Vec<String> = folder_path.iter().map(|f| f.to_uppercase()).collect();
    let flags = PathFlags::scan(&upper);
    upper
        .iter()
        .rev()
        .find_map(|folder| first_match(folder, &flags))
        .unwrap_or(Category::GenericPole)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fat_area_is_never_fat() {
        assert_eq!(classify(&path(&["FAT AREA"])), Category::Boundary);
        assert_eq!(classify(&path(&["FDT 01", "FAT AREA"])), Category::Boundary);
        assert_eq!(classify(&path(&["FAT", "FAT AREA"])), Category::Boundary);
    }

    #[test]
    fn test_fat_area_ancestor_excludes_fat() {
        assert_eq!(classify(&path(&["FAT AREA", "FAT 01"])), Category::Boundary);
        assert_eq!(
            classify(&path(&["FDT 01", "fat area", "FAT A01"])),
            Category::Boundary
        );
    }

    #[test]
    fn test_existing_marker_on_parent_folder() {
        assert_eq!(
            classify(&path(&["EXISTING POLE", "7-4"])),
            Category::ExistingPoleEmr74
        );
        assert_eq!(classify(&path(&["EMR", "POLE 7-3"])), Category::ExistingPoleEmr73);
        assert_eq!(classify(&path(&["EXISTING", "POLE"])), Category::ExistingPole);
        // Sans marqueur, le gabarit sous un dossier POLE reste un poteau neuf
        assert_eq!(classify(&path(&["NEW POLE", "7-4"])), Category::NewPole74);
    }

    #[test]
    fn test_uncover_marker_on_parent_folder() {
        assert_eq!(
            classify(&path(&["HP UNCOVER", "HP"])),
            Category::HomepassUncovered
        );
        assert_eq!(
            classify(&path(&["UNCOVERED", "HOMEPASS"])),
            Category::HomepassUncovered
        );
        assert_eq!(classify(&path(&["HP COVER", "HP"])), Category::HomepassCovered);
    }

    #[test]
    fn test_path_flags_scan() {
        let flags = PathFlags::scan(&["FAT AREA", "TIANG EMR", "HP UNCOVER"]);
        assert!(flags.fat_area && flags.existing && flags.uncover);
        assert!(!flags.pole);
        assert_eq!(PathFlags::scan::<&str>(&[]), PathFlags::default());
    }

    #[test]
    fn test_fdt_before_fat() {
        assert_eq!(classify(&path(&["FDT"])), Category::Fdt);
        assert_eq!(classify(&path(&["FDT - FAT"])), Category::Fdt);
        assert_eq!(classify(&path(&["FAT"])), Category::Fat);
        // Dossier le plus profond prioritaire
        assert_eq!(classify(&path(&["FDT 01", "FAT A01"])), Category::Fat);
    }

    #[test]
    fn test_homepass_cover_and_uncover() {
        assert_eq!(classify(&path(&["HP COVER"])), Category::HomepassCovered);
        assert_eq!(classify(&path(&["HP UNCOVER"])), Category::HomepassUncovered);
        assert_eq!(classify(&path(&["hp uncover"])), Category::HomepassUncovered);
        assert_eq!(
            classify(&path(&["FDT 01", "FAT A01", "HOMEPASS"])),
            Category::HomepassCovered
        );
    }

    #[test]
    fn test_existing_pole_variants() {
        assert_eq!(
            classify(&path(&["EXISTING POLE EMR 7-3"])),
            Category::ExistingPoleEmr73
        );
        assert_eq!(
            classify(&path(&["EXISTING POLE EMR 7-4"])),
            Category::ExistingPoleEmr74
        );
        assert_eq!(classify(&path(&["POLE EMR 7-4"])), Category::ExistingPoleEmr74);
        assert_eq!(classify(&path(&["EXISTING POLE"])), Category::ExistingPole);
        assert_eq!(classify(&path(&["TIANG EMR"])), Category::ExistingPole);
    }

    #[test]
    fn test_new_pole_variants() {
        assert_eq!(classify(&path(&["NEW POLE 7-4"])), Category::NewPole74);
        assert_eq!(classify(&path(&["NEW POLE 7-3"])), Category::NewPole73);
        assert_eq!(classify(&path(&["NEW POLE 9-4"])), Category::NewPole94);
        assert_eq!(classify(&path(&["NEW POLE"])), Category::NewPole);
    }

    #[test]
    fn test_linear_features() {
        assert_eq!(
            classify(&path(&["DISTRIBUTION CABLE", "LINE A"])),
            Category::DistributionCable
        );
        assert_eq!(classify(&path(&["SLING WIRE"])), Category::SlingWire);
        assert_eq!(classify(&path(&["BOUNDARY"])), Category::Boundary);
        assert_eq!(classify(&path(&["JALAN"])), Category::Road);
    }

    #[test]
    fn test_unmatched_falls_back_to_generic_pole() {
        assert_eq!(classify(&path(&["MISC"])), Category::GenericPole);
        assert_eq!(classify(&[]), Category::GenericPole);
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = Category::ALL.iter().map(|c| c.key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Category::ALL.len());
    }
}
