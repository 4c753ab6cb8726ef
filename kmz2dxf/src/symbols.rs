//! Bibliothèque de symboles : blocs du gabarit, sinon blocs intégrés

use tracing::debug;

use crate::classify::Category;
use crate::dxf::{BuiltinBlock, Template};

/// Référence vers un bloc insérable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolHandle {
    /// Bloc défini par le gabarit
    Template(String),
    Builtin(BuiltinBlock),
}

impl SymbolHandle {
    pub fn block_name(&self) -> &str {
        match self {
            SymbolHandle::Template(name) => name,
            SymbolHandle::Builtin(block) => block.name(),
        }
    }
}

/// Recherche du symbole d'une catégorie
pub trait SymbolLibrary {
    fn find(&self, category: Category) -> Option<SymbolHandle>;
}

/// Sous-chaînes recherchées (insensible à la casse) dans les noms de blocs du gabarit
fn patterns(category: Category) -> &'static [&'static str] {
    match category {
        Category::Fdt => &["FDT", "ODP"],
        Category::Fat => &["FAT", "ODC"],
        Category::HomepassCovered => &["HP_COVER", "HOMEPASS", "HP"],
        Category::HomepassUncovered => &["HP_UNCOVER", "UNCOVER"],
        Category::NewPole74 => &["NEW POLE 7-4", "TIANG BARU 7-4"],
        Category::NewPole73 => &["NEW POLE 7-3", "TIANG BARU 7-3"],
        Category::NewPole94 => &["NEW POLE 9-4", "TIANG BARU 9-4"],
        Category::NewPole => &["NEW POLE", "TIANG BARU"],
        Category::ExistingPoleEmr74 => &["EMR 7-4", "EXISTING POLE 7-4"],
        Category::ExistingPoleEmr73 => &["EMR 7-3", "EXISTING POLE 7-3"],
        Category::ExistingPole => &["EXISTING POLE", "EMR"],
        Category::JointClosure => &["JOINT", "CLOSURE", "JC"],
        Category::Slack => &["SLACK"],
        Category::GenericPole => &["POLE", "TIANG"],
        Category::DistributionCable
        | Category::SlingWire
        | Category::Boundary
        | Category::Road => &[],
    }
}

/// Sous-chaînes qui disqualifient un bloc pour la catégorie
fn exclusions(category: Category) -> &'static [&'static str] {
    match category {
        // "HP_UNCOVER" contient "HP"
        Category::HomepassCovered => &["UNCOVER"],
        _ => &[],
    }
}

fn builtin(category: Category) -> Option<BuiltinBlock> {
    match category {
        Category::Fdt => Some(BuiltinBlock::Fdt),
        Category::Fat => Some(BuiltinBlock::Fat),
        Category::HomepassCovered | Category::HomepassUncovered => Some(BuiltinBlock::Homepass),
        Category::JointClosure => Some(BuiltinBlock::JointClosure),
        c if c.is_pole() => Some(BuiltinBlock::Pole),
        _ => None,
    }
}

/// Bibliothèque adossée au gabarit (optionnel)
#[derive(Debug, Default)]
pub struct TemplateSymbolLibrary {
    block_names: Vec<String>,
}

impl TemplateSymbolLibrary {
    pub fn new(template: Option<&Template>) -> Self {
        Self {
            block_names: template
                .map(|t| t.block_names().to_vec())
                .unwrap_or_default(),
        }
    }

    fn lookup(&self, category: Category) -> Option<&str> {
        let excluded = exclusions(category);
        patterns(category).iter().find_map(|pattern| {
            self.block_names
                .iter()
                .find(|name| {
                    let upper = name.to_uppercase();
                    upper.contains(pattern) && !excluded.iter().any(|x| upper.contains(x))
                })
                .map(String::as_str)
        })
    }
}

impl SymbolLibrary for TemplateSymbolLibrary {
    fn find(&self, category: Category) -> Option<SymbolHandle> {
        if let Some(name) = self.lookup(category) {
            debug!(category = category.key(), block = name, "Template block selected");
            return Some(SymbolHandle::Template(name.to_string()));
        }
        builtin(category).map(SymbolHandle::Builtin)
    }
}
