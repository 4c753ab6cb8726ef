//! Lecture d'un gabarit DXF (sections conservées telles quelles, liste des blocs)
//!
//! À partir de R13 (`AC1012`), chaque objet porte un handle (code 5) et les
//! blocs doivent être déclarés dans la table `BLOCK_RECORD` : les tables et le
//! prochain handle libre sont relevés pour que l'écriture puisse compléter le
//! gabarit dans le même dialecte.

use std::path::Path;

use tracing::debug;

use crate::ConvertError;

/// Paire code de groupe / valeur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub code: i32,
    pub value: String,
}

/// Section DXF (groupes entre le nom de section et ENDSEC)
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub groups: Vec<Group>,
}

/// Première version avec handles et marqueurs de sous-classe (R13)
const HANDLES_SINCE: u32 = 1012;

/// Entrée d'une table de symboles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub name: String,
    pub handle: Option<String>,
}

/// Table de la section TABLES (LAYER, BLOCK_RECORD, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub name: String,
    pub handle: Option<String>,
    pub entries: Vec<TableEntry>,
}

impl SymbolTable {
    pub fn entry(&self, name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

/// Gabarit DXF chargé
#[derive(Debug, Clone)]
pub struct Template {
    sections: Vec<Section>,
    block_names: Vec<String>,
    version: Option<String>,
    tables: Vec<SymbolTable>,
    handle_seed: u64,
}

impl Template {
    /// Parse le texte d'un DXF ASCII
    pub fn parse(text: &str) -> Result<Self, ConvertError> {
        let groups = parse_groups(text)?;
        let sections = parse_sections(groups)?;
        let block_names = collect_block_names(&sections);
        let version = find_version(&sections);
        let tables = collect_tables(&sections);
        let handle_seed = find_handle_seed(&sections);

        let template = Self {
            sections,
            block_names,
            version,
            tables,
            handle_seed,
        };
        if template.has_handles() && template.table("BLOCK_RECORD").is_none() {
            return Err(ConvertError::template(format!(
                "{} template has no BLOCK_RECORD table",
                template.version().unwrap_or_default()
            )));
        }

        debug!(
            sections = template.sections.len(),
            blocks = template.block_names.len(),
            version = ?template.version,
            handles = template.has_handles(),
            "DXF template loaded"
        );
        Ok(template)
    }

    /// Charge un gabarit depuis un fichier
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let bytes = std::fs::read(path)?;
        // Les DXF anciens sont souvent en ANSI : les octets non UTF-8 sont remplacés
        Self::parse(&String::from_utf8_lossy(&bytes))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Noms des blocs nommés (hors blocs anonymes `*...`)
    pub fn block_names(&self) -> &[String] {
        &self.block_names
    }

    /// `$ACADVER` du gabarit
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// `AC1015` → 1015
    pub fn version_number(&self) -> Option<u32> {
        self.version.as_deref()?.strip_prefix("AC")?.parse().ok()
    }

    /// Objets identifiés par handle et marqueurs `100` (R13 et suivantes)
    pub fn has_handles(&self) -> bool {
        self.version_number().map_or(false, |v| v >= HANDLES_SINCE)
    }

    /// Premier handle libre : `$HANDSEED`, ou au-delà du plus grand handle relevé
    pub fn handle_seed(&self) -> u64 {
        self.handle_seed
    }

    pub fn tables(&self) -> &[SymbolTable] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&SymbolTable> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn has_block(&self, name: &str) -> bool {
        self.block_names.iter().any(|b| b.eq_ignore_ascii_case(name))
    }
}

fn parse_groups(input: &str) -> Result<Vec<Group>, ConvertError> {
    let mut lines: Vec<&str> = input.lines().collect();
    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.len() % 2 != 0 {
        return Err(ConvertError::template(
            "expected an even number of lines (code/value pairs)",
        ));
    }

    lines
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let raw = pair[0].trim();
            let code: i32 = raw.parse().map_err(|_| {
                ConvertError::template(format!("invalid group code {:?} at line {}", raw, i * 2 + 1))
            })?;
            Ok(Group {
                code,
                value: pair[1].trim().to_string(),
            })
        })
        .collect()
}

fn parse_sections(groups: Vec<Group>) -> Result<Vec<Section>, ConvertError> {
    let mut sections = Vec::new();
    let mut iter = groups.into_iter();

    while let Some(g) = iter.next() {
        if g.code != 0 {
            continue;
        }
        match g.value.as_str() {
            "EOF" => break,
            "SECTION" => {
                let name = match iter.next() {
                    Some(Group { code: 2, value }) => value,
                    _ => return Err(ConvertError::template("SECTION without name")),
                };

                let mut body = Vec::new();
                let mut closed = false;
                for g in iter.by_ref() {
                    if g.code == 0 && g.value == "ENDSEC" {
                        closed = true;
                        break;
                    }
                    body.push(g);
                }
                if !closed {
                    return Err(ConvertError::template(format!(
                        "section {} is not terminated by ENDSEC",
                        name
                    )));
                }
                sections.push(Section { name, groups: body });
            }
            _ => {}
        }
    }

    Ok(sections)
}

fn collect_block_names(sections: &[Section]) -> Vec<String> {
    let mut names = Vec::new();
    for section in sections.iter().filter(|s| s.name == "BLOCKS") {
        let mut in_block_header = false;
        for g in &section.groups {
            if g.code == 0 {
                in_block_header = g.value == "BLOCK";
            } else if in_block_header && g.code == 2 {
                in_block_header = false;
                if !g.value.starts_with('*') {
                    names.push(g.value.clone());
                }
            }
        }
    }
    names
}

fn find_version(sections: &[Section]) -> Option<String> {
    let header = sections.iter().find(|s| s.name == "HEADER")?;
    let pos = header
        .groups
        .iter()
        .position(|g| g.code == 9 && g.value == "$ACADVER")?;
    header
        .groups
        .get(pos + 1)
        .filter(|g| g.code == 1)
        .map(|g| g.value.clone())
}

fn collect_tables(sections: &[Section]) -> Vec<SymbolTable> {
    let mut tables = Vec::new();
    for section in sections.iter().filter(|s| s.name == "TABLES") {
        let mut current: Option<SymbolTable> = None;
        for g in &section.groups {
            match (g.code, g.value.as_str()) {
                (0, "TABLE") => {
                    current = Some(SymbolTable {
                        name: String::new(),
                        handle: None,
                        entries: Vec::new(),
                    });
                }
                (0, "ENDTAB") => tables.extend(current.take()),
                (0, _) => {
                    if let Some(table) = current.as_mut() {
                        table.entries.push(TableEntry {
                            name: String::new(),
                            handle: None,
                        });
                    }
                }
                (2, name) => {
                    if let Some(table) = current.as_mut() {
                        match table.entries.last_mut() {
                            Some(entry) if entry.name.is_empty() => entry.name = name.to_string(),
                            None if table.name.is_empty() => table.name = name.to_string(),
                            _ => {}
                        }
                    }
                }
                // 105 : handle des entrées DIMSTYLE
                (5 | 105, handle) => {
                    if let Some(table) = current.as_mut() {
                        match table.entries.last_mut() {
                            Some(entry) if entry.handle.is_none() => {
                                entry.handle = Some(handle.to_string())
                            }
                            None if table.handle.is_none() => table.handle = Some(handle.to_string()),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }
    tables
}

fn find_handle_seed(sections: &[Section]) -> u64 {
    let declared = sections
        .iter()
        .filter(|s| s.name == "HEADER")
        .flat_map(|s| s.groups.windows(2))
        .find(|w| w[0].code == 9 && w[0].value == "$HANDSEED" && w[1].code == 5)
        .and_then(|w| u64::from_str_radix(&w[1].value, 16).ok())
        .unwrap_or(0);

    let used = sections
        .iter()
        .filter(|s| s.name != "HEADER")
        .flat_map(|s| s.groups.iter())
        .filter(|g| g.code == 5 || g.code == 105)
        .filter_map(|g| u64::from_str_radix(&g.value, 16).ok())
        .max()
        .map_or(0, |h| h + 1);

    declared.max(used).max(1)
}
