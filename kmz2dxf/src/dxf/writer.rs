//! Sérialisation DXF ASCII (paires code de groupe / valeur)
//!
//! Sans gabarit, ou avec un gabarit R12, la sortie est du R12 sans handles.
//! Avec un gabarit R13+ (`AC1012` et suivants), les ajouts suivent son dialecte :
//! handle et propriétaire sur chaque objet, marqueurs de sous-classe, blocs
//! déclarés dans `BLOCK_RECORD` et `$HANDSEED` avancé.

use geo::Coord;
use tracing::debug;

use super::blocks::Shape;
use super::template::{Group, Template};
use super::{BuiltinBlock, DrawingDocument, Entity};

/// Version écrite sans gabarit (R12)
const ACADVER: &str = "AC1009";

/// `$INSUNITS` : mètres
const INSUNITS_METERS: &str = "6";

/// Couleur des calques déclarés
const LAYER_COLOR: &str = "7";

/// Sérialise le document ; sortie identique octet pour octet à entrée identique
pub fn write_document(doc: &DrawingDocument) -> String {
    let mut out = String::new();
    match doc.template() {
        Some(template) => write_with_template(&mut out, doc, template),
        None => write_standalone(&mut out, doc),
    }
    push_pair(&mut out, 0, "EOF");
    out
}

/// Dialecte d'écriture : R12 nu, ou handles alloués à partir d'un germe
#[derive(Debug)]
struct Dialect {
    next_handle: Option<u64>,
}

impl Dialect {
    fn r12() -> Self {
        Self { next_handle: None }
    }

    fn for_template(template: &Template) -> Self {
        Self {
            next_handle: template.has_handles().then(|| template.handle_seed()),
        }
    }

    /// Écrit le handle (5) et le propriétaire (330) d'un nouvel objet
    fn handle(&mut self, out: &mut String, owner: Option<&str>) -> Option<String> {
        let next = self.next_handle.as_mut()?;
        let handle = format!("{:X}", *next);
        *next += 1;
        push_pair(out, 5, &handle);
        if let Some(owner) = owner {
            push_pair(out, 330, owner);
        }
        Some(handle)
    }

    fn subclass(&self, out: &mut String, marker: &str) {
        if self.next_handle.is_some() {
            push_pair(out, 100, marker);
        }
    }
}

fn write_standalone(out: &mut String, doc: &DrawingDocument) {
    let mut dialect = Dialect::r12();

    begin_section(out, "HEADER");
    push_pair(out, 9, "$ACADVER");
    push_pair(out, 1, ACADVER);
    push_pair(out, 9, "$INSUNITS");
    push_pair(out, 70, INSUNITS_METERS);
    end_section(out);

    begin_section(out, "TABLES");
    push_pair(out, 0, "TABLE");
    push_pair(out, 2, "LTYPE");
    push_pair(out, 70, "1");
    push_pair(out, 0, "LTYPE");
    push_pair(out, 2, "CONTINUOUS");
    push_pair(out, 70, "0");
    push_pair(out, 3, "Solid line");
    push_pair(out, 72, "65");
    push_pair(out, 73, "0");
    push_pair(out, 40, "0.0");
    push_pair(out, 0, "ENDTAB");

    let layers = doc.layers();
    push_pair(out, 0, "TABLE");
    push_pair(out, 2, "LAYER");
    push_pair(out, 70, (layers.len() + 1).to_string());
    for layer in std::iter::once("0").chain(layers.into_iter().filter(|l| *l != "0")) {
        write_layer(out, &mut dialect, layer, None);
    }
    push_pair(out, 0, "ENDTAB");

    push_pair(out, 0, "TABLE");
    push_pair(out, 2, "STYLE");
    push_pair(out, 70, "1");
    push_pair(out, 0, "STYLE");
    push_pair(out, 2, "STANDARD");
    push_pair(out, 70, "0");
    push_pair(out, 40, "0.0");
    push_pair(out, 41, "1.0");
    push_pair(out, 50, "0.0");
    push_pair(out, 71, "0");
    push_pair(out, 3, "txt");
    push_pair(out, 0, "ENDTAB");
    end_section(out);

    begin_section(out, "BLOCKS");
    for block in doc.builtin_blocks() {
        write_block(out, &mut dialect, block, None);
    }
    end_section(out);

    begin_section(out, "ENTITIES");
    write_entities(out, &mut dialect, doc.entities(), None);
    end_section(out);
}

/// Enregistrements ajoutés aux tables du gabarit
#[derive(Debug, Default)]
struct TableAdditions {
    layers: String,
    block_records: String,
}

impl TableAdditions {
    fn for_table(&self, name: &str) -> &str {
        if name.eq_ignore_ascii_case("LAYER") {
            &self.layers
        } else if name.eq_ignore_ascii_case("BLOCK_RECORD") {
            &self.block_records
        } else {
            ""
        }
    }
}

/// Rejoue les sections du gabarit ; calques, blocs et entités manquants ajoutés
/// en fin de table ou de section
fn write_with_template(out: &mut String, doc: &DrawingDocument, template: &Template) {
    let mut dialect = Dialect::for_template(template);
    debug!(
        version = ?template.version(),
        handles = template.has_handles(),
        "Writing into DXF template"
    );

    // Allocation des handles dans l'ordre : calques, blocs, entités
    let mut additions = TableAdditions::default();
    if let Some(table) = template.table("LAYER") {
        for layer in doc.layers() {
            if layer != "0" && table.entry(layer).is_none() {
                write_layer(
                    &mut additions.layers,
                    &mut dialect,
                    layer,
                    table.handle.as_deref(),
                );
            }
        }
    }

    let record_table = template.table("BLOCK_RECORD");
    let mut blocks = String::new();
    for block in doc.builtin_blocks().filter(|b| !template.has_block(b.name())) {
        let record = write_block_record(
            &mut additions.block_records,
            &mut dialect,
            block.name(),
            record_table.and_then(|t| t.handle.as_deref()),
        );
        write_block(&mut blocks, &mut dialect, block, record.as_deref());
    }

    let model_space = record_table
        .and_then(|t| t.entry("*Model_Space"))
        .and_then(|e| e.handle.as_deref());
    let mut entities = String::new();
    write_entities(&mut entities, &mut dialect, doc.entities(), model_space);

    let mut blocks_written = false;
    let mut entities_written = false;

    for section in template.sections() {
        begin_section(out, &section.name);
        match section.name.as_str() {
            "HEADER" => push_header(out, &section.groups, dialect.next_handle),
            "TABLES" => push_tables(out, &section.groups, &additions),
            _ => push_groups(out, &section.groups),
        }
        match section.name.as_str() {
            "BLOCKS" => {
                out.push_str(&blocks);
                blocks_written = true;
            }
            "ENTITIES" => {
                out.push_str(&entities);
                entities_written = true;
            }
            _ => {}
        }
        end_section(out);
    }

    if !blocks_written && !blocks.is_empty() {
        begin_section(out, "BLOCKS");
        out.push_str(&blocks);
        end_section(out);
    }
    if !entities_written {
        begin_section(out, "ENTITIES");
        out.push_str(&entities);
        end_section(out);
    }
}

/// En-tête rejoué ; `$HANDSEED` remplacé par le prochain handle libre
fn push_header(out: &mut String, groups: &[Group], seed: Option<u64>) {
    let mut seed_follows = false;
    for g in groups {
        match seed {
            Some(seed) if seed_follows && g.code == 5 => {
                push_pair(out, 5, format!("{:X}", seed))
            }
            _ => push_pair(out, g.code, &g.value),
        }
        seed_follows = g.code == 9 && g.value == "$HANDSEED";
    }
}

/// Tables rejouées ; enregistrements ajoutés avant le ENDTAB de leur table
fn push_tables(out: &mut String, groups: &[Group], additions: &TableAdditions) {
    let mut current: Option<&str> = None;
    let mut table_header = false;
    for g in groups {
        if g.code == 0 && g.value == "ENDTAB" {
            if let Some(name) = current.take() {
                out.push_str(additions.for_table(name));
            }
        }
        push_pair(out, g.code, &g.value);

        if g.code == 0 {
            table_header = g.value == "TABLE";
        } else if table_header && g.code == 2 {
            current = Some(g.value.as_str());
            table_header = false;
        }
    }
}

fn write_layer(out: &mut String, dialect: &mut Dialect, name: &str, table: Option<&str>) {
    push_pair(out, 0, "LAYER");
    dialect.handle(out, table);
    dialect.subclass(out, "AcDbSymbolTableRecord");
    dialect.subclass(out, "AcDbLayerTableRecord");
    push_pair(out, 2, name);
    push_pair(out, 70, "0");
    push_pair(out, 62, LAYER_COLOR);
    push_pair(out, 6, "CONTINUOUS");
}

fn write_block_record(
    out: &mut String,
    dialect: &mut Dialect,
    name: &str,
    table: Option<&str>,
) -> Option<String> {
    if dialect.next_handle.is_none() {
        return None;
    }
    push_pair(out, 0, "BLOCK_RECORD");
    let handle = dialect.handle(out, table);
    dialect.subclass(out, "AcDbSymbolTableRecord");
    dialect.subclass(out, "AcDbBlockTableRecord");
    push_pair(out, 2, name);
    handle
}

/// Début d'entité : type, handle, calque, couleur
fn entity_header(
    out: &mut String,
    dialect: &mut Dialect,
    kind: &str,
    owner: Option<&str>,
    layer: &str,
    color: Option<u8>,
) {
    push_pair(out, 0, kind);
    dialect.handle(out, owner);
    dialect.subclass(out, "AcDbEntity");
    push_pair(out, 8, layer);
    if let Some(color) = color {
        push_pair(out, 62, color.to_string());
    }
}

fn write_block(out: &mut String, dialect: &mut Dialect, block: BuiltinBlock, record: Option<&str>) {
    entity_header(out, dialect, "BLOCK", record, "0", None);
    dialect.subclass(out, "AcDbBlockBegin");
    push_pair(out, 2, block.name());
    push_pair(out, 70, "0");
    push_point(out, 10, Coord { x: 0.0, y: 0.0 });
    push_pair(out, 3, block.name());

    for shape in block.shapes() {
        match shape {
            Shape::Line(a, b) => {
                entity_header(out, dialect, "LINE", record, "0", None);
                dialect.subclass(out, "AcDbLine");
                push_point(out, 10, a);
                push_point(out, 11, b);
            }
            Shape::Circle(center, radius) => {
                entity_header(out, dialect, "CIRCLE", record, "0", None);
                dialect.subclass(out, "AcDbCircle");
                push_point(out, 10, center);
                push_pair(out, 40, fmt_f64(radius));
            }
        }
    }

    entity_header(out, dialect, "ENDBLK", record, "0", None);
    dialect.subclass(out, "AcDbBlockEnd");
}

fn write_entities(
    out: &mut String,
    dialect: &mut Dialect,
    entities: &[Entity],
    owner: Option<&str>,
) {
    for entity in entities {
        match entity {
            Entity::Polyline {
                layer,
                color,
                vertices,
                closed,
            } => {
                entity_header(out, dialect, "LWPOLYLINE", owner, layer, Some(*color));
                dialect.subclass(out, "AcDbPolyline");
                push_pair(out, 90, vertices.len().to_string());
                push_pair(out, 70, if *closed { "1" } else { "0" });
                for v in vertices {
                    push_pair(out, 10, fmt_f64(v.x));
                    push_pair(out, 20, fmt_f64(v.y));
                }
            }
            Entity::Circle {
                layer,
                color,
                center,
                radius,
            } => {
                entity_header(out, dialect, "CIRCLE", owner, layer, Some(*color));
                dialect.subclass(out, "AcDbCircle");
                push_point(out, 10, *center);
                push_pair(out, 40, fmt_f64(*radius));
            }
            Entity::Insert {
                layer,
                color,
                block,
                position,
                scale,
                rotation,
            } => {
                entity_header(out, dialect, "INSERT", owner, layer, Some(*color));
                dialect.subclass(out, "AcDbBlockReference");
                push_pair(out, 2, block);
                push_point(out, 10, *position);
                push_pair(out, 41, fmt_f64(*scale));
                push_pair(out, 42, fmt_f64(*scale));
                push_pair(out, 43, fmt_f64(*scale));
                push_pair(out, 50, fmt_f64(*rotation));
            }
            Entity::Text {
                layer,
                color,
                position,
                height,
                rotation,
                text,
            } => {
                entity_header(out, dialect, "TEXT", owner, layer, Some(*color));
                dialect.subclass(out, "AcDbText");
                push_point(out, 10, *position);
                push_pair(out, 40, fmt_f64(*height));
                push_pair(out, 1, single_line(text));
                push_pair(out, 50, fmt_f64(*rotation));
                push_pair(out, 7, "STANDARD");
                // TEXT porte deux fois le marqueur AcDbText
                dialect.subclass(out, "AcDbText");
            }
        }
    }
}

fn begin_section(out: &mut String, name: &str) {
    push_pair(out, 0, "SECTION");
    push_pair(out, 2, name);
}

fn end_section(out: &mut String) {
    push_pair(out, 0, "ENDSEC");
}

fn push_groups(out: &mut String, groups: &[Group]) {
    for g in groups {
        push_pair(out, g.code, &g.value);
    }
}

fn push_pair(out: &mut String, code: i32, value: impl AsRef<str>) {
    out.push_str(&code.to_string());
    out.push('\n');
    out.push_str(value.as_ref());
    out.push('\n');
}

fn push_point(out: &mut String, code: i32, p: Coord<f64>) {
    push_pair(out, code, fmt_f64(p.x));
    push_pair(out, code + 10, fmt_f64(p.y));
    push_pair(out, code + 20, "0.0");
}

/// Précision fixe (6 décimales), sans zéro négatif
fn fmt_f64(value: f64) -> String {
    let s = format!("{:.6}", value);
    if s == "-0.000000" {
        "0.000000".to_string()
    } else {
        s
    }
}

/// Une valeur de groupe tient sur une ligne
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dxf::template::tests::{TEMPLATE, TEMPLATE_R2000};
    use crate::dxf::Template;
    use crate::symbols::SymbolHandle;

    fn sample_document() -> DrawingDocument {
        let mut doc = DrawingDocument::new();
        doc.add_polyline(
            "DISTRIBUTION CABLE",
            4,
            vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: -0.0000001 }],
            false,
        );
        doc.add_text("FAT", 3, Coord { x: 1.0, y: 2.0 }, 2.0, 45.0, "FAT-01\nA");
        doc.insert_block(
            &SymbolHandle::Builtin(BuiltinBlock::Fat),
            "FAT",
            3,
            Coord { x: 1.0, y: 2.0 },
            1.5,
            0.0,
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_fmt_f64() {
        assert_eq!(fmt_f64(1.0), "1.000000");
        assert_eq!(fmt_f64(-0.0000001), "0.000000");
        assert_eq!(fmt_f64(-2.5), "-2.500000");
    }

    #[test]
    fn test_standalone_structure() {
        let dxf = write_document(&sample_document());
        assert!(dxf.starts_with("0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1009\n"));
        assert!(dxf.contains("9\n$INSUNITS\n70\n6\n"));
        assert!(dxf.contains("0\nLAYER\n2\nDISTRIBUTION CABLE\n"));
        assert!(dxf.contains("0\nBLOCK\n8\n0\n2\nKMZ2DXF_FAT\n"));
        assert!(dxf.contains("0\nINSERT\n8\nFAT\n62\n3\n2\nKMZ2DXF_FAT\n"));
        assert!(dxf.contains("1\nFAT-01 A\n"));
        assert!(dxf.ends_with("0\nENDSEC\n0\nEOF\n"));

        // Paires complètes : nombre de lignes pair
        assert_eq!(dxf.lines().count() % 2, 0);
    }

    #[test]
    fn test_layers_sorted() {
        let dxf = write_document(&sample_document());
        let cable = dxf.find("2\nDISTRIBUTION CABLE\n70").unwrap();
        let fat = dxf.find("2\nFAT\n70").unwrap();
        assert!(cable < fat);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            write_document(&sample_document()),
            write_document(&sample_document())
        );
    }

    #[test]
    fn test_template_replay() {
        let template = Template::parse(TEMPLATE).unwrap();
        let mut doc = DrawingDocument::from_template(template);
        doc.insert_block(
            &SymbolHandle::Template("ODP_SYMBOL".into()),
            "FDT",
            1,
            Coord { x: 5.0, y: 5.0 },
            2.0,
            0.0,
        )
        .unwrap();
        doc.insert_block(
            &SymbolHandle::Builtin(BuiltinBlock::Homepass),
            "HP COVER",
            5,
            Coord { x: 6.0, y: 5.0 },
            0.5,
            0.0,
        )
        .unwrap();

        let dxf = write_document(&doc);
        // Contenu du gabarit conservé
        assert!(dxf.contains("0\nLINE\n8\nFRAME\n"));
        assert!(dxf.contains("2\nTIANG BARU 7-4\n"));
        // Bloc intégré ajouté dans BLOCKS, avant les entités
        let hp_block = dxf.find("0\nBLOCK\n8\n0\n2\nKMZ2DXF_HP\n").unwrap();
        let entities = dxf.find("2\nENTITIES\n").unwrap();
        assert!(hp_block < entities);
        // Entités ajoutées après celles du gabarit
        let frame = dxf.find("8\nFRAME\n").unwrap();
        let insert = dxf.find("2\nODP_SYMBOL\n10\n5.000000").unwrap();
        assert!(frame < insert);
        assert_eq!(dxf.matches("0\nEOF\n").count(), 1);
    }

    /// Handles (codes 5 et 105) hors en-tête
    fn object_handles(template: &Template) -> Vec<u64> {
        template
            .sections()
            .iter()
            .filter(|s| s.name != "HEADER")
            .flat_map(|s| s.groups.iter())
            .filter(|g| g.code == 5 || g.code == 105)
            .map(|g| u64::from_str_radix(&g.value, 16).unwrap())
            .collect()
    }

    fn r2000_document() -> DrawingDocument {
        let template = Template::parse(TEMPLATE_R2000).unwrap();
        let mut doc = DrawingDocument::from_template(template);
        doc.add_text("FAT", 3, Coord { x: 1.0, y: 2.0 }, 2.0, 45.0, "FAT-01");
        doc.insert_block(
            &SymbolHandle::Builtin(BuiltinBlock::Fat),
            "FAT",
            3,
            Coord { x: 1.0, y: 2.0 },
            1.5,
            0.0,
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_r2000_template_gets_handles() {
        let dxf = write_document(&r2000_document());

        // Premier handle alloué : $HANDSEED du gabarit (calque FAT)
        assert!(dxf.contains(
            "0\nLAYER\n5\n40\n330\n2\n100\nAcDbSymbolTableRecord\n100\nAcDbLayerTableRecord\n2\nFAT\n"
        ));
        assert!(dxf.contains(
            "0\nBLOCK_RECORD\n5\n41\n330\n1\n100\nAcDbSymbolTableRecord\n100\nAcDbBlockTableRecord\n2\nKMZ2DXF_FAT\n"
        ));
        // Bloc possédé par son enregistrement
        assert!(dxf.contains(
            "0\nBLOCK\n5\n42\n330\n41\n100\nAcDbEntity\n8\n0\n100\nAcDbBlockBegin\n2\nKMZ2DXF_FAT\n"
        ));
        assert!(dxf.contains("100\nAcDbBlockEnd\n"));
        // Entités possédées par *Model_Space
        assert!(dxf.contains("330\n1F\n100\nAcDbEntity\n8\nFAT\n62\n3\n100\nAcDbBlockReference\n2\nKMZ2DXF_FAT\n"));
        assert!(dxf.contains("330\n1F\n100\nAcDbEntity\n8\nFAT\n62\n3\n100\nAcDbText\n"));

        // Enregistrement du bloc dans la table, avant la section BLOCKS
        let record = dxf.find("2\nKMZ2DXF_FAT\n").unwrap();
        assert!(record < dxf.find("2\nBLOCKS\n").unwrap());
    }

    #[test]
    fn test_r2000_output_is_consistent() {
        let dxf = write_document(&r2000_document());
        let reread = Template::parse(&dxf).unwrap();
        assert_eq!(reread.version(), Some("AC1015"));
        assert!(reread.has_block("KMZ2DXF_FAT"));
        assert!(reread.table("LAYER").unwrap().entry("FAT").is_some());
        let record = reread
            .table("BLOCK_RECORD")
            .and_then(|t| t.entry("KMZ2DXF_FAT"))
            .unwrap();
        assert!(record.handle.is_some());

        // Handles uniques, tous sous le nouveau $HANDSEED
        let mut handles = object_handles(&reread);
        let count = handles.len();
        handles.sort_unstable();
        handles.dedup();
        assert_eq!(handles.len(), count);
        let seed = reread.handle_seed();
        assert!(handles.iter().all(|h| *h < seed));
        assert!(dxf.contains(&format!("9\n$HANDSEED\n5\n{:X}\n", seed)));
        assert!(seed > 0x40);

        // Chaque entité ajoutée porte un handle
        assert_eq!(dxf.matches("0\nINSERT\n").count(), 1);
        assert!(dxf.contains("0\nINSERT\n5\n"));
        assert!(dxf.contains("0\nTEXT\n5\n"));
    }

    #[test]
    fn test_r12_template_stays_without_handles() {
        let template = Template::parse(TEMPLATE).unwrap();
        let mut doc = DrawingDocument::from_template(template);
        doc.add_circle("HP COVER", 5, Coord { x: 0.0, y: 0.0 }, 1.0);
        let dxf = write_document(&doc);
        assert!(dxf.contains("0\nCIRCLE\n8\nHP COVER\n62\n5\n10\n"));
        assert!(!dxf.contains("\n100\n"));
        assert!(!dxf.contains("$HANDSEED"));
    }
}
