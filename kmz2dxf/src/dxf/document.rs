//! Document de dessin en mémoire

use std::collections::BTreeSet;
use std::fmt;

use geo::Coord;

use super::{BuiltinBlock, Template};
use crate::symbols::SymbolHandle;

/// Entités produites par la conversion
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Polyline {
        layer: String,
        color: u8,
        vertices: Vec<Coord<f64>>,
        closed: bool,
    },
    Circle {
        layer: String,
        color: u8,
        center: Coord<f64>,
        radius: f64,
    },
    Insert {
        layer: String,
        color: u8,
        block: String,
        position: Coord<f64>,
        scale: f64,
        rotation: f64,
    },
    Text {
        layer: String,
        color: u8,
        position: Coord<f64>,
        height: f64,
        rotation: f64,
        text: String,
    },
}

impl Entity {
    pub fn layer(&self) -> &str {
        match self {
            Entity::Polyline { layer, .. }
            | Entity::Circle { layer, .. }
            | Entity::Insert { layer, .. }
            | Entity::Text { layer, .. } => layer,
        }
    }
}

/// Insertion réussie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inserted {
    pub block: String,
}

/// Raison d'un repli sur un marqueur simple
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    UnknownBlock(String),
    InvalidScale(f64),
    InvalidPosition,
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::UnknownBlock(name) => write!(f, "block '{}' is not defined", name),
            Fallback::InvalidScale(scale) => write!(f, "invalid block scale {}", scale),
            Fallback::InvalidPosition => write!(f, "non-finite insertion point"),
        }
    }
}

/// Entités, blocs intégrés utilisés et gabarit éventuel
#[derive(Debug, Default)]
pub struct DrawingDocument {
    entities: Vec<Entity>,
    builtin_blocks: BTreeSet<BuiltinBlock>,
    template: Option<Template>,
}

impl DrawingDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_template(template: Template) -> Self {
        Self {
            template: Some(template),
            ..Self::default()
        }
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Blocs intégrés référencés, dans un ordre stable
    pub fn builtin_blocks(&self) -> impl Iterator<Item = BuiltinBlock> + '_ {
        self.builtin_blocks.iter().copied()
    }

    /// Calques utilisés par les entités, triés
    pub fn layers(&self) -> BTreeSet<&str> {
        self.entities.iter().map(Entity::layer).collect()
    }

    pub fn add_polyline(&mut self, layer: &str, color: u8, vertices: Vec<Coord<f64>>, closed: bool) {
        self.entities.push(Entity::Polyline {
            layer: layer.to_string(),
            color,
            vertices,
            closed,
        });
    }

    pub fn add_circle(&mut self, layer: &str, color: u8, center: Coord<f64>, radius: f64) {
        self.entities.push(Entity::Circle {
            layer: layer.to_string(),
            color,
            center,
            radius,
        });
    }

    pub fn add_text(
        &mut self,
        layer: &str,
        color: u8,
        position: Coord<f64>,
        height: f64,
        rotation: f64,
        text: &str,
    ) {
        self.entities.push(Entity::Text {
            layer: layer.to_string(),
            color,
            position,
            height,
            rotation,
            text: text.to_string(),
        });
    }

    /// Insère un bloc ; le document reste inchangé en cas de repli
    pub fn insert_block(
        &mut self,
        symbol: &SymbolHandle,
        layer: &str,
        color: u8,
        position: Coord<f64>,
        scale: f64,
        rotation: f64,
    ) -> Result<Inserted, Fallback> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Fallback::InvalidScale(scale));
        }
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(Fallback::InvalidPosition);
        }

        let block = match symbol {
            SymbolHandle::Template(name) => {
                let defined = self.template.as_ref().map_or(false, |t| t.has_block(name));
                if !defined {
                    return Err(Fallback::UnknownBlock(name.clone()));
                }
                name.clone()
            }
            SymbolHandle::Builtin(block) => {
                self.builtin_blocks.insert(*block);
                block.name().to_string()
            }
        };

        self.entities.push(Entity::Insert {
            layer: layer.to_string(),
            color,
            block: block.clone(),
            position,
            scale,
            rotation,
        });
        Ok(Inserted { block })
    }
}
