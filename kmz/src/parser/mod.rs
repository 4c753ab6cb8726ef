//! Lecture du document KML

pub mod coords;
pub mod tree;
