//! Cymatic field library - audio-reactive particle field engine

pub mod audio;
pub mod cli;
pub mod error;
pub mod field;
pub mod params;
