//! A line editor in the style of Unix `ed`, built around a linked line store
//! with generative undo and redo.

pub mod address;
pub mod config;
pub mod controller;
pub mod document_model;
pub mod editor;
pub mod error;
pub mod search;

pub use controller::Session;
pub use editor::Editor;
pub use error::{EdError, EdResult};
