//! Terminal client for PocketNotes.

pub mod command;
pub mod config;
pub mod console;
pub mod controller;
pub mod image;
pub mod screens;
pub mod tasks;
