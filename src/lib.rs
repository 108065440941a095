//! projlog - change notes for every project save
//!
//! projlog keeps an append-only change log next to a project file, decides
//! when a save should ask for a note, and mirrors the project and its log
//! to a master copy on request.

pub mod capture;
pub mod config;
pub mod mirror;
pub mod storage;
