// src/ingest/providers/mod.rs
pub mod answers_atom;
