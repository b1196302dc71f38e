//! Multi-pass compilation: the shared symbol table, the imports/decl/main
//! pass state machine, the C output sink, and entry-point synthesis
//! (spec §3, §4.5-§4.8).

pub mod cgen_sink;
pub mod hot_reload;
pub mod main_emitter;
pub mod pass_driver;
pub mod symbol_table;
