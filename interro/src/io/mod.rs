//! I/O helpers: flow files on disk and the terminal conversation loop.

pub mod flow_file;
pub mod terminal;
