//! Driver for mounting databases as filesystems.
//!
//! The binary is thin: it loads [`config::MdbfsConfig`], picks a backend
//! through [`driver::Selection`], then either answers a one-shot
//! [`inspect`] command or hands the mapped filesystem to [`mount::mount`].

pub mod config;
pub mod driver;
pub mod inspect;
pub mod mount;
