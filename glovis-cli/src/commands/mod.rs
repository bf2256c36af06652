//! CLI subcommands.

pub mod config;
pub mod scene_list;
pub mod sensors;
