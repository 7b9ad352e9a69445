pub mod backend;
pub mod config;
pub mod error;
pub mod pose;
pub mod projection;
pub mod render_loop;
pub mod rig;
pub mod scene;
pub mod sequencer;
pub mod stimulus;

pub mod cli;
