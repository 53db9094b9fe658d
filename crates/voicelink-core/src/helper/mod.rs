//! Native helper process supervision.

mod launch;
mod supervisor;

pub use {
    launch::{HOST_TEXT_INSERTION_ENV, LAUNCHED_BY_HOST_ENV, curated_env, resolve_helper_binary},
    supervisor::{HelperConfig, HelperSupervisor},
};
