//! Service Layer - the background update loop

mod updater;

pub use updater::{
    current_entry, EnrUpdater, EnrUpdaterConfig, EnrUpdaterHandle, UpdaterError, UpdaterExit,
};
