//! List stores shared by every resource-list screen

mod list_store;

pub use list_store::{
    FetchOutcome, FetchStatus, ListOptions, ListResourceStore, ListState, Normalizer,
};
