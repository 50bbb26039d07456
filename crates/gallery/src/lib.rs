//! Per-user channel galleries: the capped selection list, its persistence
//! port, and the selection state machine that drives it.

pub mod error;
pub mod selection;
pub mod store;
pub mod store_file;
pub mod store_memory;
pub mod user;

pub use {
    error::{Error, Result},
    selection::{SelectionCommand, SelectionMachine, SelectionOutcome, SelectionState, Transition},
    store::{
        AddOutcome, GALLERY_CAPACITY, GalleryDocument, GalleryPersistence, GalleryStore,
        UserGallery,
    },
    store_file::FileGalleryPersistence,
    store_memory::InMemoryGalleryPersistence,
    user::UserId,
};
