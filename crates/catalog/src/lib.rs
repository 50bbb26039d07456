//! Channel catalog for tvlogo: the static channel table, the query
//! normalizer, and the alias matcher built on top of both.

pub mod catalog;
pub mod error;
pub mod normalize;

pub use {
    catalog::{Catalog, ChannelEntry, MAX_KEY_LEN},
    error::{Error, Result},
    normalize::normalize,
};
