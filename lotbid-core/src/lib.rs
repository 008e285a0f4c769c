#![warn(missing_docs)]
// Note: this overwrites the link in the README to point to the rust docs of the lotbid-core crate.
//! [lotbid_core]: https://docs.rs/lotbid_core/latest/lotbid_core/index.html
#![doc = include_str!("../README.md")]

/// Core domain models for the bidding engine.
///
/// Besides plain data, this module holds the pure parts of the engine: offer
/// normalization, buyer scoring, and the filters applied to an allocation's
/// line set. None of these touch storage.
pub mod models;

/// Interface traits for the bidding engine.
///
/// These are the "ports" of a hexagonal architecture: persistence backends,
/// allocation strategies, and the host application implement them, and the
/// HTTP layer only ever talks to these traits.
pub mod ports;
