#![doc = include_str!("../README.md")]

/**
 * These are implementations of the allocation strategies.
 */
mod impls;
pub use impls::*;
