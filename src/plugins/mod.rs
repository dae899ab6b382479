// src/plugins/mod.rs

//! Concrete build plugins.
//!
//! Each plugin is a factory over an options record (defaults applied at
//! construction) implementing [`crate::engine::BuildPlugin`]. The heavy
//! payloads — transpilation and bundling — sit behind the [`Transform`] and
//! [`Bundler`] seams; the plugins own pattern sets, path derivation, and the
//! watch/complete protocol.

pub mod client_build;
pub mod load_data;
pub mod transpile;

pub use client_build::{
    BundleOptions, Bundler, ClientBuildOptions, ClientBuildPlugin, NullBundler,
};
pub use load_data::{DataOptions, DataPlugin};
pub use transpile::{
    PassthroughTransform, Transform, TransformOptions, TranspileOptions, TranspilePlugin,
};
