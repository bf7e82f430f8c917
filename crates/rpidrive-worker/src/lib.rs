//! Background work for RPi Drive.
//!
//! This crate provides:
//! - the volume [`indexer`], reconciling file rows with the disk
//! - [`jobs`] for zip archives and expired link cleanup
//! - the [`WorkerRunner`] tick loop driving both
//! - first-start superuser [`bootstrap`]

pub mod bootstrap;
pub mod indexer;
pub mod jobs;
pub mod runner;

pub use indexer::{IndexOutcome, IndexStats, Indexer};
pub use jobs::{LinkCleanup, ZipJobHandler};
pub use runner::{TickReport, WorkerRunner};
