//! End-to-end tests driving the qmlbridge binary against on-disk projects.

mod build_tests;
mod common;
mod modules_tests;
