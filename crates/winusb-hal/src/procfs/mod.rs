//! Parsers for `/proc` files.

pub mod mountinfo;
