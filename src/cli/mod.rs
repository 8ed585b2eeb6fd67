//! CLI command handlers

pub mod commands;

pub use commands::{
    delete_product, export, import, kinds, migrate, seed_demo, show, store_order, store_product,
    store_purchase,
};
