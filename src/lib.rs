//! Back-office client for the Rose Candle Co. REST API
//!
//! Every resource screen is driven by one generic
//! [`ResourceListController`](controller::ResourceListController) talking to
//! the API through the [`ResourceApi`](api::ResourceApi) trait.

pub mod api;
pub mod browse;
pub mod cli;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod notify;
pub mod output;
pub mod profile;
pub mod schema;
pub mod screens;
pub mod validation;

#[cfg(test)]
mod testing;
