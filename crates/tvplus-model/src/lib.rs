// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Data model of the Samsung TV Plus channel catalog (`.app.json`).

mod catalog;

pub use catalog::{
    AppCatalog, Channel, Region, ValidationError, CHANNEL_ID_PREFIX, REGION_CODE_MAX_LEN,
};

pub const CRATE_NAME: &str = "tvplus-model";
