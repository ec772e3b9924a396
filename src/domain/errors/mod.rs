// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod kind;
pub mod monitor;

pub use kind::ErrorKind;
pub use monitor::{ClassifiedError, ErrorMonitor, ErrorStats};
