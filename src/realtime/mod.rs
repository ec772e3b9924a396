// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod events;
pub mod hub;
pub mod monitor;

pub use events::{ExecutionEvent, ExecutionPhase, ProgressEvent};
pub use hub::EventHub;
pub use monitor::{ConnectionStatus, RealtimeMonitor};
