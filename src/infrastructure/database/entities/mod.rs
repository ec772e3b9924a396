// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod ai_session;
pub mod api_key;
pub mod job;
pub mod job_result;
pub mod notification;
pub mod notification_setting;
pub mod price_history;
pub mod product;
pub mod website;
