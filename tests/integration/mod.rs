// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod executor_flow_test;
pub mod http_surface_test;
pub mod helpers;
pub mod scheduler_test;
pub mod scrape_pipeline_test;
