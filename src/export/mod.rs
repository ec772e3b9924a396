// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::domain::models::job::Job;
use crate::domain::models::job_result::JobResult;

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// 把任务的结果集导出为CSV
///
/// 固定列在前（结果元数据），数据列按所有结果中出现过的
/// 键名排序。N条结果产生表头加N行数据；单元格中的逗号、
/// 引号和换行按RFC 4180规则转义。
pub fn results_to_csv(results: &[JobResult]) -> String {
    let mut data_keys: BTreeSet<String> = BTreeSet::new();
    for result in results {
        if let Some(obj) = result.data.as_object() {
            for key in obj.keys() {
                data_keys.insert(key.clone());
            }
        }
    }

    let mut header: Vec<String> = vec![
        "result_id".to_string(),
        "status".to_string(),
        "scraped_at".to_string(),
        "duration_ms".to_string(),
        "error_message".to_string(),
    ];
    header.extend(data_keys.iter().cloned());

    let mut out = String::new();
    out.push_str(&join_row(&header));
    out.push('\n');

    for result in results {
        let mut row: Vec<String> = vec![
            result.id.to_string(),
            result.status.to_string(),
            result.scraped_at.to_rfc3339(),
            result.duration_ms.to_string(),
            result.error_message.clone().unwrap_or_default(),
        ];
        let obj = result.data.as_object();
        for key in &data_keys {
            let cell = obj
                .and_then(|o| o.get(key))
                .map(value_to_cell)
                .unwrap_or_default();
            row.push(cell);
        }
        out.push_str(&join_row(&row));
        out.push('\n');
    }

    out
}

/// 把任务的结果集导出为带元数据信封的JSON
pub fn results_to_json(job: &Job, results: &[JobResult]) -> Value {
    json!({
        "meta": {
            "job_id": job.id,
            "job_name": job.name,
            "url": job.url,
            "scrape_type": job.scrape_type.to_string(),
            "exported_at": Utc::now().to_rfc3339(),
            "result_count": results.len(),
        },
        "results": results,
    })
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn join_row(cells: &[String]) -> String {
    cells
        .iter()
        .map(|c| escape_cell(c))
        .collect::<Vec<_>>()
        .join(",")
}

/// CSV单元格转义
///
/// 包含逗号、双引号或换行的单元格用双引号包裹，
/// 内部双引号翻倍。
fn escape_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// 解析一行CSV（测试与往返校验用）
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == ',' {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    cells.push(current);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::job::ScrapeType;
    use crate::domain::services::ai_client::TokenUsage;
    use uuid::Uuid;

    fn result_with(data: Value) -> JobResult {
        JobResult::success(Uuid::new_v4(), data, 120, TokenUsage::default())
    }

    #[test]
    fn test_csv_has_header_plus_n_rows() {
        let results = vec![
            result_with(json!({"price": 19.99, "currency": "USD"})),
            result_with(json!({"price": 18.50, "currency": "USD"})),
            result_with(json!({"price": 17.00})),
        ];
        let csv = results_to_csv(&results);
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("currency"));
        assert!(lines[0].contains("price"));
    }

    #[test]
    fn test_csv_cells_with_commas_and_quotes_survive() {
        let tricky = "He said \"hi\", twice";
        let results = vec![result_with(json!({"note": tricky}))];
        let csv = results_to_csv(&results);
        let lines: Vec<&str> = csv.trim_end().lines().collect();

        let header = parse_csv_line(lines[0]);
        let row = parse_csv_line(lines[1]);
        assert_eq!(header.len(), row.len());

        let note_idx = header.iter().position(|h| h == "note").unwrap();
        assert_eq!(row[note_idx], tricky);
    }

    #[test]
    fn test_csv_newline_in_cell_is_quoted() {
        assert_eq!(escape_cell("a\nb"), "\"a\nb\"");
        assert_eq!(escape_cell("plain"), "plain");
    }

    #[test]
    fn test_missing_keys_render_empty_cells() {
        let results = vec![
            result_with(json!({"a": 1, "b": 2})),
            result_with(json!({"a": 3})),
        ];
        let csv = results_to_csv(&results);
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        let header = parse_csv_line(lines[0]);
        let second = parse_csv_line(lines[2]);
        let b_idx = header.iter().position(|h| h == "b").unwrap();
        assert_eq!(second[b_idx], "");
    }

    #[test]
    fn test_json_envelope_has_meta_and_rows() {
        let job = Job::new(
            Uuid::new_v4(),
            "Price watch".to_string(),
            "https://example.com".to_string(),
            ScrapeType::Price,
        );
        let results = vec![result_with(json!({"price": 9.99}))];
        let envelope = results_to_json(&job, &results);

        assert_eq!(envelope["meta"]["job_name"], json!("Price watch"));
        assert_eq!(envelope["meta"]["result_count"], json!(1));
        assert_eq!(envelope["results"][0]["data"]["price"], json!(9.99));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::from_str_opt("csv"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_str_opt("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_str_opt("xml"), None);
    }
}
