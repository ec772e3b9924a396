// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 调度频率枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    /// 手动触发，调度器不生成执行
    #[default]
    Manual,
    /// 每小时
    Hourly,
    /// 每天
    Daily,
    /// 每周
    Weekly,
    /// 每月
    Monthly,
    /// 自定义间隔（小时）
    Custom,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frequency::Manual => write!(f, "manual"),
            Frequency::Hourly => write!(f, "hourly"),
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Custom => write!(f, "custom"),
        }
    }
}

/// 调度配置
///
/// 频率加可选的时刻、星期集合和自定义间隔。时区为IANA名称字符串，
/// 解析失败时回退到UTC。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// 调度频率
    pub frequency: Frequency,
    /// 每天的执行时刻（daily/weekly/monthly使用）
    pub time_of_day: Option<NaiveTime>,
    /// 星期集合，0=周一..6=周日（weekly使用）
    pub weekdays: Option<Vec<u8>>,
    /// 自定义间隔小时数（custom使用）
    pub interval_hours: Option<u32>,
    /// IANA时区名称
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::Manual,
            time_of_day: None,
            weekdays: None,
            interval_hours: None,
            timezone: "UTC".to_string(),
        }
    }
}

impl ScheduleConfig {
    fn tz(&self) -> Tz {
        Tz::from_str(&self.timezone).unwrap_or(chrono_tz::UTC)
    }

    fn weekday_index(day: Weekday) -> u8 {
        day.num_days_from_monday() as u8
    }

    /// 计算下一次执行时间
    ///
    /// # 参数
    ///
    /// * `after` - 基准时间，返回值严格大于此时间
    ///
    /// # 返回值
    ///
    /// * `Some(DateTime<Utc>)` - 下一次执行时间
    /// * `None` - 手动频率或配置不完整
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.frequency {
            Frequency::Manual => None,
            Frequency::Hourly => Some(after + Duration::hours(1)),
            Frequency::Custom => {
                let hours = self.interval_hours?;
                if hours == 0 {
                    return None;
                }
                Some(after + Duration::hours(i64::from(hours)))
            }
            Frequency::Daily => {
                let time = self.time_of_day.unwrap_or_default();
                let tz = self.tz();
                let local = after.with_timezone(&tz);
                let mut candidate_date = local.date_naive();
                if local.time() >= time {
                    candidate_date = candidate_date.succ_opt()?;
                }
                self.resolve_local(candidate_date.and_time(time))
            }
            Frequency::Weekly => {
                let time = self.time_of_day.unwrap_or_default();
                let days = self.weekdays.clone().filter(|d| !d.is_empty())?;
                let tz = self.tz();
                let local = after.with_timezone(&tz);
                // 最多向前看14天，必定命中集合中的某一天
                for offset in 0..14 {
                    let date = local.date_naive() + Duration::days(offset);
                    let candidate = date.and_time(time);
                    if offset == 0 && local.time() >= time {
                        continue;
                    }
                    if days.contains(&Self::weekday_index(date.weekday())) {
                        return self.resolve_local(candidate);
                    }
                }
                None
            }
            Frequency::Monthly => {
                let time = self.time_of_day.unwrap_or_default();
                let tz = self.tz();
                let local = after.with_timezone(&tz);
                let next = local
                    .date_naive()
                    .checked_add_months(chrono::Months::new(1))?;
                self.resolve_local(next.and_time(time))
            }
        }
    }

    fn resolve_local(&self, naive: chrono::NaiveDateTime) -> Option<DateTime<Utc>> {
        // DST跳变时取较早的有效解释
        self.tz()
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
