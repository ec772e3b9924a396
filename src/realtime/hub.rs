// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 进程内发布/订阅中心
///
/// 按字符串主题划分的广播通道，向SSE端点和监控器推送事件。
/// 主题是不透明字符串，中心不关心负载内容。
#[derive(Clone)]
pub struct EventHub {
    channels: Arc<DashMap<String, broadcast::Sender<serde_json::Value>>>,
    capacity: usize,
}

impl EventHub {
    /// 创建默认容量（每通道256条）的中心
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity,
        }
    }

    /// 向主题发布一个JSON值，无订阅者时为空操作
    pub fn publish(&self, topic: &str, value: serde_json::Value) {
        if let Some(tx) = self.channels.get(topic) {
            // 没有活跃接收者时发送失败是正常情况
            let _ = tx.send(value);
        }
    }

    /// 订阅主题，通道不存在时创建
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        self.channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// 清理没有订阅者的通道
    pub fn cleanup(&self) {
        self.channels.retain(|_, tx| tx.receiver_count() > 0);
    }

    /// 当前通道数量
    pub fn topic_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_subscribe_roundtrip() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe("job:abc");

        let value = serde_json::json!({"phase": "started"});
        hub.publish("job:abc", value.clone());

        assert_eq!(rx.recv().await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let hub = EventHub::new();
        hub.publish("nobody:listening", serde_json::json!({"data": "dropped"}));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let hub = EventHub::new();
        let mut rx1 = hub.subscribe("multi");
        let mut rx2 = hub.subscribe("multi");

        let value = serde_json::json!({"n": 1});
        hub.publish("multi", value.clone());

        assert_eq!(rx1.recv().await.unwrap(), value);
        assert_eq!(rx2.recv().await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_cleanup_removes_empty_channels() {
        let hub = EventHub::new();
        let rx = hub.subscribe("ephemeral");
        assert_eq!(hub.topic_count(), 1);

        drop(rx);
        hub.cleanup();
        assert_eq!(hub.topic_count(), 0);
    }
}
