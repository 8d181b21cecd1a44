//! Subject Locks
//!
//! user_id 単位の排他制御。複数ストアにまたがる操作を原子的に見せる。

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// user_id ごとの非同期ミューテックス
#[derive(Debug, Default)]
pub struct SubjectLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SubjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定ユーザーのロックを取得（解放はガードの drop 時）
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // 誰も保持していないロックを掃除する
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }

    /// 保持中のロック数
    pub async fn active(&self) -> usize {
        let locks = self.locks.lock().await;
        locks
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_subject_is_serialized() {
        let locks = Arc::new(SubjectLocks::new());
        let guard = locks.acquire("user123").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("user123").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_subjects_do_not_block() {
        let locks = SubjectLocks::new();
        let _a = locks.acquire("a").await;

        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = SubjectLocks::new();
        {
            let _guard = locks.acquire("a").await;
            assert_eq!(locks.active().await, 1);
        }
        let _guard = locks.acquire("b").await;
        assert_eq!(locks.active().await, 1);
        assert_eq!(locks.locks.lock().await.len(), 1);
    }
}
