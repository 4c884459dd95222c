//! Collection statistics for the dashboard cards

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Record, StatusKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total: usize,
    /// Status name -> count; every status is present, possibly zero
    pub by_status: BTreeMap<String, usize>,
    pub new_last_7_days: usize,
    pub new_last_30_days: usize,
}

impl CollectionStats {
    pub fn count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }
}

pub fn compute_stats<T: Record>(items: &[T], now: DateTime<Utc>) -> CollectionStats {
    let mut by_status: BTreeMap<String, usize> = T::Status::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), 0))
        .collect();
    for item in items {
        *by_status.entry(item.status().as_str().to_string()).or_insert(0) += 1;
    }

    let since = |days: i64| {
        let cutoff = now - Duration::days(days);
        items
            .iter()
            .filter(|i| i.created_at().is_some_and(|at| at > cutoff && at <= now))
            .count()
    };

    CollectionStats {
        total: items.len(),
        by_status,
        new_last_7_days: since(7),
        new_last_30_days: since(30),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Subscriber, SubscriberStatus};

    #[test]
    fn test_compute_stats() {
        let now = Utc::now();
        let mut items = Vec::new();
        for (i, days_ago) in [1, 3, 10, 40].iter().enumerate() {
            let mut s = Subscriber::new(&i.to_string(), &format!("s{}@example.com", i), "footer");
            s.created_at = Some(now - Duration::days(*days_ago));
            items.push(s);
        }
        items[3].status = SubscriberStatus::Unsubscribed;
        items.push(Subscriber::new("9", "old@example.com", "import"));

        let stats = compute_stats(&items, now);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.count("active"), 4);
        assert_eq!(stats.count("unsubscribed"), 1);
        assert_eq!(stats.count("bounced"), 0);
        assert_eq!(stats.new_last_7_days, 2);
        assert_eq!(stats.new_last_30_days, 3);
    }
}
