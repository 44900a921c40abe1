use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info};

use crate::domain::services::TicketService;
use crate::shared::Result;

/// Background loop that reports overdue tickets.
pub struct OverdueMonitor {
    tickets: Arc<TicketService>,
    period: Duration,
}

impl OverdueMonitor {
    pub fn new(tickets: Arc<TicketService>, period: Duration) -> Self {
        Self {
            tickets,
            period: period.max(Duration::from_secs(1)),
        }
    }

    /// Spawn the scan loop. Dropping or aborting the handle stops it.
    pub fn start(self) -> JoinHandle<()> {
        info!("Starting overdue ticket monitor (every {:?})", self.period);
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = self.scan().await {
                error!("Overdue ticket scan failed: {}", e);
                sleep(self.period).await; // Back off on error
            }
        }
    }

    pub async fn scan(&self) -> Result<usize> {
        self.tickets.process_overdue(crate::shared::utils::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Ticket, TicketPriority};
    use crate::domain::services::notification_service::MockNotificationService;
    use crate::infrastructure::memory::MemoryStore;
    use chrono::{Duration as ChronoDuration, Utc};

    #[tokio::test]
    async fn scan_reports_overdue_tickets() {
        let store = MemoryStore::new();
        let repos = store.repositories();
        let ticket = Ticket::new(
            "org-1".to_string(),
            "cust-1".to_string(),
            "Late".to_string(),
            "Still broken".to_string(),
            TicketPriority::Normal,
            Some(Utc::now() - ChronoDuration::minutes(5)),
        );
        repos.tickets.add(&ticket).await.unwrap();

        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_ticket_overdue()
            .times(1)
            .returning(|_| Ok(()));
        let service = Arc::new(TicketService::new(
            repos.tickets.clone(),
            repos.users.clone(),
            Arc::new(notifications),
        ));

        let monitor = OverdueMonitor::new(service, Duration::from_secs(60));
        assert_eq!(monitor.scan().await.unwrap(), 1);
        assert_eq!(monitor.scan().await.unwrap(), 0);
    }
}
