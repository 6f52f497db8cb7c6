//! Cron-based scheduler for periodic forecast runs

use crate::core::runtime::ForecastRuntime;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Cron expression (with seconds field) firing exactly every `interval_seconds`.
///
/// A `*/N` step restarts at each enclosing unit, so it only keeps an even period
/// when N divides that unit. Intervals cron cannot express that way yield `None`.
pub fn cron_expression(interval_seconds: u64) -> Option<String> {
    match interval_seconds {
        0 => None,
        s if s < MINUTE => (MINUTE % s == 0).then(|| format!("*/{} * * * * *", s)),
        s if s < HOUR => {
            let minutes = s / MINUTE;
            (s % MINUTE == 0 && HOUR % s == 0).then(|| format!("0 */{} * * * *", minutes))
        }
        s if s < DAY => {
            let hours = s / HOUR;
            (s % HOUR == 0 && DAY % s == 0).then(|| format!("0 0 */{} * * *", hours))
        }
        DAY => Some("0 0 0 * * *".to_string()),
        _ => None,
    }
}

pub struct ForecastScheduler {
    runtime: Arc<ForecastRuntime>,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl ForecastScheduler {
    /// `interval_seconds` of 0 disables scheduling and is rejected.
    pub fn new(
        runtime: Arc<ForecastRuntime>,
        interval_seconds: u64,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if interval_seconds == 0 {
            return Err("Scheduler disabled: interval_seconds is 0".into());
        }

        let cron_expr = cron_expression(interval_seconds).ok_or_else(|| {
            format!(
                "Interval of {}s cannot be scheduled evenly; use a divisor of 60s, 1h or 24h",
                interval_seconds
            )
        })?;
        let schedule = Schedule::from_str(&cron_expr)
            .map_err(|e| format!("Invalid cron expression '{}': {}", cron_expr, e))?;

        info!(
            interval = interval_seconds,
            cron = %cron_expr,
            "ForecastScheduler: created with interval {}s (cron: {})",
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            runtime,
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    /// Spawn the schedule loop. A no-op while a loop is already running.
    pub async fn start(&self) {
        let mut current = self.handle.write().await;
        if current.is_some() {
            warn!("ForecastScheduler: already running, start ignored");
            return;
        }

        let runtime = self.runtime.clone();
        let schedule = self.schedule.clone();

        let handle = tokio::spawn(async move {
            info!("ForecastScheduler: started, waiting for cron schedule...");
            loop {
                match schedule.upcoming(chrono::Utc).next() {
                    Some(next_tick) => {
                        let now = chrono::Utc::now();
                        if next_tick > now {
                            let duration = (next_tick - now).to_std().unwrap_or_default();
                            tokio::time::sleep(duration).await;
                        }
                    }
                    None => {
                        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                        continue;
                    }
                }

                if let Err(e) = runtime.run_once(chrono::Utc::now()).await {
                    error!(error = %e, "ForecastScheduler: forecast run failed");
                }
            }
        });

        *current = Some(handle);
        info!("ForecastScheduler: started successfully");
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("ForecastScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.is_some()
    }
}
