/*!
 * Keep-Alive Loop
 * Wakes every interval, lists paired devices and reconnects the dropped ones
 */

use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::DeviceManager;
use crate::error::{Error, Result};

/// Outcome of one Checking pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub devices: usize,
    pub attempted: usize,
    pub failed: usize,
}

/// Queries the manager once and reconnects every disconnected device, in the
/// order they were reported. A failed reconnect does not stop the pass.
pub async fn check_once<M>(manager: &M) -> Result<CycleReport>
where
    M: DeviceManager + ?Sized,
{
    let devices = manager.devices().await?;
    let mut report = CycleReport {
        devices: devices.len(),
        ..Default::default()
    };

    for device in devices.iter().filter(|d| d.needs_reconnect()) {
        report.attempted += 1;
        info!("{} is disconnected, reconnecting", device);
        if let Err(e) = manager.connect(device).await {
            report.failed += 1;
            warn!("Reconnect of {} failed: {}", device, e);
        }
    }

    Ok(report)
}

/// Polls until `shutdown` fires. The first check happens one full `period`
/// after entry; cancellation wins over a tick that is ready at the same time.
pub async fn run<M>(manager: &M, shutdown: &CancellationToken, period: Duration) -> Result<()>
where
    M: DeviceManager + ?Sized,
{
    if period.is_zero() {
        return Err(Error::Config("poll interval must be greater than zero".into()));
    }

    let first = Instant::now()
        .checked_add(period)
        .ok_or_else(|| Error::Config(format!("poll interval {:?} is too large", period)))?;
    let mut ticker = interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Keep-alive loop started ({} backend, every {:?})", manager.name(), period);

    let mut cycle: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Keep-alive loop stopped after {} cycles", cycle);
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        cycle += 1;
        match check_once(manager).await {
            Ok(report) => debug!(
                "Cycle {}: {} devices, {} reconnects attempted, {} failed",
                cycle, report.devices, report.attempted, report.failed
            ),
            Err(e) if e.is_transient() => warn!("Cycle {}: device query failed, skipping: {}", cycle, e),
            Err(e) => error!("Cycle {}: {}", cycle, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ConnectionStatus, Device};
    use crate::manager::testing::{Call, ScriptedManager};
    use std::sync::Arc;
    use tokio::time::sleep;

    fn spawn_loop(
        manager: Arc<ScriptedManager>,
        period: Duration,
    ) -> (CancellationToken, tokio::task::JoinHandle<Result<()>>) {
        let token = CancellationToken::new();
        let shutdown = token.clone();
        let handle = tokio::spawn(async move { run(manager.as_ref(), &shutdown, period).await });
        (token, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_cancel_makes_no_calls() {
        for secs in [1, 5, 60, 3600] {
            let manager = Arc::new(ScriptedManager::new(vec![Ok(vec![Device::new(
                "spk1",
                ConnectionStatus::Disconnected,
            )])]));
            let token = CancellationToken::new();
            token.cancel();

            run(manager.as_ref(), &token, Duration::from_secs(secs))
                .await
                .unwrap();
            assert!(manager.calls().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_rejected() {
        let manager = ScriptedManager::new(vec![]);
        let token = CancellationToken::new();
        let result = run(&manager, &token, Duration::ZERO).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(manager.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflowing_interval_is_rejected() {
        let manager = ScriptedManager::new(vec![]);
        let token = CancellationToken::new();
        let result = run(&manager, &token, Duration::from_secs(u64::MAX)).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(manager.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reconnects_only_disconnected_in_order() {
        let manager = ScriptedManager::new(vec![Ok(vec![
            Device::new("a", ConnectionStatus::Disconnected),
            Device::new("b", ConnectionStatus::Connected),
            Device::new("c", ConnectionStatus::Disconnected),
            Device::new("d", ConnectionStatus::Unknown),
        ])]);

        let report = check_once(&manager).await.unwrap();

        assert_eq!(manager.connected_ids(), vec!["a", "c"]);
        assert_eq!(
            report,
            CycleReport {
                devices: 4,
                attempted: 2,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_failed_reconnect_does_not_skip_next_device() {
        let manager = ScriptedManager::new(vec![Ok(vec![
            Device::new("a", ConnectionStatus::Disconnected),
            Device::new("b", ConnectionStatus::Disconnected),
        ])])
        .failing_connect("a");

        let report = check_once(&manager).await.unwrap();

        assert_eq!(manager.connected_ids(), vec!["a", "b"]);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_returned_without_connecting() {
        let manager = ScriptedManager::new(vec![Err(ScriptedManager::query_error())]);
        assert!(check_once(&manager).await.is_err());
        assert!(manager.connected_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_tick_reconnects_once_then_stops() {
        let manager = Arc::new(ScriptedManager::new(vec![Ok(vec![Device::new(
            "spk1",
            ConnectionStatus::Disconnected,
        )])]));
        let (token, handle) = spawn_loop(manager.clone(), Duration::from_secs(1));

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(manager.connected_ids(), vec!["spk1"]);

        token.cancel();
        handle.await.unwrap().unwrap();

        sleep(Duration::from_secs(10)).await;
        assert_eq!(manager.connected_ids(), vec!["spk1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_failure_does_not_stop_next_cycle() {
        let manager = Arc::new(ScriptedManager::new(vec![
            Err(ScriptedManager::query_error()),
            Ok(vec![Device::new("spk1", ConnectionStatus::Connected)]),
        ]));
        let (token, handle) = spawn_loop(manager.clone(), Duration::from_secs(1));

        sleep(Duration::from_millis(2500)).await;
        token.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(
            manager.calls(),
            vec![Call::Devices { ok: false }, Call::Devices { ok: true }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_check_before_first_interval() {
        let manager = Arc::new(ScriptedManager::new(vec![]));
        let (token, handle) = spawn_loop(manager.clone(), Duration::from_secs(5));

        sleep(Duration::from_millis(4900)).await;
        assert!(manager.calls().is_empty());

        sleep(Duration::from_millis(200)).await;
        assert_eq!(manager.calls(), vec![Call::Devices { ok: true }]);

        token.cancel();
        handle.await.unwrap().unwrap();
    }
}
