//! # Monitoring Session Lifecycle Tests
//!
//! Exercises the lifecycle controller and the background sampling loop
//! against scripted samplers: aggregation of known reading sequences,
//! cooperative stop semantics, wall-clock self-termination, and the
//! one-active-session rule.

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::{Duration, Instant};

    use system_tracking::{
        MonitorConfig, MonitorError, MonitorResult, MonitorSession, Reading, ResourceMonitor,
        ResourceSampler, SessionState,
    };

    /// Sampler that replays a fixed sequence of readings, then fails every
    /// subsequent read (so exhausted scripts surface as skipped ticks)
    struct ScriptedSampler {
        readings: VecDeque<Reading>,
        cpus: usize,
    }

    impl ScriptedSampler {
        fn new(readings: &[(f64, f64)], cpus: usize) -> Self {
            Self {
                readings: readings
                    .iter()
                    .map(|&(memory_mib, cpu_percent)| Reading {
                        memory_mib,
                        cpu_percent,
                    })
                    .collect(),
                cpus,
            }
        }
    }

    impl ResourceSampler for ScriptedSampler {
        fn total_cpus(&self) -> usize {
            self.cpus
        }

        fn sample(&mut self) -> MonitorResult<Reading> {
            self.readings
                .pop_front()
                .ok_or_else(|| MonitorError::SampleRead("script exhausted".to_string()))
        }
    }

    /// Sampler that never runs out: memory grows by 1 MiB per tick
    struct CountingSampler {
        tick: u64,
        cpus: usize,
    }

    impl ResourceSampler for CountingSampler {
        fn total_cpus(&self) -> usize {
            self.cpus
        }

        fn sample(&mut self) -> MonitorResult<Reading> {
            self.tick += 1;
            Ok(Reading {
                memory_mib: self.tick as f64,
                cpu_percent: 50.0,
            })
        }
    }

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            max_duration_secs: 30.0,
            interval_secs: 0.002,
            ..MonitorConfig::default()
        }
    }

    /// Poll until the session's log holds at least `count` entries
    async fn wait_for_samples(session: &MonitorSession, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.snapshot().resource_logs.len() < count {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {} samples",
                count
            );
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn test_scripted_sequence_aggregates_expected_peaks() {
        let monitor = ResourceMonitor::new();
        let sampler = ScriptedSampler::new(&[(10.0, 10.0), (50.0, 80.0), (30.0, 40.0)], 4);
        let mut session = monitor
            .start_with_sampler(&fast_config(), sampler)
            .unwrap();

        wait_for_samples(&session, 3).await;
        let record = session.stop().await.unwrap();

        assert_eq!(record.resource_logs.len(), 3);
        assert_eq!(record.peak_memory_global, 50.0);
        assert_eq!(record.peak_cpu_global, 3.2); // 80% of 4 cores
        assert_eq!(record.total_cpus, 4);

        // Entries come back in chronological order
        let memories: Vec<f64> = record
            .resource_logs
            .values()
            .map(|s| s.current_memory)
            .collect();
        assert_eq!(memories, vec![10.0, 50.0, 30.0]);

        // Per-entry derived fields
        let usages: Vec<f64> = record
            .resource_logs
            .values()
            .map(|s| s.current_cpu_usage)
            .collect();
        assert_eq!(usages, vec![0.4, 3.2, 1.6]);
        assert!(record.resource_logs.values().all(|s| s.total_cpus == 4));
    }

    #[tokio::test]
    async fn test_exhausted_script_skips_ticks_without_corrupting_peaks() {
        let monitor = ResourceMonitor::new();
        let sampler = ScriptedSampler::new(&[(10.0, 10.0), (50.0, 80.0)], 4);
        let mut session = monitor
            .start_with_sampler(&fast_config(), sampler)
            .unwrap();

        wait_for_samples(&session, 2).await;
        // Let the loop run into the failing reads for a while
        tokio::time::sleep(Duration::from_millis(30)).await;
        let record = session.stop().await.unwrap();

        // Failed reads add no entries and never lower or zero the peaks
        assert_eq!(record.resource_logs.len(), 2);
        assert_eq!(record.peak_memory_global, 50.0);
        assert_eq!(record.peak_cpu_global, 3.2);
    }

    #[tokio::test]
    async fn test_stop_joins_before_returning() {
        // Repeated trials: no log entries may appear after stop() resolves
        for _ in 0..5 {
            let monitor = ResourceMonitor::new();
            let sampler = CountingSampler { tick: 0, cpus: 2 };
            let mut session = monitor
                .start_with_sampler(&fast_config(), sampler)
                .unwrap();

            wait_for_samples(&session, 3).await;
            let record = session.stop().await.unwrap();
            assert_eq!(session.state(), SessionState::Stopped);

            let len_at_stop = record.resource_logs.len();
            tokio::time::sleep(Duration::from_millis(25)).await;
            assert_eq!(session.snapshot().resource_logs.len(), len_at_stop);
            assert_eq!(session.snapshot(), record);
        }
    }

    /// Sampler that yields a few good readings, then panics
    struct FaultySampler {
        remaining: u32,
        cpus: usize,
    }

    impl ResourceSampler for FaultySampler {
        fn total_cpus(&self) -> usize {
            self.cpus
        }

        fn sample(&mut self) -> MonitorResult<Reading> {
            if self.remaining == 0 {
                panic!("sensor backend exploded");
            }
            self.remaining -= 1;
            Ok(Reading {
                memory_mib: 25.0,
                cpu_percent: 50.0,
            })
        }
    }

    #[tokio::test]
    async fn test_panicking_sampler_terminates_session_with_partial_data() {
        let monitor = ResourceMonitor::new();
        let sampler = FaultySampler {
            remaining: 2,
            cpus: 4,
        };
        let mut session = monitor
            .start_with_sampler(&fast_config(), sampler)
            .unwrap();

        // The panic on the third tick must terminate the session on its own
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.is_running() {
            assert!(
                Instant::now() < deadline,
                "session never left Running after sampler panic"
            );
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(session.state(), SessionState::Stopped);

        // Partial data from the good ticks survives and stop() still resolves
        let record = session.stop().await.unwrap();
        assert_eq!(record.resource_logs.len(), 2);
        assert_eq!(record.peak_memory_global, 25.0);
        assert_eq!(record.peak_cpu_global, 2.0); // 50% of 4 cores
        assert!(record.total_time > 0.0);

        // The monitor is not wedged: a new session can start
        let mut next = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 2 })
            .unwrap();
        next.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_self_terminates_at_timeout() {
        let config = MonitorConfig {
            max_duration_secs: 0.01,
            interval_secs: 0.01,
            ..MonitorConfig::default()
        };
        let monitor = ResourceMonitor::new();
        let sampler = CountingSampler { tick: 0, cpus: 2 };
        let mut session = monitor.start_with_sampler(&config, sampler).unwrap();

        // No explicit stop: the wall-clock bound terminates the session
        let record = session.wait().await.unwrap();

        assert_eq!(session.state(), SessionState::TimedOut);
        assert!(record.total_time >= 0.01);
    }

    #[tokio::test]
    async fn test_second_start_fails_while_session_active() {
        let monitor = ResourceMonitor::new();
        let mut session = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 2 })
            .unwrap();

        let second = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 2 });
        assert!(matches!(second, Err(MonitorError::SessionAlreadyActive)));

        // After the first session terminates, the monitor is idle again
        session.stop().await.unwrap();
        let third = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 2 });
        assert!(third.is_ok());
        third.unwrap().stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_at_start() {
        let config = MonitorConfig {
            max_duration_secs: 0.0,
            ..MonitorConfig::default()
        };
        let monitor = ResourceMonitor::new();
        let result = monitor.start_with_sampler(&config, CountingSampler { tick: 0, cpus: 2 });
        assert!(matches!(result, Err(MonitorError::Config(_))));

        // A rejected start leaves the monitor idle
        let mut session = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 2 })
            .unwrap();
        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_is_readable_while_running() {
        let monitor = ResourceMonitor::new();
        let mut session = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 8 })
            .unwrap();

        wait_for_samples(&session, 2).await;
        assert!(session.is_running());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.total_cpus, 8);
        assert!(snapshot.peak_memory_global >= 1.0);
        // 50% of 8 cores
        assert_eq!(snapshot.peak_cpu_global, 4.0);
        assert!(snapshot.total_time >= 0.0);

        session.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_total_cpus_constant_across_session() {
        let monitor = ResourceMonitor::new();
        let mut session = monitor
            .start_with_sampler(&fast_config(), CountingSampler { tick: 0, cpus: 16 })
            .unwrap();

        wait_for_samples(&session, 10).await;
        let record = session.stop().await.unwrap();

        assert_eq!(record.total_cpus, 16);
        assert!(record.resource_logs.values().all(|s| s.total_cpus == 16));
    }

    #[tokio::test]
    async fn test_real_sampler_session_end_to_end() {
        // Smoke test with the sysinfo-backed sampler
        let config = MonitorConfig {
            max_duration_secs: 30.0,
            interval_secs: 0.01,
            ..MonitorConfig::default()
        };
        let monitor = ResourceMonitor::new();
        let mut session = monitor.start(&config).unwrap();

        wait_for_samples(&session, 2).await;
        let record = session.stop().await.unwrap();

        assert!(record.total_cpus > 0);
        // The test binary itself is resident in memory
        assert!(record.peak_memory_global > 0.0);
        assert!(record
            .resource_logs
            .values()
            .all(|s| s.current_memory <= record.peak_memory_global));
    }
}
