#[cfg(test)]
mod tests {
    use handoff_pool::{
        errors::PoolError,
        pool::{Config, ThreadPool},
    };
    use crossbeam::sync::WaitGroup;
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::{Duration, Instant},
    };

    fn measure<F, T>(name: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let result = f();
        println!("✓ {}: {:?}", name, start.elapsed());
        result
    }

    fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    /// Submits until accepted, counting saturation rejections along the way.
    fn submit_with_retry<F>(pool: &ThreadPool, rejected: &AtomicUsize, f: F) -> bool
    where
        F: FnOnce() + Send + Clone + 'static,
    {
        loop {
            match pool.execute(f.clone()) {
                Ok(()) => return true,
                Err(PoolError::Saturated { .. }) => {
                    rejected.fetch_add(1, Ordering::Relaxed);
                    thread::sleep(Duration::from_micros(200));
                }
                Err(PoolError::ShutDown) => return false,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    /// Samples the pool and records any broken size invariant.
    fn spawn_sampler(pool: Arc<ThreadPool>, stop: Arc<AtomicBool>) -> thread::JoinHandle<usize> {
        thread::spawn(move || {
            let mut violations = 0;
            let max = pool.max_pool_size();
            let core = pool.core_pool_size();
            while !stop.load(Ordering::Relaxed) {
                // A worker spawned mid-sample may be busy before it is listed,
                // so compare against the larger of two roster reads.
                let before = pool.roster_len();
                let assigned = pool.assigned_thread_count();
                let roster = before.max(pool.roster_len());
                if assigned > roster
                    || assigned > max
                    || pool.active_thread_count() > max
                    || roster > max
                    || pool.core_worker_count() != core
                {
                    violations += 1;
                }
                thread::sleep(Duration::from_millis(1));
            }
            violations
        })
    }

    #[test]
    fn load_test_1_many_submitters() {
        println!("\n=== LOAD TEST 1: 8 отправителей x 250 коротких задач ===");
        let cfg = Config::new(4, 8)
            .with_monitor_interval(Duration::from_millis(10))
            .with_idle_wait(Duration::from_millis(10));
        let pool = Arc::new(ThreadPool::with_config(cfg).unwrap());
        let executed = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));
        let stop = Arc::new(AtomicBool::new(false));
        let sampler = spawn_sampler(pool.clone(), stop.clone());

        measure("2000 tasks @ 100μs", || {
            let submitters: Vec<_> = (0..8)
                .map(|_| {
                    let pool = pool.clone();
                    let executed = executed.clone();
                    let accepted = accepted.clone();
                    let rejected = rejected.clone();
                    thread::spawn(move || {
                        for _ in 0..250 {
                            let executed = executed.clone();
                            let task = move || {
                                thread::sleep(Duration::from_micros(100));
                                executed.fetch_add(1, Ordering::SeqCst);
                            };
                            if submit_with_retry(&pool, &rejected, task) {
                                accepted.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                    })
                })
                .collect();
            for s in submitters {
                s.join().unwrap();
            }
            assert!(wait_until(Duration::from_secs(10), || {
                executed.load(Ordering::SeqCst) == accepted.load(Ordering::SeqCst)
            }));
        });

        stop.store(true, Ordering::Relaxed);
        assert_eq!(sampler.join().unwrap(), 0, "size invariant violated");
        assert_eq!(accepted.load(Ordering::SeqCst), 2000);

        assert!(wait_until(Duration::from_secs(2), || pool.metrics().completed_tasks == 2000));
        let m = pool.metrics();
        println!("  Завершено: {}", m.completed_tasks);
        println!("  Отклонено (с повтором): {}", rejected.load(Ordering::Relaxed));
        assert_eq!(m.completed_tasks, 2000);
        assert_eq!(m.rejected_tasks, rejected.load(Ordering::Relaxed));
    }

    #[test]
    fn load_test_2_repeated_bursts() {
        println!("\n=== LOAD TEST 2: всплески нагрузки с паузами ===");
        let cfg = Config::new(2, 6)
            .with_monitor_interval(Duration::from_millis(10))
            .with_idle_wait(Duration::from_millis(10));
        let pool = ThreadPool::with_config(cfg).unwrap();
        let rejected = AtomicUsize::new(0);

        for round in 0..3 {
            let wg = WaitGroup::new();
            measure(&format!("burst {round}"), || {
                for _ in 0..12 {
                    let wg = wg.clone();
                    let task = move || {
                        thread::sleep(Duration::from_millis(20));
                        drop(wg);
                    };
                    assert!(submit_with_retry(&pool, &rejected, task));
                }
            });
            assert!(pool.roster_len() <= 6);
            wg.wait();

            assert!(
                wait_until(Duration::from_secs(2), || {
                    pool.roster_len() == 2 && pool.active_thread_count() == 2
                }),
                "roster did not shrink back after burst {round}"
            );
        }
        println!("  ✓ ростер возвращался к размеру ядра после каждого всплеска");
    }

    #[test]
    fn load_test_3_shutdown_under_load() {
        println!("\n=== LOAD TEST 3: shutdown под нагрузкой ===");
        let cfg = Config::new(3, 6)
            .with_monitor_interval(Duration::from_millis(10))
            .with_idle_wait(Duration::from_millis(10));
        let pool = Arc::new(ThreadPool::with_config(cfg).unwrap());
        let executed = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));

        let submitters: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                let executed = executed.clone();
                let accepted = accepted.clone();
                let rejected = rejected.clone();
                thread::spawn(move || loop {
                    let executed = executed.clone();
                    let task = move || {
                        thread::sleep(Duration::from_millis(1));
                        executed.fetch_add(1, Ordering::SeqCst);
                    };
                    if !submit_with_retry(&pool, &rejected, task) {
                        break;
                    }
                    accepted.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(100));
        pool.shutdown();
        for s in submitters {
            s.join().unwrap();
        }

        assert!(measure("termination", || pool.await_termination(Duration::from_secs(5))));
        assert_eq!(pool.active_thread_count(), 0);
        assert_eq!(
            executed.load(Ordering::SeqCst),
            accepted.load(Ordering::SeqCst),
            "every accepted task runs exactly once"
        );
        println!("  Принято до shutdown: {}", accepted.load(Ordering::SeqCst));
    }
}
