//! Two threads hammering one gate must never be inside the sensor together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use soil_core::{Calibration, SensorGate};
use soil_traits::{MoistureSensor, RawSample};

#[derive(Default)]
struct Probe {
    inside: AtomicBool,
    overlaps: AtomicUsize,
    reads: AtomicUsize,
}

/// Sensor that flags any overlapping entry.
struct SingleEntrySensor {
    probe: Arc<Probe>,
}

impl MoistureSensor for SingleEntrySensor {
    fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        if self.probe.inside.swap(true, Ordering::SeqCst) {
            self.probe.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_micros(500));
        let n = self.probe.reads.fetch_add(1, Ordering::SeqCst);
        self.probe.inside.store(false, Ordering::SeqCst);
        if n % 7 == 3 {
            return Err("transient nack".into());
        }
        Ok(13750)
    }
}

#[test]
fn concurrent_reads_are_serialized() {
    let probe = Arc::new(Probe::default());
    let gate = Arc::new(SensorGate::new(
        SingleEntrySensor {
            probe: probe.clone(),
        },
        Calibration::default(),
    ));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let gate = gate.clone();
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let _ = gate.read_moisture();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(probe.reads.load(Ordering::SeqCst), 100);
    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn gate_recovers_after_reader_panics() {
    struct PanicOnce {
        panicked: bool,
    }
    impl MoistureSensor for PanicOnce {
        fn read(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
            if !self.panicked {
                self.panicked = true;
                panic!("driver bug");
            }
            Ok(8500)
        }
    }

    let gate = Arc::new(SensorGate::new(
        PanicOnce { panicked: false },
        Calibration::default(),
    ));
    let g = gate.clone();
    let crashed = std::thread::spawn(move || {
        let _ = g.read_moisture();
    })
    .join();
    assert!(crashed.is_err());

    let level = gate.read_moisture().expect("gate usable after poison");
    assert!((level.value() - 1.0).abs() < 1e-12);
}
