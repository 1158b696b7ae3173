use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

pub struct Metrics {
    latency: Mutex<Histogram<u64>>, // micros
    started: Instant,
    counters: Mutex<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: u64,
    rejected: u64,
    failed: u64,
    predictions: BTreeMap<String, u64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            latency: Mutex::new(
                Histogram::new(3).expect("3 significant figures is a valid precision"),
            ),
            started: Instant::now(),
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn observe_prediction(&self, label: &str, dur: Duration) {
        let _ = self.latency.lock().record(dur.as_micros() as u64);
        let mut c = self.counters.lock();
        c.requests += 1;
        *c.predictions.entry(label.to_string()).or_insert(0) += 1;
    }

    pub fn observe_rejection(&self) {
        let mut c = self.counters.lock();
        c.requests += 1;
        c.rejected += 1;
    }

    pub fn observe_failure(&self) {
        let mut c = self.counters.lock();
        c.requests += 1;
        c.failed += 1;
    }

    pub fn total_requests(&self) -> u64 {
        self.counters.lock().requests
    }

    pub fn format(&self) -> String {
        let (p50, p95, p99) = {
            let h = self.latency.lock();
            (
                h.value_at_quantile(0.50) as f64 / 1000.0,
                h.value_at_quantile(0.95) as f64 / 1000.0,
                h.value_at_quantile(0.99) as f64 / 1000.0,
            )
        };

        let c = self.counters.lock();
        let elapsed = self.started.elapsed().as_secs_f64().max(1.0);
        let qps = c.requests as f64 / elapsed;

        let mut out = format!(
            "requests_total {}\nrejected_total {}\nfailed_total {}\nqps {:.2}\n",
            c.requests, c.rejected, c.failed, qps
        );
        out.push_str(&format!(
            "p50_ms {:.3}\np95_ms {:.3}\np99_ms {:.3}\n",
            p50, p95, p99
        ));
        for (label, count) in &c.predictions {
            out.push_str(&format!("predictions_total{{label=\"{}\"}} {}\n", label, count));
        }
        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
