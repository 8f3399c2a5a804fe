use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: usize = 50;
pub const DEFAULT_SUMMARY_EVERY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Rtt,
    Sign,
    Verify,
    Stanza,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Rtt, Metric::Sign, Metric::Verify, Metric::Stanza];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Rtt => "RTT(ms)",
            Metric::Sign => "SIGN(ms)",
            Metric::Verify => "VERIFY(ms)",
            Metric::Stanza => "STANZA(bytes)",
        }
    }

    fn index(&self) -> usize {
        match self {
            Metric::Rtt => 0,
            Metric::Sign => 1,
            Metric::Verify => 2,
            Metric::Stanza => 3,
        }
    }

    fn precision(&self) -> usize {
        match self {
            Metric::Stanza => 0,
            _ => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sample {
    pub rtt_ms: Option<f64>,
    pub sign_ms: Option<f64>,
    pub verify_ms: Option<f64>,
    pub stanza_bytes: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
}

#[derive(Debug, Clone)]
pub struct StatsWindow {
    capacity: usize,
    queues: [VecDeque<f64>; 4],
}

impl StatsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            queues: std::array::from_fn(|_| VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn add(&mut self, sample: Sample) {
        if let Some(value) = sample.rtt_ms {
            self.push(Metric::Rtt, value);
        }
        if let Some(value) = sample.sign_ms {
            self.push(Metric::Sign, value);
        }
        if let Some(value) = sample.verify_ms {
            self.push(Metric::Verify, value);
        }
        if let Some(value) = sample.stanza_bytes {
            self.push(Metric::Stanza, value as f64);
        }
    }

    pub fn push(&mut self, metric: Metric, value: f64) {
        let queue = &mut self.queues[metric.index()];
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    pub fn len(&self, metric: Metric) -> usize {
        self.queues[metric.index()].len()
    }

    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.queues[metric.index()].iter().copied().collect()
    }

    pub fn metric(&self, metric: Metric) -> Option<MetricSummary> {
        let queue = &self.queues[metric.index()];
        if queue.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = queue.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        Some(MetricSummary {
            count,
            mean,
            median: nearest_rank(&sorted, 0.5),
            p95: nearest_rank(&sorted, 0.95),
        })
    }

    pub fn summarize(&self) -> String {
        Metric::ALL
            .iter()
            .map(|metric| match self.metric(*metric) {
                Some(summary) => format!(
                    "{}: n={} mean={:.prec$} med={:.prec$} p95={:.prec$}",
                    metric.label(),
                    summary.count,
                    summary.mean,
                    summary.median,
                    summary.p95,
                    prec = metric.precision()
                ),
                None => format!("{}: n/a", metric.label()),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl Default for StatsWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let index = (quantile * (sorted.len() - 1) as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[derive(Debug, Clone)]
pub struct SummaryThrottle {
    every: Duration,
    last: Instant,
}

impl SummaryThrottle {
    pub fn new(every: Duration, start: Instant) -> Self {
        Self { every, last: start }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) < self.every {
            return false;
        }
        self.last = now;
        true
    }
}
