use serde::Serialize;

use crate::error::Result;

pub trait MetricsRow: Serialize + Send {
    const HEADER: &'static [&'static str];
}

pub trait MetricsSink<R: MetricsRow>: Send {
    fn record(&mut self, row: &R) -> Result<()>;
}
