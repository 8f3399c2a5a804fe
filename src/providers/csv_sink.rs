use std::fs::{self, File};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{PqcBenchError, Result};
use crate::interfaces::sink::{MetricsRow, MetricsSink};

pub struct CsvSink<R> {
    writer: csv::Writer<File>,
    _row: PhantomData<fn(R)>,
}

impl<R: MetricsRow> CsvSink<R> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path.as_ref())?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(R::HEADER)
            .map_err(|e| PqcBenchError::Io(e.to_string()))?;
        writer.flush()?;
        Ok(Self {
            writer,
            _row: PhantomData,
        })
    }
}

impl<R: MetricsRow> MetricsSink<R> for CsvSink<R> {
    fn record(&mut self, row: &R) -> Result<()> {
        self.writer
            .serialize(row)
            .map_err(|e| PqcBenchError::Serialization(e.to_string()))?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemorySink<R> {
    rows: Arc<Mutex<Vec<R>>>,
}

impl<R: MetricsRow + Clone> MemorySink<R> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn rows(&self) -> Vec<R> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

impl<R: MetricsRow + Clone> Default for MemorySink<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: MetricsRow + Clone> MetricsSink<R> for MemorySink<R> {
    fn record(&mut self, row: &R) -> Result<()> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| PqcBenchError::Runtime("metrics sink locked".to_string()))?;
        rows.push(row.clone());
        Ok(())
    }
}
