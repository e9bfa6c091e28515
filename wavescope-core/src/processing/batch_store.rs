use crate::models::batch::PcmBatch;

/// Growing accumulator for captured PCM batches.
///
/// Keeps batches in arrival order for stop-time concatenation and serves
/// clipped window reads over the logical sample axis without copying the
/// whole take.
#[derive(Debug, Default)]
pub struct BatchStore {
    batches: Vec<PcmBatch>,
    total_samples: u64,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Running sample count across all retained batches.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn is_empty(&self) -> bool {
        self.total_samples == 0
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn push(&mut self, batch: PcmBatch) {
        self.total_samples += batch.samples.len() as u64;
        self.batches.push(batch);
    }

    /// Concatenate every batch in arrival order into one contiguous take.
    pub fn concat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.total_samples as usize);
        for batch in &self.batches {
            out.extend_from_slice(&batch.samples);
        }
        out
    }

    /// Copy out the samples in `[start, start + count)`, clipped to
    /// available data. Empty past the end.
    pub fn window(&self, start: u64, count: usize) -> Vec<f32> {
        if start >= self.total_samples || count == 0 {
            return Vec::new();
        }
        let end = (start + count as u64).min(self.total_samples);
        let mut out = Vec::with_capacity((end - start) as usize);

        let mut offset = 0u64;
        for batch in &self.batches {
            let batch_len = batch.samples.len() as u64;
            let batch_end = offset + batch_len;
            if batch_end > start && offset < end {
                let from = start.saturating_sub(offset) as usize;
                let to = (end.min(batch_end) - offset) as usize;
                out.extend_from_slice(&batch.samples[from..to]);
            }
            offset = batch_end;
            if offset >= end {
                break;
            }
        }
        out
    }

    pub fn reset(&mut self) {
        self.batches.clear();
        self.total_samples = 0;
    }
}
