//! Splitting the article corpus into contiguous per-worker ranges.

/// A contiguous `[offset, offset + limit)` slice of the id-ordered corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub worker: usize,
    pub offset: u64,
    pub limit: u64,
}

impl Partition {
    pub fn end(&self) -> u64 {
        self.offset + self.limit
    }
}

/// Divide `total` records among `workers` tasks.
///
/// Every worker but the last gets `total / workers` records; the last also
/// takes the remainder. When there are fewer records than workers a single
/// partition covers everything. A worker count of zero is treated as one.
pub fn partition(total: u64, workers: usize) -> Vec<Partition> {
    if total == 0 {
        return Vec::new();
    }

    let workers = workers.max(1) as u64;
    let size = total / workers;
    if size == 0 {
        return vec![Partition {
            worker: 0,
            offset: 0,
            limit: total,
        }];
    }

    (0..workers)
        .filter_map(|i| {
            let offset = i * size;
            if offset >= total {
                return None;
            }
            let limit = if i == workers - 1 { total - offset } else { size };
            Some(Partition {
                worker: i as usize,
                offset,
                limit,
            })
        })
        .collect()
}
