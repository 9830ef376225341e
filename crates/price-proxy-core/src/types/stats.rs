//! Cache store statistics

/// Counters kept by a cache store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads that found an entry
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Number of write operations
    pub writes: u64,
    /// Number of delete operations that removed an entry
    pub deletes: u64,
    /// Current number of entries
    pub size: usize,
}

impl CacheStats {
    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.total_reads();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate miss ratio (0.0 to 1.0)
    pub fn miss_ratio(&self) -> f64 {
        if self.total_reads() == 0 {
            0.0
        } else {
            1.0 - self.hit_ratio()
        }
    }

    /// Total reads (hits + misses)
    pub fn total_reads(&self) -> u64 {
        self.hits + self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stats() {
        let stats = CacheStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.hit_ratio(), 0.0);
        assert_eq!(stats.miss_ratio(), 0.0);
    }

    #[test]
    fn test_hit_ratio() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_ratio() - 0.8).abs() < f64::EPSILON);
        assert!((stats.miss_ratio() - 0.2).abs() < 1e-9);
        assert_eq!(stats.total_reads(), 100);
    }
}
