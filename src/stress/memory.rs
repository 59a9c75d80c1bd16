//! Memory stress: allocate a share of physical memory and hold it.

use std::time::Duration;

use thiserror::Error;

/// Page stride used to make the allocation resident.
const PAGE_SIZE: usize = 4096;

#[derive(Debug, Error)]
pub enum AllocError {
    #[error("failed to reserve {bytes} bytes: {source}")]
    Reserve {
        bytes: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("{0} bytes does not fit in this address space")]
    TooLarge(u64),

    #[error("allocation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Bytes corresponding to `percent` of `total`.
pub fn bytes_for_percent(total: u64, percent: u8) -> u64 {
    (total as u128 * percent as u128 / 100) as u64
}

/// Allocate `bytes` and write one byte per page so the pages are resident,
/// not just reserved.
pub fn allocate_resident(bytes: u64) -> Result<Vec<u8>, AllocError> {
    let bytes = usize::try_from(bytes).map_err(|_| AllocError::TooLarge(bytes))?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(bytes)
        .map_err(|source| AllocError::Reserve { bytes, source })?;
    buffer.resize(bytes, 0);
    for offset in (0..bytes).step_by(PAGE_SIZE) {
        buffer[offset] = 1;
    }
    Ok(buffer)
}

/// Allocate, hold for `duration`, then release. The buffer stays observable
/// until the sleep ends so the optimiser cannot drop it early.
pub async fn hold(bytes: u64, duration: Duration) -> Result<usize, AllocError> {
    let buffer = tokio::task::spawn_blocking(move || allocate_resident(bytes))
        .await??;
    let held = buffer.len();
    tokio::time::sleep(duration).await;
    std::hint::black_box(&buffer);
    drop(buffer);
    Ok(held)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_total() {
        assert_eq!(bytes_for_percent(1_000, 10), 100);
        assert_eq!(bytes_for_percent(1_000, 0), 0);
        assert_eq!(bytes_for_percent(u64::MAX, 100), u64::MAX);
        assert_eq!(bytes_for_percent(16 * 1024 * 1024 * 1024, 50), 8 * 1024 * 1024 * 1024);
    }

    #[test]
    fn allocation_is_touched() {
        let buffer = allocate_resident(3 * PAGE_SIZE as u64 + 10).unwrap();
        assert_eq!(buffer.len(), 3 * PAGE_SIZE + 10);
        assert_eq!(buffer[0], 1);
        assert_eq!(buffer[PAGE_SIZE], 1);
        assert_eq!(buffer[PAGE_SIZE + 1], 0);
    }

    #[test]
    fn empty_allocation_is_fine() {
        assert!(allocate_resident(0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn hold_keeps_buffer_for_duration() {
        let start = std::time::Instant::now();
        let held = hold(64 * 1024, Duration::from_millis(50)).await.unwrap();
        assert_eq!(held, 64 * 1024);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
