//! Periodic probe-rate display.

use driftnet_utxo::UtxoIndex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const DISPLAY_INTERVAL: Duration = Duration::from_secs(60);

/// Drive the rate display forever on the calling thread.
pub fn run(checked: &AtomicU64, index: &UtxoIndex) -> ! {
    let mut last_total = 0u64;
    let mut last_tick = Instant::now();
    loop {
        std::thread::sleep(DISPLAY_INTERVAL);
        let total = checked.load(Ordering::Relaxed);
        let speed = (total - last_total) as f64 / last_tick.elapsed().as_secs_f64();
        tracing::info!(
            "{total} candidates checked ({speed:.2} keys/s), deepest chain walk {}",
            index.biggest_collision_depth()
        );
        last_total = total;
        last_tick = Instant::now();
    }
}
