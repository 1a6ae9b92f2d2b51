//! Identifier generation for blank generated-id columns.

use rand::RngExt;

/// Source of fresh 64-bit identifiers. The mapper consults it when an
/// insert finds a blank generated-id or primary-key column.
pub trait IdSource: Send + Sync {
    /// Produces the next identifier. Always positive, never zero.
    fn next_id(&self) -> i64;
}

/// Default identifier source: the current time in milliseconds shifted left
/// by 20 bits, combined with 20 bits of random noise. Identifiers are
/// positive, roughly time-ordered, and collide only when two are drawn in
/// the same millisecond with the same noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self) -> i64 {
        let millis = chrono::Utc::now().timestamp_millis();
        let noise = rand::rng().random_range(1..(1_i64 << 20));
        (millis << 20) | noise
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_positive_and_time_ordered() {
        let source = RandomIds;
        let first = source.next_id();
        assert!(first > 0);

        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = source.next_id();
        assert!(second > first);
    }
}
