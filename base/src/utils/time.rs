
use std::time::Duration;

use crate::vklint;

/// The timeout used when waiting for fences.
#[derive(Debug, Copy, Clone)]
pub enum VkTimeDuration {
    Immediate,
    Time(Duration),
    Infinite,
}

impl From<VkTimeDuration> for vklint {

    fn from(time: VkTimeDuration) -> vklint {
        match time {
            | VkTimeDuration::Immediate => 0,
            | VkTimeDuration::Time(time) =>
                (time.subsec_nanos() as vklint) + time.as_secs() * 1_000_000_000,
            | VkTimeDuration::Infinite => vklint::max_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_to_nanoseconds() {

        assert_eq!(vklint::from(VkTimeDuration::Immediate), 0);
        assert_eq!(vklint::from(VkTimeDuration::Infinite), u64::max_value());
        assert_eq!(vklint::from(VkTimeDuration::Time(Duration::from_millis(1500))), 1_500_000_000);
    }
}
