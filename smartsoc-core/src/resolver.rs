//! Category-specific automated response rules applied after a delay.

use crate::types::{Category, EventRecord, EventStatus};

/// The terminal status a record moves to and the simulated defensive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub status: EventStatus,
    pub action: &'static str,
}

/// Decide how a record auto-resolves. `None` leaves it `Active`.
///
/// Brute force is blocked only above `block_threshold` attempts; malware is
/// contained; DDoS is mitigated. Other categories have no rule.
pub fn resolution_for(record: &EventRecord, block_threshold: u64) -> Option<Resolution> {
    match record.category {
        Category::BruteForce => {
            let attempts = record.attempts()?;
            (attempts > block_threshold).then_some(Resolution {
                status: EventStatus::Blocked,
                action: "Blocked source IP",
            })
        }
        Category::Malware => Some(Resolution {
            status: EventStatus::Contained,
            action: "Quarantined affected system",
        }),
        Category::Ddos => Some(Resolution {
            status: EventStatus::Mitigated,
            action: "Enabled DDoS mitigation",
        }),
        Category::Phishing | Category::Insider | Category::Exfiltration => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::EventGenerator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_brute_force_threshold() {
        let mut generator = EventGenerator::new();
        let mut rng = StdRng::seed_from_u64(4);
        let blocked = generator.brute_force(35, &mut rng);
        assert_eq!(
            resolution_for(&blocked, 20).map(|r| r.status),
            Some(EventStatus::Blocked)
        );
        let edge = generator.brute_force(21, &mut rng);
        assert!(resolution_for(&edge, 20).is_some());
        let at_threshold = generator.brute_force(20, &mut rng);
        assert!(resolution_for(&at_threshold, 20).is_none());
        let low = generator.brute_force(12, &mut rng);
        assert!(resolution_for(&low, 20).is_none());
    }

    #[test]
    fn test_category_rules() {
        let mut generator = EventGenerator::new();
        let mut rng = StdRng::seed_from_u64(8);
        let status = |c: Category, g: &mut EventGenerator, r: &mut StdRng| {
            resolution_for(&g.generate(c, r), 20).map(|r| r.status)
        };
        assert_eq!(
            status(Category::Malware, &mut generator, &mut rng),
            Some(EventStatus::Contained)
        );
        assert_eq!(
            status(Category::Ddos, &mut generator, &mut rng),
            Some(EventStatus::Mitigated)
        );
        assert_eq!(status(Category::Phishing, &mut generator, &mut rng), None);
        assert_eq!(status(Category::Insider, &mut generator, &mut rng), None);
        assert_eq!(status(Category::Exfiltration, &mut generator, &mut rng), None);
    }
}
