pub(crate) const PROPERTY_TYPE_WEIGHT: u8 = 25;
pub(crate) const BEDROOM_WEIGHT: u8 = 20;
pub(crate) const BUDGET_WEIGHT: u8 = 30;
pub(crate) const LOCATION_WEIGHT: u8 = 25;

/// Points available per criterion for one scoring pass. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Weights {
    pub property_type: u8,
    pub bedrooms: u8,
    pub budget: u8,
    pub location: u8,
}

impl Weights {
    pub(crate) const STANDARD: Weights = Weights {
        property_type: PROPERTY_TYPE_WEIGHT,
        bedrooms: BEDROOM_WEIGHT,
        budget: BUDGET_WEIGHT,
        location: LOCATION_WEIGHT,
    };

    /// Weights for a portfolio-level budget: the budget share is spread over the other three
    /// criteria in proportion to their standard weights (x 100/70), rounded with the largest
    /// remainder method so the total stays exactly 100.
    pub(crate) fn without_budget() -> Weights {
        let [property_type, bedrooms, location] = redistribute(
            [PROPERTY_TYPE_WEIGHT, BEDROOM_WEIGHT, LOCATION_WEIGHT],
            100,
        );
        Weights {
            property_type,
            bedrooms,
            budget: 0,
            location,
        }
    }

    #[cfg(test)]
    pub(crate) fn total(&self) -> u32 {
        self.property_type as u32 + self.bedrooms as u32 + self.budget as u32 + self.location as u32
    }
}

fn redistribute<const N: usize>(weights: [u8; N], total: u32) -> [u8; N] {
    let base: u32 = weights.iter().map(|weight| *weight as u32).sum();
    if base == 0 {
        return [0; N];
    }

    let mut scaled = [0u32; N];
    let mut remainders = Vec::with_capacity(N);
    for (index, weight) in weights.iter().enumerate() {
        let numerator = *weight as u32 * total;
        scaled[index] = numerator / base;
        remainders.push((numerator % base, index));
    }

    let mut leftover = total - scaled.iter().sum::<u32>();
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, index) in remainders {
        if leftover == 0 {
            break;
        }
        scaled[index] += 1;
        leftover -= 1;
    }

    scaled.map(|value| value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_weights_sum_to_one_hundred() {
        assert_eq!(Weights::STANDARD.total(), 100);
    }

    #[test]
    fn portfolio_weights_rescale_remaining_criteria() {
        let weights = Weights::without_budget();
        assert_eq!(weights.property_type, 36);
        assert_eq!(weights.bedrooms, 28);
        assert_eq!(weights.location, 36);
        assert_eq!(weights.budget, 0);
        assert_eq!(weights.total(), 100);
    }
}
