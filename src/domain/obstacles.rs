/// Obstacle generation.
///
/// Light obstacles are sampled from the upper play region; shadow
/// obstacles are never sampled, only reflected from light ones
/// index by index.
///
/// Sampling is a partial shuffle over the enumerated region, so it
/// always terminates. Requests larger than the region fail up front.


use rand::seq::SliceRandom;
use rand::Rng;

use super::emotion::Emotion;
use super::grid::{Grid, Pos};

/// Obstacle counts per emotion and the per-level increment.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ObstacleRules {
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
    pub per_level: usize,
}

impl Default for ObstacleRules {
    fn default() -> Self {
        ObstacleRules { negative: 5, neutral: 10, positive: 15, per_level: 3 }
    }
}

impl ObstacleRules {
    pub fn base(&self, emotion: Emotion) -> usize {
        match emotion {
            Emotion::Negative => self.negative,
            Emotion::Neutral => self.neutral,
            Emotion::Positive => self.positive,
        }
    }

    /// `base + (level - 1) * per_level`. Levels start at 1.
    pub fn count(&self, level: u32, emotion: Emotion) -> usize {
        let extra = level.saturating_sub(1) as usize;
        self.base(emotion).saturating_add(extra.saturating_mul(self.per_level))
    }

    /// Highest level whose obstacle count still fits in `grid`.
    /// `None` if even level 1 does not fit; `Some(u32::MAX)` if the
    /// count never grows.
    pub fn max_playable_level(&self, grid: &Grid, emotion: Emotion) -> Option<u32> {
        let capacity = grid.sampling_capacity();
        let base = self.base(emotion);
        if base > capacity {
            return None;
        }
        if self.per_level == 0 {
            return Some(u32::MAX);
        }
        let extra_levels = (capacity - base) / self.per_level;
        Some(u32::try_from(extra_levels).unwrap_or(u32::MAX - 1).saturating_add(1))
    }
}

#[derive(thiserror::Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum GenerateError {
    /// More obstacles requested than distinct cells exist in the region.
    #[error("level {level} needs {requested} obstacles but the play region only has {capacity} free cells")]
    OverCapacity { level: u32, requested: usize, capacity: usize },
}

/// The obstacle layout for one level. Immutable once built.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ObstacleSet {
    light: Vec<Pos>,
    shadow: Vec<Pos>,
}

impl ObstacleSet {
    /// Build from light obstacles; shadow obstacles are their reflections.
    pub fn from_light(grid: &Grid, light: Vec<Pos>) -> Self {
        let shadow = light.iter().map(|&p| grid.reflect(p)).collect();
        ObstacleSet { light, shadow }
    }

    pub fn empty() -> Self {
        ObstacleSet { light: vec![], shadow: vec![] }
    }

    pub fn light(&self) -> &[Pos] {
        &self.light
    }

    pub fn shadow(&self) -> &[Pos] {
        &self.shadow
    }

    pub fn len(&self) -> usize {
        self.light.len()
    }

    pub fn is_empty(&self) -> bool {
        self.light.is_empty()
    }

    pub fn hits_light(&self, p: Pos) -> bool {
        self.light.contains(&p)
    }

    pub fn hits_shadow(&self, p: Pos) -> bool {
        self.shadow.contains(&p)
    }
}

/// Generate the obstacle set for `level` under `emotion`.
pub fn generate<R: Rng + ?Sized>(
    grid: &Grid,
    rules: &ObstacleRules,
    level: u32,
    emotion: Emotion,
    rng: &mut R,
) -> Result<ObstacleSet, GenerateError> {
    let requested = rules.count(level, emotion);
    let capacity = grid.sampling_capacity();
    if requested > capacity {
        return Err(GenerateError::OverCapacity { level, requested, capacity });
    }
    if requested == 0 {
        return Ok(ObstacleSet::empty());
    }

    let mut cells = grid.sampling_cells();
    let (picked, _) = cells.partial_shuffle(rng, requested);
    Ok(ObstacleSet::from_light(grid, picked.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn count_scenarios() {
        let r = ObstacleRules::default();
        assert_eq!(r.count(1, Emotion::Neutral), 10);
        assert_eq!(r.count(3, Emotion::Positive), 21);
        assert_eq!(r.count(2, Emotion::Negative), 8);
    }

    #[test]
    fn generated_set_has_requested_size() {
        let g = Grid::new(15, 10);
        let r = ObstacleRules::default();
        let set = generate(&g, &r, 3, Emotion::Positive, &mut rng(7)).unwrap();
        assert_eq!(set.len(), 21);
        assert_eq!(set.shadow().len(), 21);
    }

    #[test]
    fn shadow_is_pairwise_reflection() {
        let g = Grid::new(15, 10);
        let set = generate(&g, &ObstacleRules::default(), 2, Emotion::Neutral, &mut rng(1)).unwrap();
        for (l, s) in set.light().iter().zip(set.shadow()) {
            assert_eq!(*s, Pos::new(l.x, 9 - l.y));
        }
    }

    #[test]
    fn over_capacity_fails_fast() {
        let g = Grid::new(15, 10);
        let r = ObstacleRules::default();
        // neutral: 10 + 3 * 16 = 58 fits in 59, level 18 needs 61
        assert!(generate(&g, &r, 17, Emotion::Neutral, &mut rng(0)).is_ok());
        let err = generate(&g, &r, 18, Emotion::Neutral, &mut rng(0)).unwrap_err();
        assert_eq!(err, GenerateError::OverCapacity { level: 18, requested: 61, capacity: 59 });
        assert!(err.to_string().contains("61 obstacles"));
    }

    #[test]
    fn exact_capacity_fills_region() {
        let g = Grid::new(3, 4);
        let r = ObstacleRules { negative: 3, neutral: 3, positive: 3, per_level: 0 };
        let set = generate(&g, &r, 5, Emotion::Neutral, &mut rng(3)).unwrap();
        let cells: HashSet<Pos> = set.light().iter().copied().collect();
        let region: HashSet<Pos> = g.sampling_cells().into_iter().collect();
        assert_eq!(cells, region);
    }

    #[test]
    fn max_playable_level() {
        let g = Grid::new(15, 10);
        let r = ObstacleRules::default();
        assert_eq!(r.max_playable_level(&g, Emotion::Neutral), Some(17));
        assert_eq!(r.max_playable_level(&g, Emotion::Positive), Some(15));
        assert_eq!(r.max_playable_level(&g, Emotion::Negative), Some(19));
        let tiny = Grid::new(2, 4);
        assert_eq!(r.max_playable_level(&tiny, Emotion::Negative), None);
        let flat = ObstacleRules { per_level: 0, ..r };
        assert_eq!(flat.max_playable_level(&g, Emotion::Neutral), Some(u32::MAX));
    }

    #[test]
    fn same_seed_same_layout() {
        let g = Grid::default();
        let r = ObstacleRules::default();
        let a = generate(&g, &r, 4, Emotion::Neutral, &mut rng(99)).unwrap();
        let b = generate(&g, &r, 4, Emotion::Neutral, &mut rng(99)).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn generated_obstacles_are_valid(
            seed in any::<u64>(),
            level in 1u32..=15,
            emotion in prop_oneof![
                Just(Emotion::Negative),
                Just(Emotion::Neutral),
                Just(Emotion::Positive),
            ],
        ) {
            let g = Grid::default();
            let r = ObstacleRules::default();
            let set = generate(&g, &r, level, emotion, &mut rng(seed)).unwrap();
            prop_assert_eq!(set.len(), r.count(level, emotion));

            let distinct: HashSet<Pos> = set.light().iter().copied().collect();
            prop_assert_eq!(distinct.len(), set.len());
            prop_assert!(!set.hits_light(g.light_start()));
            for p in set.light() {
                prop_assert!(g.contains(*p));
                prop_assert!(p.y <= g.sampling_max_y());
            }
            for (l, s) in set.light().iter().zip(set.shadow()) {
                prop_assert_eq!(*s, g.reflect(*l));
            }
        }
    }
}
