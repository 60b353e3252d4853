use crate::data::Error;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};

/// Picks one category out of a fixed set, with probability proportional to its
/// weight. Zero-weight categories are allowed (they are just never drawn) as long
/// as at least one weight is positive.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    categories: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T> WeightedChoice<T> {
    pub fn new<I: IntoIterator<Item = (T, u32)>>(weights: I) -> Result<Self, Error> {
        let (categories, weights): (Vec<T>, Vec<u32>) = weights.into_iter().unzip();
        if categories.is_empty() {
            return Err(Error::InvalidWeights("no category to choose from".into()));
        }
        if weights.iter().all(|&w| w == 0) {
            return Err(Error::InvalidWeights("all weights are zero".into()));
        }
        let index = WeightedIndex::new(&weights).map_err(|e| Error::InvalidWeights(e.to_string()))?;
        Ok(Self { categories, index })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.categories[self.index.sample(rng)]
    }
}
