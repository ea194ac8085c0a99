use crate::config::MutationSettings;
use crate::range::ExclusionSet;
use crate::seed::SeedMaterial;
use log::{debug, warn};
use rand::Rng;
use rand::seq::index;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Slack applied when turning a ratio into a byte count, so float rounding in
/// e.g. `0.1 * 2500.0` cannot push a bound past the exact product.
const RATIO_EPSILON: f64 = 1e-9;

/// Failures of a single mutation. None of them are retried internally, and no
/// partially mutated buffer is ever returned alongside them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    /// The band is outside `[0, 1]`, inverted, or the degenerate `(0, 0)`.
    #[error("Invalid ratio band [{min}, {max}]: need 0 <= min <= max <= 1 and max > 0")]
    InvalidRatioBand { min: f64, max: f64 },

    #[error("Input is empty, there is nothing to mutate")]
    EmptyInput,

    /// Every offset of the input is covered by an exclusion range.
    #[error("All {length} bytes of the input are excluded from mutation")]
    Unfuzzable { length: usize },

    /// Distinct-offset selection came up short. This indicates a logic error,
    /// the requested count is always bounded by the fuzzable count.
    #[error("Selected {available} distinct fuzzable offsets, needed {requested}")]
    GeneratorExhaustion { requested: usize, available: usize },
}

/// The admissible fraction of fuzzable bytes that must differ after mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioBand {
    min: f64,
    max: f64,
}

impl RatioBand {
    /// Validates `0 <= min <= max <= 1`. The band `(0, 0)` is rejected here; use
    /// [`RatioBand::zero`] to opt into zero-mutation results explicitly.
    pub fn new(min: f64, max: f64) -> Result<Self, MutationError> {
        let unit = 0.0..=1.0;
        if !unit.contains(&min) || !unit.contains(&max) || min > max || max == 0.0 {
            return Err(MutationError::InvalidRatioBand { min, max });
        }
        Ok(Self { min, max })
    }

    /// Builds a band from bounds already known to satisfy `0 <= min <= max <= 1`
    /// with `max > 0`, for use in constants.
    pub(crate) const fn from_valid_bounds(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A band that tolerates returning the input unchanged.
    pub const fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_zero(&self) -> bool {
        self.max == 0.0
    }

    /// The mutation counts admissible for `fuzzable` eligible bytes.
    ///
    /// The lower bound is at least 1 for any nonzero band. When `max * fuzzable`
    /// rounds below that, the range collapses to the lower bound (clamped to
    /// `fuzzable`) and the realized ratio ends up above `max`.
    pub fn count_range(&self, fuzzable: usize) -> RangeInclusive<usize> {
        if self.is_zero() || fuzzable == 0 {
            return 0..=0;
        }
        let f = fuzzable as f64;
        let lower = ((self.min * f - RATIO_EPSILON).ceil().max(1.0) as usize).min(fuzzable);
        let upper = ((self.max * f + RATIO_EPSILON).floor() as usize).clamp(lower, fuzzable);
        lower..=upper
    }
}

/// The outcome of one mutation: the freshly allocated output plus the numbers
/// the ratio band was applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    output: Vec<u8>,
    mutated: usize,
    fuzzable: usize,
}

impl Mutation {
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Number of offsets whose value differs from the input.
    pub fn mutated_count(&self) -> usize {
        self.mutated
    }

    /// Number of offsets that were eligible for mutation.
    pub fn fuzzable_count(&self) -> usize {
        self.fuzzable
    }

    /// `mutated / fuzzable`, or 0 when nothing was fuzzable.
    pub fn realized_ratio(&self) -> f64 {
        if self.fuzzable == 0 {
            0.0
        } else {
            self.mutated as f64 / self.fuzzable as f64
        }
    }
}

/// A `Mutator` turns an input buffer into a new buffer of the same length.
///
/// Implementations must be pure: the output depends only on `input`, `seed`
/// and the mutator's own configuration, so the same call always yields the
/// same bytes and independent calls may run on different threads.
pub trait Mutator: Send + Sync {
    /// Produces a mutated copy of `input`.
    ///
    /// # Arguments
    /// * `input`: The buffer to mutate. It is only read; the output is always a
    ///   fresh allocation of the same length.
    /// * `seed`: Deterministic seed material. The mutator builds its own
    ///   generator from it, so equal seeds give byte-identical outputs.
    ///
    /// # Returns
    /// `Result<Mutation, MutationError>`:
    ///   - `Ok(mutation)`: The output together with the mutated and fuzzable counts.
    ///   - `Err(error)`: The input cannot be mutated under this configuration.
    ///     No partial output accompanies an error.
    fn mutate(&self, input: &[u8], seed: &SeedMaterial) -> Result<Mutation, MutationError>;
}

/// Byte-flip mutator with a ratio band and optional exclusion ranges.
#[derive(Debug, Clone)]
pub struct ByteMutator {
    band: RatioBand,
    exclusions: ExclusionSet,
}

impl ByteMutator {
    pub fn new(band: RatioBand, exclusions: ExclusionSet) -> Self {
        Self { band, exclusions }
    }

    pub fn band(&self) -> &RatioBand {
        &self.band
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }
}

impl From<MutationSettings> for ByteMutator {
    fn from(settings: MutationSettings) -> Self {
        Self::new(settings.band, settings.exclusions)
    }
}

impl Mutator for ByteMutator {
    fn mutate(&self, input: &[u8], seed: &SeedMaterial) -> Result<Mutation, MutationError> {
        mutate(input, seed, &self.band, &self.exclusions)
    }
}

/// Mutates a copy of `input`.
///
/// A count `N` is drawn from [`RatioBand::count_range`] for the number of
/// fuzzable offsets `F`, then `N` distinct fuzzable offsets are picked and, in
/// ascending offset order, each has a nonzero value added to it (wrapping), so
/// every picked byte changes. Excluded and unpicked offsets are copied through
/// untouched.
///
/// # Arguments
/// * `input`: The seed bytes. Must be non-empty.
/// * `seed`: Seed material; the only source of randomness.
/// * `band`: Admissible `N / F`. A zero band returns an unchanged copy.
/// * `exclusions`: Offsets that must keep their value. Empty means none.
///
/// # Returns
/// `Result<Mutation, MutationError>`:
///   - `Ok(mutation)`: Exactly `N` bytes differ from `input`.
///   - `Err(MutationError::EmptyInput)`: `input` has no bytes.
///   - `Err(MutationError::Unfuzzable { .. })`: Every offset is excluded while a
///     nonzero band was requested.
///   - `Err(MutationError::GeneratorExhaustion { .. })`: Offset selection came
///     up short; a logic error, never expected in practice.
pub fn mutate(
    input: &[u8],
    seed: &SeedMaterial,
    band: &RatioBand,
    exclusions: &ExclusionSet,
) -> Result<Mutation, MutationError> {
    if input.is_empty() {
        return Err(MutationError::EmptyInput);
    }

    // Without exclusions the fuzzable offsets are just 0..len; skip materializing them.
    let offsets = (!exclusions.is_empty()).then(|| exclusions.fuzzable_offsets(input.len()));
    let fuzzable = offsets.as_ref().map_or(input.len(), Vec::len);
    let mut output = input.to_vec();

    if band.is_zero() {
        debug!("zero ratio band, returning {} bytes unchanged", input.len());
        return Ok(Mutation {
            output,
            mutated: 0,
            fuzzable,
        });
    }
    if fuzzable == 0 {
        return Err(MutationError::Unfuzzable {
            length: input.len(),
        });
    }

    let mut rng = seed.rng();
    let count = rng.random_range(band.count_range(fuzzable));
    if count > fuzzable {
        return Err(MutationError::GeneratorExhaustion {
            requested: count,
            available: fuzzable,
        });
    }

    let mut picks = index::sample(&mut rng, fuzzable, count).into_vec();
    if picks.len() != count {
        return Err(MutationError::GeneratorExhaustion {
            requested: count,
            available: picks.len(),
        });
    }
    picks.sort_unstable();

    for pick in picks {
        let offset = match &offsets {
            Some(offsets) => offsets[pick],
            None => pick,
        };
        let delta = rng.random_range(1u8..=u8::MAX);
        output[offset] = output[offset].wrapping_add(delta);
    }

    let mutation = Mutation {
        output,
        mutated: count,
        fuzzable,
    };
    if mutation.realized_ratio() > band.max() {
        warn!(
            "only {fuzzable} fuzzable bytes, realized ratio {:.4} exceeds requested max {}",
            mutation.realized_ratio(),
            band.max()
        );
    }
    debug!(
        "mutated {count}/{fuzzable} fuzzable bytes (ratio {:.4}) of {} total",
        mutation.realized_ratio(),
        input.len()
    );
    Ok(mutation)
}
