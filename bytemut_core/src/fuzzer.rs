use crate::config::MutationSettings;
use crate::mutator::{ByteMutator, Mutation, MutationError, Mutator};
use crate::seed::SeedMaterial;
use crate::seedfile::{SeedError, SeedSource};
use log::{info, trace};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuzzRunError {
    #[error("Seed could not be loaded: {0}")]
    Seed(#[from] SeedError),
    #[error("Mutation failed: {0}")]
    Mutation(#[from] MutationError),
    #[error("No output to save; run() has not completed successfully")]
    NotRun,
    #[error("Failed to write output {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One deterministic fuzzing iteration over a seed.
///
/// The output directory is only used to name and save the result; the
/// mutation itself depends on the seed content, the iteration index and the
/// mutation settings alone.
pub struct FuzzRun<'a, S: SeedSource + ?Sized> {
    seed: &'a S,
    output_dir: PathBuf,
    iteration: u64,
    mutator: ByteMutator,
    result: Option<Mutation>,
}

impl<'a, S: SeedSource + ?Sized> FuzzRun<'a, S> {
    /// Outputs of byte mutation change isolated bytes with no structural
    /// context, so shrinking the unmutated regions is expected to keep a fault.
    pub const IS_MINIMIZABLE: bool = true;

    pub fn new(
        seed: &'a S,
        output_dir: impl Into<PathBuf>,
        iteration: u64,
        settings: MutationSettings,
    ) -> Self {
        Self {
            seed,
            output_dir: output_dir.into(),
            iteration,
            mutator: ByteMutator::from(settings),
            result: None,
        }
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn mutator(&self) -> &ByteMutator {
        &self.mutator
    }

    pub fn is_minimization_candidate(&self) -> bool {
        Self::IS_MINIMIZABLE
    }

    /// Loads the seed, mutates it and keeps the result as this run's output.
    ///
    /// Seed material is derived from the MD5 identity of the loaded content and
    /// the iteration index, so the output directory never influences the bytes.
    /// The loaded seed content lives only for the duration of this call and is
    /// released on every exit path.
    ///
    /// # Returns
    /// `Result<&[u8], FuzzRunError>`:
    ///   - `Ok(output)`: The mutated buffer, also kept for [`Self::output`].
    ///     Calling `run` again recomputes exactly the same bytes.
    ///   - `Err(FuzzRunError::Seed(_))`: The seed could not be read.
    ///   - `Err(FuzzRunError::Mutation(_))`: The mutator rejected the content,
    ///     e.g. `EmptyInput` for a zero-length seed or `Unfuzzable` when every
    ///     offset is excluded. A failed run leaves no output behind.
    pub fn run(&mut self) -> Result<&[u8], FuzzRunError> {
        self.result = None;
        let content = self.seed.load()?;
        let material = SeedMaterial::from_content(&content, self.iteration);
        let mutation = self.mutator.mutate(&content, &material)?;

        debug_assert_eq!(
            crate::hamming::bytewise_distance(&content, mutation.output()).ok(),
            Some(mutation.mutated_count())
        );
        info!(
            "{} iteration {}: mutated {} of {} fuzzable bytes",
            self.seed.name(),
            self.iteration,
            mutation.mutated_count(),
            mutation.fuzzable_count()
        );
        drop(content);
        trace!("released seed content for {}", self.seed.name());

        Ok(self.result.insert(mutation).output())
    }

    /// The output of the last successful `run`.
    pub fn output(&self) -> Option<&[u8]> {
        self.result.as_ref().map(Mutation::output)
    }

    pub fn mutation(&self) -> Option<&Mutation> {
        self.result.as_ref()
    }

    /// Fraction of fuzzable bytes changed by the last successful `run`.
    pub fn fuzzed_byte_ratio(&self) -> Option<f64> {
        self.result.as_ref().map(Mutation::realized_ratio)
    }

    /// `<output_dir>/<seed stem>-<iteration><.ext>`
    pub fn output_path(&self) -> PathBuf {
        let name = Path::new(self.seed.name());
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.seed.name().to_string());
        let file_name = match name.extension() {
            Some(ext) => format!("{stem}-{}.{}", self.iteration, ext.to_string_lossy()),
            None => format!("{stem}-{}", self.iteration),
        };
        self.output_dir.join(file_name)
    }

    /// Writes the output of the last successful `run` to [`Self::output_path`].
    pub fn save(&self) -> Result<PathBuf, FuzzRunError> {
        let output = self.output().ok_or(FuzzRunError::NotRun)?;
        let path = self.output_path();
        fs::create_dir_all(&self.output_dir)
            .and_then(|_| fs::write(&path, output))
            .map_err(|source| FuzzRunError::Save {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
