pub mod config;
pub mod fuzzer;
pub mod hamming;
pub mod mutator;
pub mod range;
pub mod seed;
pub mod seedfile;

pub use config::{BytemutConfig, CampaignSettings, MutationSettings};
pub use fuzzer::{FuzzRun, FuzzRunError};
pub use hamming::{bitwise_distance, bytewise_distance};
pub use mutator::{ByteMutator, Mutation, MutationError, Mutator, RatioBand, mutate};
pub use range::{ByteRange, ExclusionSet, RangeError};
pub use seed::SeedMaterial;
pub use seedfile::{SeedError, SeedFile, SeedSource};
