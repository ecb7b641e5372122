//! `stdecomp-datasets` provides synthetic frame stacks for tests, examples and benchmarks.
//!
//! The movies resemble calcium imaging recordings: a handful of sources with a Gaussian footprint
//! each, spiking with an exponentially decaying transient on top of a constant baseline plus
//! noise. As the footprints and traces are returned alongside the movie, the output of a
//! decomposition can be compared against the ground truth.
//!
//! ```
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(42);
//! let movie = stdecomp_datasets::movie(100, 32, 32, 4, 0.05, &mut rng);
//!
//! assert_eq!(movie.frames.dim(), (100, 32, 32));
//! assert_eq!(movie.footprints.dim(), (4, 32, 32));
//! assert_eq!(movie.traces.dim(), (4, 100));
//! ```

pub mod generate;

pub use generate::{footprint, movie, spike_trains, SyntheticMovie};
