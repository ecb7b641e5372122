//! # Spatio-temporal decomposition of frame stacks
//!
//! `stdecomp-stica` decomposes a stack of frames, for example a calcium imaging recording, into
//! spatial components and temporal signals. Four methods are available:
//!
//! * PCA, FastICA and NMF on the observation matrix with frames as samples and pixels as
//!   features, see [`decomposers`]
//! * spatio-temporal ICA, which unmixes spatial and temporal principal components jointly, see
//!   [`StIca`]
//!
//! [`decompose`](decompose()) is the common entry point. It dispatches on a [`Method`], orders the
//! components and optionally converts them into masks and temporal traces.
//!
//! ```
//! use ndarray_rand::rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256Plus;
//! use stdecomp_stica::{decompose, Method, MethodKind, OutputOptions};
//!
//! let mut rng = Xoshiro256Plus::seed_from_u64(1);
//! let movie = stdecomp_datasets::movie(50, 12, 12, 2, 0.05, &mut rng);
//!
//! let method = Method::default_for(MethodKind::Pca);
//! let options = OutputOptions::new().traces(true);
//! let result = decompose(&method, &movie.frames, &options).unwrap();
//!
//! assert_eq!(result.spatial().unwrap().dim(), (6, 12, 12));
//! assert_eq!(result.masks().unwrap().dim(), (6, 12, 12));
//! ```

mod decompose;
pub mod decomposers;
pub mod error;
mod hyperparams;
mod stica;

pub use decompose::{
    decompose, ComponentOrder, Decomposition, Method, MethodKind, OutputOptions,
    DEFAULT_COMPONENTS,
};
pub use error::{DecompositionError, Result, StIcaError};
pub use hyperparams::{StIcaParams, StIcaValidParams};
pub use stica::StIca;
