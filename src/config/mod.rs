// imports
use crate::error::{SpaceError, SpaceResult};
use crate::permutation::PermutationKind;

use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use serde_json::Value;
use tracing::info;

pub mod files_handling;


/// Parameters of one random indexing run.
#[derive(Clone, Debug, PartialEq)]
pub struct SpaceParams {
    pub vector_length: usize,
    pub non_zero_count: usize,
    pub variance: usize,
    pub window_size: usize,
    pub use_permutations: bool,
    pub permutation: PermutationKind,
    pub seed: u64,
    pub num_threads: usize
}

impl Default for SpaceParams {
    fn default() -> Self {
        Self {
            vector_length: 4000,
            non_zero_count: 4,
            variance: 0,
            window_size: 2,
            use_permutations: false,
            permutation: PermutationKind::Cyclic,
            seed: 0,
            num_threads: 4
        }
    }
}

impl SpaceParams {

    /// Checks the parameters hang together, before anything is built from them.
    pub fn validate(&self) -> SpaceResult<()> {
        if self.vector_length == 0 {
            return Err(SpaceError::configuration("vector_length must be positive"));
        }
        if self.non_zero_count == 0 || self.non_zero_count > self.vector_length {
            return Err(SpaceError::configuration(format!(
                "non_zero_count must be between 1 and vector_length ({}), got {}", self.vector_length, self.non_zero_count)));
        }
        // window offsets become i32 permutation exponents
        if self.window_size == 0 || self.window_size > i32::MAX as usize {
            return Err(SpaceError::configuration(format!(
                "window_size must be between 1 and {}, got {}", i32::MAX, self.window_size)));
        }
        if self.num_threads == 0 {
            return Err(SpaceError::configuration("num_threads must be positive"));
        }
        if let PermutationKind::Windowed { window } = self.permutation {
            if window == 0 || window > i32::MAX as usize {
                return Err(SpaceError::configuration(format!(
                    "a windowed permutation needs a window between 1 and {}, got {}", i32::MAX, window)));
            }
        }
        Ok(())
    }

}

impl Display for SpaceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using hyper-params:
        vector_length: {}
        non_zero_count: {}
        variance: {}
        window_size: {}
        use_permutations: {}
        permutation: {}
        seed: {}
        num_threads: {}",
        self.vector_length, self.non_zero_count, self.variance, self.window_size,
        self.use_permutations, self.permutation, self.seed, self.num_threads)
    }
}


pub struct Config {
    params: SpaceParams
}

fn read_usize(json: &Value, name: &str, default: usize) -> SpaceResult<usize> {
    match json.get(name) {
        Some(value) => value.as_u64().map(|x| x as usize)
            .ok_or_else(|| SpaceError::configuration(format!("{} should be a non negative integer", name))),
        None => Ok(default)
    }
}

fn read_bool(json: &Value, name: &str, default: bool) -> SpaceResult<bool> {
    match json.get(name) {
        Some(value) => value.as_bool()
            .ok_or_else(|| SpaceError::configuration(format!("{} should be a boolean", name))),
        None => Ok(default)
    }
}

impl Config {

    pub fn get_params(&self) -> SpaceParams {
        self.params.clone()
    }

    /// Reads the parameters from a json file.
    pub fn new<P: AsRef<Path>>(path: P) -> SpaceResult<Config> {
        let f = BufReader::new(File::open(path.as_ref())?);
        let json: Value = serde_json::from_reader(f)?;
        let config = Config::from_json(&json)?;
        info!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    /// Builds the parameters out of a json object, absent keys taking their defaults.
    pub fn from_json(json: &Value) -> SpaceResult<Config> {

        if !json.is_object() {
            return Err(SpaceError::configuration("configuration should be a json object"));
        }

        // handle default vs input parameters
        let defaults = SpaceParams::default();
        let permutation = match json.get("permutation") {
            Some(permutation) => serde_json::from_value(permutation.clone())?,
            None => defaults.permutation
        };
        let seed = match json.get("seed") {
            Some(seed) => seed.as_u64().ok_or_else(|| SpaceError::configuration("seed should be a non negative integer"))?,
            None => defaults.seed
        };

        let params = SpaceParams {
            vector_length: read_usize(json, "vector_length", defaults.vector_length)?,
            non_zero_count: read_usize(json, "non_zero_count", defaults.non_zero_count)?,
            variance: read_usize(json, "variance", defaults.variance)?,
            window_size: read_usize(json, "window_size", defaults.window_size)?,
            use_permutations: read_bool(json, "use_permutations", defaults.use_permutations)?,
            permutation,
            seed,
            num_threads: read_usize(json, "num_threads", defaults.num_threads)?
        };
        params.validate()?;

        Ok(Self { params })
    }

}
