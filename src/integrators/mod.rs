//! The solvers. Each binds an integrand and a domain to one way of generating points and one
//! estimator.
pub mod importance;
pub mod plain;
pub mod quasi;

use crate::error::{Error, Result};

/// Every integration needs at least one sample.
pub(crate) fn check_sample_count(samples: usize) -> Result<()> {
    if samples == 0 {
        Err(Error::InvalidSampleCount { samples })
    } else {
        Ok(())
    }
}
