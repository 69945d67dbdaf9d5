use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Real-valued scalar the containers are parameterized over: arithmetic, comparison,
/// absolute value and square root come from `num_traits::Float`.
/// Implemented for `f32` and `f64`.
pub trait Real:
    Float + FromPrimitive + NumAssign + Sum + Debug + Display + Send + Sync + 'static
{
    /// convert an `f64` constant into `Self` (NaN if not representable)
    fn cast(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).unwrap_or_else(Self::nan)
    }
    /// convert an index or count into `Self`
    fn from_usize_lossy(n: usize) -> Self {
        <Self as FromPrimitive>::from_usize(n).unwrap_or_else(Self::nan)
    }
}

impl<T> Real for T where
    T: Float + FromPrimitive + NumAssign + Sum + Debug + Display + Send + Sync + 'static
{
}
