//! Row-parallel execution that degrades to plain iteration.
//!
//! With the `parallel` feature (on by default) this is rayon's prelude, so
//! `(0..rows).into_par_iter()` fans grid rows out over the thread pool.
//! Without it, `into_par_iter` is a sequential stand-in returning the
//! ordinary iterator, and the same call chains compile unchanged.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential replacement for rayon's `IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter: Iterator<Item = Self::Item>;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
