macro_rules! into_iter_if_parallel {
    ($collection:expr) => {{
        #[cfg(feature = "parallel")]
        let iter = rayon::iter::IntoParallelIterator::into_par_iter($collection);
        #[cfg(not(feature = "parallel"))]
        let iter = ::core::iter::IntoIterator::into_iter($collection);
        iter
    }};
}

macro_rules! stable_sort_if_parallel {
    ($slice:expr, $compare:expr) => {
        #[cfg(feature = "parallel")]
        rayon::slice::ParallelSliceMut::par_sort_by($slice, $compare);
        #[cfg(not(feature = "parallel"))]
        $slice.sort_by($compare);
    };
}
