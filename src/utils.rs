use crate::error::{Error, Result};

/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

/// Number of elements in a buffer with the given dimensions, failing rather
/// than wrapping around on absurd sizes.
pub fn element_count(dims: &[usize], what: &'static str) -> Result<usize> {
    dims.iter()
        .try_fold(1_usize, |acc, &n| acc.checked_mul(n))
        .ok_or(Error::ResourceExhausted { what, elements: usize::MAX })
}

/// Allocate a zero-filled buffer, reporting allocation failure as an error
/// instead of aborting the process.
pub fn try_zeros<T: Clone + Default>(elements: usize, what: &'static str) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(elements)
        .map_err(|_| Error::ResourceExhausted { what, elements })?;
    buffer.resize(elements, T::default());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_are_grouped() {
        assert_eq!(group_digits(1234567), "1,234,567");
        assert_eq!(group_digits(12), "12");
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let result = element_count(&[usize::MAX, 2, 1], "volume");
        assert!(matches!(result, Err(Error::ResourceExhausted { what: "volume", .. })));
        assert_eq!(element_count(&[3, 4, 5], "volume").unwrap(), 60);
    }

    #[test]
    fn impossible_allocation_is_an_error() {
        let result = try_zeros::<f64>(usize::MAX / 4, "projections");
        assert!(matches!(result, Err(Error::ResourceExhausted { what: "projections", .. })));
        assert_eq!(try_zeros::<f32>(7, "volume").unwrap(), vec![0.0; 7]);
    }
}
