//! Items used by the exported macros. Not public API.

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::ConversionRegistry;

    /// One statically declared registration.
    pub struct __TextRegistration(pub fn(&ConversionRegistry));

    inventory::collect!(__TextRegistration);

    /// Runs every declared registration, returning how many ran.
    pub fn __register_all(registry: &ConversionRegistry) -> usize {
        let mut count = 0;
        for registration in inventory::iter::<__TextRegistration> {
            (registration.0)(registry);
            count += 1;
        }
        count
    }
}
