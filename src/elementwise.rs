/// Apply a scalar transform to every cell of a dense buffer.
pub trait Elementwise {
    fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(f64) -> f64,
        Self: Sized;

    fn map_in_place<F>(&mut self, f: F)
    where
        F: FnMut(f64) -> f64;
}
