pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// `1 - tanh(x)^2`, taken from the pre-activation value.
pub fn tanh_derivative(x: f64) -> f64 {
    1.0 - x.tanh().powi(2)
}
