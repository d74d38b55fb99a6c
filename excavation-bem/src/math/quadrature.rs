//! Gauss-Legendre quadrature rules
//!
//! Rules are generated on demand by Newton iteration on the Legendre
//! polynomial roots, so callers own the tables they integrate with.

/// Gauss-Legendre rule on the reference interval [-1, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct GaussLegendre {
    points: Vec<f64>,
    weights: Vec<f64>,
}

impl GaussLegendre {
    /// Build an `order`-point rule (order 0 is treated as 1)
    pub fn new(order: usize) -> Self {
        let n = order.max(1);
        let mut points = Vec::with_capacity(n);
        let mut weights = Vec::with_capacity(n);

        for i in 1..=n {
            // Tricomi initial guess for the i-th root
            let mut x = (std::f64::consts::PI * (i as f64 - 0.25) / (n as f64 + 0.5)).cos();
            let mut dp = 1.0;
            for _ in 0..100 {
                let (p, d) = legendre_with_derivative(n, x);
                dp = d;
                let dx = p / d;
                x -= dx;
                if dx.abs() < 1e-15 {
                    break;
                }
            }
            let (_, d) = legendre_with_derivative(n, x);
            if d.is_finite() && d != 0.0 {
                dp = d;
            }
            points.push(x);
            weights.push(2.0 / ((1.0 - x * x) * dp * dp));
        }

        Self { points, weights }
    }

    pub fn order(&self) -> usize {
        self.points.len()
    }

    /// (abscissa, weight) pairs on [-1, 1]
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points.iter().copied().zip(self.weights.iter().copied())
    }

    /// Integrate `f` over [a, b]
    pub fn integrate<F: Fn(f64) -> f64>(&self, a: f64, b: f64, f: F) -> f64 {
        let half = 0.5 * (b - a);
        let mid = 0.5 * (a + b);
        self.iter().map(|(xi, w)| w * f(mid + half * xi)).sum::<f64>() * half
    }
}

/// P_n(x) and P_n'(x) by the three-term recurrence
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    for k in 2..=n {
        let kf = k as f64;
        let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    let d = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, d)
}
