//! Complex MNA matrix assembly and solving.

use num_complex::Complex64;

use crate::circuit::{Circuit, NodeId};
use crate::components::Component;
use crate::error::{DesignError, Result};

/// Pivots smaller than this fraction of the largest matrix entry are
/// treated as zero.
pub const PIVOT_TOLERANCE: f64 = 1e-14;

/// Complex MNA system `Y(jω) x = z` for one frequency point.
#[derive(Debug)]
pub struct ComplexMna {
    /// System matrix Y (row-major)
    pub a: Vec<Complex64>,
    /// Source vector z
    pub z: Vec<Complex64>,
    /// Solution vector x
    pub x: Vec<Complex64>,
    /// Matrix dimension
    pub size: usize,
    /// LU decomposition of Y
    lu: Vec<Complex64>,
    /// Pivot indices for LU decomposition
    pivots: Vec<usize>,
}

impl ComplexMna {
    /// Create an empty system of the given dimension.
    pub fn new(size: usize) -> Self {
        let zero = Complex64::new(0.0, 0.0);
        Self {
            a: vec![zero; size * size],
            z: vec![zero; size],
            x: vec![zero; size],
            size,
            lu: vec![zero; size * size],
            pivots: vec![0; size],
        }
    }

    /// Clear the matrix and source vector to zero.
    pub fn clear(&mut self) {
        self.a.fill(Complex64::new(0.0, 0.0));
        self.z.fill(Complex64::new(0.0, 0.0));
    }

    /// Get matrix element at (row, col).
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.a[row * self.size + col]
    }

    /// Add to matrix element at (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: Complex64) {
        self.a[row * self.size + col] += value;
    }

    /// Stamp an admittance between two nodes.
    /// For an admittance Y between nodes n1 and n2:
    ///   A[n1,n1] += Y
    ///   A[n2,n2] += Y
    ///   A[n1,n2] -= Y
    ///   A[n2,n1] -= Y
    pub fn stamp_admittance(&mut self, n1: Option<usize>, n2: Option<usize>, y: Complex64) {
        if let Some(i) = n1 {
            self.add(i, i, y);
        }
        if let Some(j) = n2 {
            self.add(j, j, y);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.add(i, j, -y);
            self.add(j, i, -y);
        }
    }

    /// Stamp a real conductance between two nodes.
    pub fn stamp_conductance(&mut self, n1: Option<usize>, n2: Option<usize>, g: f64) {
        self.stamp_admittance(n1, n2, Complex64::new(g, 0.0));
    }

    /// Stamp a branch element `V[n+] - V[n-] - Z * I[br] = E`.
    ///
    /// An ideal voltage source has `Z = 0`; an inductor has `Z = jωL`, `E = 0`.
    pub fn stamp_branch(
        &mut self,
        n_pos: Option<usize>,
        n_neg: Option<usize>,
        br: usize,
        impedance: Complex64,
        voltage: Complex64,
    ) {
        let one = Complex64::new(1.0, 0.0);
        if let Some(i) = n_pos {
            self.add(br, i, one);
            self.add(i, br, one);
        }
        if let Some(j) = n_neg {
            self.add(br, j, -one);
            self.add(j, br, -one);
        }
        self.add(br, br, -impedance);
        self.z[br] += voltage;
    }

    /// Stamp a current source between two nodes.
    /// Current flows from n+ to n- through the source.
    pub fn stamp_current_source(&mut self, n_pos: Option<usize>, n_neg: Option<usize>, current: Complex64) {
        if let Some(i) = n_pos {
            self.z[i] -= current;
        }
        if let Some(j) = n_neg {
            self.z[j] += current;
        }
    }

    /// Perform LU decomposition with partial pivoting.
    pub fn factor(&mut self) -> Result<()> {
        let n = self.size;
        self.lu.copy_from_slice(&self.a);

        for (i, p) in self.pivots.iter_mut().enumerate() {
            *p = i;
        }

        let scale = self.a.iter().map(|v| v.norm()).fold(0.0, f64::max);
        if n > 0 && scale == 0.0 {
            return Err(DesignError::SingularMatrix);
        }
        let threshold = PIVOT_TOLERANCE * scale;

        for k in 0..n {
            // Find pivot
            let mut max_val = self.lu[k * n + k].norm();
            let mut max_row = k;

            for i in (k + 1)..n {
                let val = self.lu[i * n + k].norm();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }

            if max_val.is_nan() || max_val <= threshold {
                return Err(DesignError::SingularMatrix);
            }

            if max_row != k {
                self.pivots.swap(k, max_row);
                for j in 0..n {
                    self.lu.swap(k * n + j, max_row * n + j);
                }
            }

            // Eliminate
            let pivot = self.lu[k * n + k];
            for i in (k + 1)..n {
                let factor = self.lu[i * n + k] / pivot;
                self.lu[i * n + k] = factor;
                for j in (k + 1)..n {
                    let upper = self.lu[k * n + j];
                    self.lu[i * n + j] -= factor * upper;
                }
            }
        }

        Ok(())
    }

    /// Solve the system using the pre-computed LU decomposition.
    pub fn solve(&mut self) {
        let n = self.size;

        // Apply pivot permutation to z
        for i in 0..n {
            self.x[i] = self.z[self.pivots[i]];
        }

        // Forward substitution (L * y = Pb)
        for i in 0..n {
            for j in 0..i {
                let xj = self.x[j];
                self.x[i] -= self.lu[i * n + j] * xj;
            }
        }

        // Back substitution (U * x = y)
        for i in (0..n).rev() {
            for j in (i + 1)..n {
                let xj = self.x[j];
                self.x[i] -= self.lu[i * n + j] * xj;
            }
            self.x[i] /= self.lu[i * n + i];
        }
    }

    /// Get the voltage at a matrix index, ground being zero.
    pub fn voltage(&self, node: Option<usize>) -> Complex64 {
        match node {
            Some(i) => self.x[i],
            None => Complex64::new(0.0, 0.0),
        }
    }

    /// Get the voltage at a NodeId (handling ground).
    pub fn node_voltage(&self, circuit: &Circuit, node: NodeId) -> Complex64 {
        self.voltage(circuit.node_index(node))
    }
}

/// Stamp every component at angular frequency `omega`.
pub fn stamp_components(circuit: &Circuit, matrix: &mut ComplexMna, omega: f64) {
    let zero = Complex64::new(0.0, 0.0);

    for component in &circuit.components {
        let [n1, n2] = component.nodes().map(|node| circuit.node_index(node));

        match component {
            Component::Resistor(r) => matrix.stamp_conductance(n1, n2, r.conductance()),

            Component::Capacitor(c) => matrix.stamp_admittance(n1, n2, c.admittance(omega)),

            Component::Inductor(l) => {
                let br = circuit.branch_index(l.branch);
                matrix.stamp_branch(n1, n2, br, l.impedance(omega), zero);
            }

            Component::VoltageSource(v) => {
                let br = circuit.branch_index(v.branch);
                matrix.stamp_branch(n1, n2, br, zero, v.phasor());
            }

            Component::CurrentSource(i) => matrix.stamp_current_source(n1, n2, i.phasor()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve_real_system() {
        // 2x + y = 5, x + 3y = 10  =>  x = 1, y = 3
        let mut m = ComplexMna::new(2);
        m.add(0, 0, Complex64::new(2.0, 0.0));
        m.add(0, 1, Complex64::new(1.0, 0.0));
        m.add(1, 0, Complex64::new(1.0, 0.0));
        m.add(1, 1, Complex64::new(3.0, 0.0));
        m.z[0] = Complex64::new(5.0, 0.0);
        m.z[1] = Complex64::new(10.0, 0.0);

        m.factor().unwrap();
        m.solve();
        assert_relative_eq!(m.x[0].re, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.x[1].re, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_complex_system() {
        // j * x = 1  =>  x = -j
        let mut m = ComplexMna::new(1);
        m.add(0, 0, Complex64::new(0.0, 1.0));
        m.z[0] = Complex64::new(1.0, 0.0);

        m.factor().unwrap();
        m.solve();
        assert_relative_eq!(m.x[0].re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(m.x[0].im, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_matrix() {
        let mut m = ComplexMna::new(2);
        m.stamp_conductance(Some(0), Some(1), 1.0);
        assert!(matches!(m.factor(), Err(DesignError::SingularMatrix)));
    }

    #[test]
    fn test_zero_matrix_is_singular() {
        let mut m = ComplexMna::new(3);
        assert!(matches!(m.factor(), Err(DesignError::SingularMatrix)));
    }

    #[test]
    fn test_admittance_stamp_pattern() {
        let mut m = ComplexMna::new(2);
        let y = Complex64::new(0.5, 2.0);
        m.stamp_admittance(Some(0), Some(1), y);
        assert_eq!(m.get(0, 0), y);
        assert_eq!(m.get(1, 1), y);
        assert_eq!(m.get(0, 1), -y);
        assert_eq!(m.get(1, 0), -y);

        m.clear();
        m.stamp_admittance(Some(1), None, y);
        assert_eq!(m.get(1, 1), y);
        assert_eq!(m.get(0, 0), Complex64::new(0.0, 0.0));
    }
}
