//! Sequential minimal optimisation for the epsilon-SVR dual.
//!
//! The dual is written over `2l` variables `[α; α*]` with labels `+1` and
//! `-1`:
//!
//! ```text
//! min  ½ βᵀ Q β + pᵀ β
//! s.t. yᵀ β = 0,  0 ≤ β ≤ C
//! ```
//!
//! where `Q_ij = y_i y_j K(i mod l, j mod l)`, `p_i = ε − t_i` for the first
//! half and `p_i = ε + t_i` for the second. Working pairs are chosen with
//! second-order information (Fan, Chen and Lin, 2005).

const TAU: f64 = 1e-12;

/// Result of one solve.
#[derive(Debug, Clone)]
pub(super) struct SmoSolution {
    /// `α_i − α*_i` per training row.
    pub dual_coef: Vec<f64>,
    /// Offset subtracted from the kernel expansion.
    pub rho: f64,
    /// Iterations performed.
    pub iterations: usize,
    /// Whether the KKT gap fell below the tolerance.
    pub converged: bool,
}

/// Solver state over the doubled variable set.
pub(super) struct SmoSolver<'a> {
    kernel: &'a [f64],
    l: usize,
    c: f64,
    tol: f64,
    alpha: Vec<f64>,
    grad: Vec<f64>,
    sign: Vec<f64>,
}

impl<'a> SmoSolver<'a> {
    /// `kernel` is the row-major `l × l` Gram matrix of the training rows.
    pub fn new(kernel: &'a [f64], targets: &[f64], c: f64, epsilon: f64, tol: f64) -> Self {
        let l = targets.len();
        let mut grad = Vec::with_capacity(2 * l);
        grad.extend(targets.iter().map(|t| epsilon - t));
        grad.extend(targets.iter().map(|t| epsilon + t));

        let mut sign = vec![1.0; l];
        sign.extend(std::iter::repeat(-1.0).take(l));

        Self {
            kernel,
            l,
            c,
            tol,
            alpha: vec![0.0; 2 * l],
            grad,
            sign,
        }
    }

    fn q(&self, i: usize, j: usize) -> f64 {
        self.sign[i] * self.sign[j] * self.kernel[(i % self.l) * self.l + j % self.l]
    }

    fn qd(&self, i: usize) -> f64 {
        let r = i % self.l;
        self.kernel[r * self.l + r]
    }

    fn at_upper(&self, i: usize) -> bool {
        self.alpha[i] >= self.c
    }

    fn at_lower(&self, i: usize) -> bool {
        self.alpha[i] <= 0.0
    }

    /// Returns the working pair or `None` once the KKT gap is below `tol`.
    fn select_working_set(&self) -> Option<(usize, usize)> {
        let n = 2 * self.l;

        let mut g_max = f64::NEG_INFINITY;
        let mut i_sel = None;
        for t in 0..n {
            let candidate = if self.sign[t] > 0.0 {
                (!self.at_upper(t)).then(|| -self.grad[t])
            } else {
                (!self.at_lower(t)).then(|| self.grad[t])
            };
            if let Some(v) = candidate {
                if v >= g_max {
                    g_max = v;
                    i_sel = Some(t);
                }
            }
        }
        let i = i_sel?;

        let mut g_max2 = f64::NEG_INFINITY;
        let mut j_sel = None;
        let mut obj_diff_min = f64::INFINITY;
        for t in 0..n {
            let (eligible, grad_diff, g_val, quad_sign) = if self.sign[t] > 0.0 {
                (!self.at_lower(t), g_max + self.grad[t], self.grad[t], -1.0)
            } else {
                (!self.at_upper(t), g_max - self.grad[t], -self.grad[t], 1.0)
            };
            if !eligible {
                continue;
            }
            if g_val >= g_max2 {
                g_max2 = g_val;
            }
            if grad_diff > 0.0 {
                let mut quad_coef =
                    self.qd(i) + self.qd(t) + quad_sign * 2.0 * self.sign[i] * self.q(i, t);
                if quad_coef <= 0.0 {
                    quad_coef = TAU;
                }
                let obj_diff = -(grad_diff * grad_diff) / quad_coef;
                if obj_diff <= obj_diff_min {
                    obj_diff_min = obj_diff;
                    j_sel = Some(t);
                }
            }
        }

        if g_max + g_max2 < self.tol {
            return None;
        }
        j_sel.map(|j| (i, j))
    }

    fn update_pair(&mut self, i: usize, j: usize) {
        let c = self.c;
        let old_i = self.alpha[i];
        let old_j = self.alpha[j];
        let q_ij = self.q(i, j);
        let (mut ai, mut aj) = (old_i, old_j);

        if self.sign[i] != self.sign[j] {
            let mut quad_coef = self.qd(i) + self.qd(j) + 2.0 * q_ij;
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (-self.grad[i] - self.grad[j]) / quad_coef;
            let diff = ai - aj;
            ai += delta;
            aj += delta;

            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
        } else {
            let mut quad_coef = self.qd(i) + self.qd(j) - 2.0 * q_ij;
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (self.grad[i] - self.grad[j]) / quad_coef;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;

            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;

        let d_i = ai - old_i;
        let d_j = aj - old_j;
        for k in 0..2 * self.l {
            self.grad[k] += self.q(i, k) * d_i + self.q(j, k) * d_j;
        }
    }

    fn rho(&self) -> f64 {
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut n_free = 0usize;
        let mut sum_free = 0.0;

        for i in 0..2 * self.l {
            let y_grad = self.sign[i] * self.grad[i];
            let positive = self.sign[i] > 0.0;
            if self.at_upper(i) {
                if positive {
                    lb = lb.max(y_grad);
                } else {
                    ub = ub.min(y_grad);
                }
            } else if self.at_lower(i) {
                if positive {
                    ub = ub.min(y_grad);
                } else {
                    lb = lb.max(y_grad);
                }
            } else {
                n_free += 1;
                sum_free += y_grad;
            }
        }

        if n_free > 0 {
            sum_free / n_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Runs at most `max_iter` pair updates.
    pub fn solve(mut self, max_iter: usize) -> SmoSolution {
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iter {
            match self.select_working_set() {
                Some((i, j)) => self.update_pair(i, j),
                None => {
                    converged = true;
                    break;
                }
            }
            iterations += 1;
        }

        let rho = self.rho();
        let dual_coef = (0..self.l)
            .map(|i| self.alpha[i] - self.alpha[i + self.l])
            .collect();

        SmoSolution {
            dual_coef,
            rho,
            iterations,
            converged,
        }
    }
}
