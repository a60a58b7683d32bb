//! Matrix-valued functions on a Matsubara mesh.
//!
//! [`GreensFunction`] stores one square complex matrix per mesh point. All
//! arithmetic returns a new value; combining functions defined on different meshes
//! or with different target shapes is reported as a
//! [`DimensionMismatch`](crate::error::CheckError::DimensionMismatch).

use std::ops::Div;

use nalgebra::{Complex, DMatrix, Normed};

use crate::error::{CheckError, Result};
use crate::mesh::MatsubaraMesh;

/// Complex square matrix attached to a single mesh point.
pub type Block = DMatrix<Complex<f64>>;

/// Green's function container on a Matsubara mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct GreensFunction {
    mesh: MatsubaraMesh,
    target_dim: usize,
    data: Vec<Block>,
}

impl GreensFunction {
    /// Function that vanishes everywhere on `mesh`.
    pub fn zeros(mesh: MatsubaraMesh, target_dim: usize) -> Self {
        let data = vec![Block::zeros(target_dim, target_dim); mesh.len()];
        Self {
            mesh,
            target_dim,
            data,
        }
    }

    /// Evaluates `f(iω_n)` at every mesh point.
    pub fn from_fn<F>(mesh: MatsubaraMesh, target_dim: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(Complex<f64>) -> Block,
    {
        Self::try_from_fn(mesh, target_dim, |_, z| Ok(f(z)))
    }

    /// Fallible variant of [`from_fn`](Self::from_fn); the closure also receives the
    /// linear mesh index.
    ///
    /// Blocks with a NaN or infinite element are rejected with
    /// [`NumericalError`](CheckError::NumericalError).
    pub fn try_from_fn<F>(mesh: MatsubaraMesh, target_dim: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, Complex<f64>) -> Result<Block>,
    {
        let mut data = Vec::with_capacity(mesh.len());
        for (index, z) in mesh.points() {
            let block = f(index, z)?;
            if block.nrows() != target_dim || block.ncols() != target_dim {
                return Err(CheckError::dimension_mismatch(
                    "block shape",
                    target_dim,
                    block.nrows().max(block.ncols()),
                ));
            }
            if !is_finite_block(&block) {
                return Err(CheckError::NumericalError {
                    context: "Green's function tabulation",
                });
            }
            data.push(block);
        }
        Ok(Self {
            mesh,
            target_dim,
            data,
        })
    }

    /// Mesh the function is tabulated on.
    pub fn mesh(&self) -> &MatsubaraMesh {
        &self.mesh
    }

    /// Row (and column) count of every block.
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    /// Block stored at linear mesh index `i`.
    pub fn value(&self, i: usize) -> &Block {
        &self.data[i]
    }

    /// All blocks in mesh order.
    pub fn values(&self) -> &[Block] {
        &self.data
    }

    /// Iterates over `(iω_n, block)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Complex<f64>, &Block)> + '_ {
        self.mesh.points().map(move |(i, z)| (z, &self.data[i]))
    }

    /// Combines two functions pointwise after checking that they share a mesh and shape.
    pub fn zip_map<F>(&self, other: &GreensFunction, mut f: F) -> Result<Self>
    where
        F: FnMut(Complex<f64>, &Block, &Block) -> Block,
    {
        self.ensure_compatible(other)?;
        let data = self
            .iter()
            .zip(other.data.iter())
            .map(|((z, lhs), rhs)| f(z, lhs, rhs))
            .collect();
        Ok(Self {
            mesh: self.mesh.clone(),
            target_dim: self.target_dim,
            data,
        })
    }

    /// Pointwise sum; fails if the mesh or shape differs.
    pub fn checked_add(&self, other: &GreensFunction) -> Result<Self> {
        self.zip_map(other, |_, lhs, rhs| lhs + rhs)
    }

    /// Pointwise difference; fails if the mesh or shape differs.
    pub fn checked_sub(&self, other: &GreensFunction) -> Result<Self> {
        self.zip_map(other, |_, lhs, rhs| lhs - rhs)
    }

    /// Pointwise matrix inverse.
    pub fn inverse(&self) -> Result<Self> {
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(index, block)| invert_block(block, "Green's function inversion", index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            mesh: self.mesh.clone(),
            target_dim: self.target_dim,
            data,
        })
    }

    /// Largest elementwise modulus of `self - other`.
    pub fn max_abs_difference(&self, other: &GreensFunction) -> Result<f64> {
        self.ensure_compatible(other)?;
        let gap = self
            .data
            .iter()
            .zip(other.data.iter())
            .flat_map(|(lhs, rhs)| lhs.iter().zip(rhs.iter()).map(|(a, b)| (a - b).norm()))
            .fold(0.0, f64::max);
        Ok(gap)
    }

    fn ensure_compatible(&self, other: &GreensFunction) -> Result<()> {
        if self.target_dim != other.target_dim {
            return Err(CheckError::dimension_mismatch(
                "target shape",
                self.target_dim,
                other.target_dim,
            ));
        }
        if self.mesh != other.mesh {
            return Err(CheckError::dimension_mismatch(
                "mesh",
                self.mesh.len(),
                other.mesh.len(),
            ));
        }
        Ok(())
    }
}

impl Div<f64> for GreensFunction {
    type Output = GreensFunction;

    fn div(mut self, rhs: f64) -> Self::Output {
        for block in &mut self.data {
            *block /= Complex::new(rhs, 0.0);
        }
        self
    }
}

/// Inverts a single block, reporting the mesh index on failure.
pub(crate) fn invert_block(block: &Block, context: &'static str, index: usize) -> Result<Block> {
    let inverse = block
        .clone()
        .try_inverse()
        .ok_or_else(|| CheckError::singular(context, index))?;
    if !is_finite_block(&inverse) {
        return Err(CheckError::singular(context, index));
    }
    Ok(inverse)
}

pub(crate) fn is_finite_block(block: &Block) -> bool {
    block.iter().all(|v| v.re.is_finite() && v.im.is_finite())
}

/// `value` times the identity of size `dim`.
pub(crate) fn scalar_block(dim: usize, value: Complex<f64>) -> Block {
    Block::from_diagonal_element(dim, dim, value)
}
