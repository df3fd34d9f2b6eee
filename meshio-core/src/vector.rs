//! Fixed-arity vector primitives shared by every attribute array
use nalgebra::{ClosedAdd, ClosedMul, ClosedSub, SVector, Scalar};
use num_traits::Zero;
use std::ops::{Add, Mul, Neg, Sub};

use crate::util::DEFAULT_TOLERANCE;

/// Equality used when comparing vector components.
///
/// Integer components compare exactly, floating components within
/// [`DEFAULT_TOLERANCE`].
pub trait ApproxEq: Copy {
    fn approx_eq(self, other: Self) -> bool;
}

macro_rules! impl_exact_eq {
    ($($t:ty),*) => {
        $(impl ApproxEq for $t {
            #[inline]
            fn approx_eq(self, other: Self) -> bool {
                self == other
            }
        })*
    };
}

macro_rules! impl_tolerance_eq {
    ($($t:ty),*) => {
        $(impl ApproxEq for $t {
            #[inline]
            fn approx_eq(self, other: Self) -> bool {
                (self - other).abs() <= DEFAULT_TOLERANCE as $t
            }
        })*
    };
}

impl_exact_eq!(i32, u32, i64, u64, usize);
impl_tolerance_eq!(f32, f64);

/// Scalar types a [`Vector`] can hold
pub trait Component:
    Scalar + Copy + Zero + ClosedAdd + ClosedSub + ClosedMul + ApproxEq
{
}

impl<T> Component for T where
    T: Scalar + Copy + Zero + ClosedAdd + ClosedSub + ClosedMul + ApproxEq
{
}

/// An N-component value type backed by a nalgebra column vector
#[derive(Debug, Clone, Copy)]
pub struct Vector<T, const N: usize>(SVector<T, N>);

pub type Vec2<T> = Vector<T, 2>;
pub type Vec3<T> = Vector<T, 3>;
pub type Vec4<T> = Vector<T, 4>;

impl<T: Component, const N: usize> Vector<T, N> {
    pub fn from_array(components: [T; N]) -> Self {
        Self(SVector::from(components))
    }

    pub fn zeros() -> Self {
        Self(SVector::zeros())
    }

    #[inline]
    pub fn x(&self) -> T {
        self.0[0]
    }

    #[inline]
    pub fn y(&self) -> T {
        self.0[1]
    }

    pub fn set_x(&mut self, value: T) {
        self.0[0] = value;
    }

    pub fn set_y(&mut self, value: T) {
        self.0[1] = value;
    }

    /// Number of components
    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    pub fn to_array(&self) -> [T; N] {
        std::array::from_fn(|i| self.0[i])
    }

    pub fn dot(&self, rhs: &Self) -> T {
        self.0.dot(&rhs.0)
    }

    /// Borrow the underlying nalgebra vector
    pub fn as_nalgebra(&self) -> &SVector<T, N> {
        &self.0
    }
}

impl<T: Component> Vec2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self::from_array([x, y])
    }

    /// Planar cross product; only the z component can be non-zero.
    pub fn cross(&self, rhs: &Self) -> Vec3<T> {
        Vec3::new(T::zero(), T::zero(), self.x() * rhs.y() - self.y() * rhs.x())
    }
}

impl<T: Component> Vec3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self::from_array([x, y, z])
    }

    #[inline]
    pub fn z(&self) -> T {
        self.0[2]
    }

    pub fn set_z(&mut self, value: T) {
        self.0[2] = value;
    }

    pub fn cross(&self, rhs: &Self) -> Self {
        Self(self.0.cross(&rhs.0))
    }

    /// Promote to a homogeneous vector with the given `w`
    pub fn extend(&self, w: T) -> Vec4<T> {
        Vec4::new(self.x(), self.y(), self.z(), w)
    }
}

impl<T: Component> Vec4<T> {
    pub fn new(x: T, y: T, z: T, w: T) -> Self {
        Self::from_array([x, y, z, w])
    }

    #[inline]
    pub fn z(&self) -> T {
        self.0[2]
    }

    #[inline]
    pub fn w(&self) -> T {
        self.0[3]
    }

    pub fn set_z(&mut self, value: T) {
        self.0[2] = value;
    }

    pub fn set_w(&mut self, value: T) {
        self.0[3] = value;
    }

    /// Drop the homogeneous coordinate
    pub fn xyz(&self) -> Vec3<T> {
        Vec3::new(self.x(), self.y(), self.z())
    }
}

impl<T: Component, const N: usize> Default for Vector<T, N> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Component, const N: usize> PartialEq for Vector<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().zip(other.iter()).all(|(a, b)| a.approx_eq(*b))
    }
}

impl<T: Component, const N: usize> From<[T; N]> for Vector<T, N> {
    fn from(components: [T; N]) -> Self {
        Self::from_array(components)
    }
}

impl<T: Component, const N: usize> From<Vector<T, N>> for [T; N] {
    fn from(v: Vector<T, N>) -> Self {
        v.to_array()
    }
}

impl<T: Component, const N: usize> From<SVector<T, N>> for Vector<T, N> {
    fn from(v: SVector<T, N>) -> Self {
        Self(v)
    }
}

impl<T: Component, const N: usize> Add for Vector<T, N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl<T: Component, const N: usize> Sub for Vector<T, N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl<T: Component, const N: usize> Mul<T> for Vector<T, N> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        Self(self.0 * rhs)
    }
}

impl<T: Component + Neg<Output = T>, const N: usize> Neg for Vector<T, N> {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.map(|c| -c))
    }
}

macro_rules! impl_scalar_lhs_mul {
    ($($t:ty),*) => {
        $(impl<const N: usize> Mul<Vector<$t, N>> for $t {
            type Output = Vector<$t, N>;

            fn mul(self, rhs: Vector<$t, N>) -> Vector<$t, N> {
                rhs * self
            }
        })*
    };
}

impl_scalar_lhs_mul!(f32, f64);
