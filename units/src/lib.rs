pub mod todo;

pub mod mmps {

  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (millimeter, kilogram, picosecond, ampere, kelvin, mole, candela));

    /// The full circle constant (τ) Equal to 2π.
    pub const TWOPI: Angle = Angle {
        dimension: std::marker::PhantomData,
        units: std::marker::PhantomData,
        value: std::f32::consts::TAU,
    };
  }

}

pub use mmps::f32::{Angle, TWOPI, Length};

mod units {
  pub use uom::si::{length  ::{millimeter, centimeter},
                    angle   ::{radian, degree},
  };
}
// Making values from float literals seems to be very long-winded, so provide
// some pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length   centimeter);
wrap!(mm     Length   millimeter);
wrap!(radian Angle        radian);
wrap!(deg    Angle        degree);

// Reverse direction of the above.
pub fn mm_(x: Length) -> f32 { x.get::<units::millimeter>() }

pub fn radian_(x: Angle) -> f32 { x.get::<units::radian>() }
pub fn deg_   (x: Angle) -> f32 { x.get::<units::degree>() }
