/// Units which are simply type aliases for `f32` rather than having an
/// implementation as a `uom` `Quantity`.
///
/// These are used in the inner loops of weighting, filtering and
/// backprojection, where values are kept as raw floats for speed, but we still
/// want some clues in the source as to what they represent.

/// Millimetres
pub type Lengthf32    = f32;
pub type Intensityf32 = f32;
