/// Relative tolerance below which a ray is considered parallel to a plane
/// or to a segment's line.
pub const PARALLEL_EPSILON: f32 = 1e-7;

/// Squared length below which a normal or segment direction is degenerate.
pub const DEGENERATE_EPSILON: f32 = 1e-12;

/// Squared sine below which a triangle corner counts as too thin to carry a
/// fitted plane. Looser than [`DEGENERATE_EPSILON`] so sampling noise cannot
/// tilt the plane.
pub const THIN_TRIANGLE_EPSILON: f32 = 1e-6;

/// Minimum signed distance toward the eye for a sample to advance a plane.
pub const ADVANCE_EPSILON: f32 = 1e-5;

/// Minimum ray parameter accepted by the triangle test.
pub const TRIANGLE_EPSILON: f32 = 1e-6;

/// Smallest triangle-test determinant treated as non-parallel. The
/// determinant scales with the squared edge length, so millimetre-sized
/// triangles under a unit ray sit near `1e-6` and must still hit.
pub const DETERMINANT_EPSILON: f32 = 1e-12;

/// Near clip distance used to build screen rays (matches common GL viewers).
pub const CAMERA_NEAR: f32 = 0.01;

/// Maximum number of points a boundary primitive holds.
pub const MAX_BOUNDARY_POINTS: usize = 3;
