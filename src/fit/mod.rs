/// Curve fitting: expression language, least-squares solver glue and the
/// result store shared with the console.
pub mod curve_fit;
pub mod expr;
pub mod results;
